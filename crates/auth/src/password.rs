//! Passwort-Hashing mit bcrypt
//!
//! bcrypt mit Standard-Kostenfaktor; der Salt steckt im Hash-String.

use crate::error::AuthError;

/// Hasht ein Passwort mit bcrypt und dem Standard-Kostenfaktor
pub fn passwort_hashen(passwort: &str) -> Result<String, AuthError> {
    bcrypt::hash(passwort, bcrypt::DEFAULT_COST)
        .map_err(|e| AuthError::PasswortHashing(e.to_string()))
}

/// Verifiziert ein Passwort gegen einen gespeicherten bcrypt-Hash
///
/// Gibt `true` zurueck wenn das Passwort korrekt ist.
pub fn passwort_pruefen(passwort: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(passwort, hash).map_err(|e| AuthError::PasswortHashing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashen_und_pruefen() {
        let hash = passwort_hashen("geheim123!").expect("Hashing fehlgeschlagen");
        assert!(hash.starts_with("$2"), "bcrypt-Hash muss mit $2 beginnen");
        assert!(passwort_pruefen("geheim123!", &hash).unwrap());
    }

    #[test]
    fn falsches_passwort_wird_abgelehnt() {
        let hash = passwort_hashen("richtig").unwrap();
        assert!(!passwort_pruefen("falsch", &hash).unwrap());
    }

    #[test]
    fn gleiche_passwoerter_verschiedene_hashes() {
        let hash1 = passwort_hashen("gleich").unwrap();
        let hash2 = passwort_hashen("gleich").unwrap();
        assert_ne!(hash1, hash2, "Salt muss die Hashes unterscheiden");
    }

    #[test]
    fn kaputter_hash_gibt_fehler() {
        assert!(passwort_pruefen("passwort", "kein_bcrypt_hash").is_err());
    }
}
