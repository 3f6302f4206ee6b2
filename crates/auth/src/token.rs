//! HMAC-signierte Zugriffstoken (JWT, HS256)
//!
//! Kompaktes JWT-Format: `base64url(header).base64url(claims).base64url(sig)`,
//! signiert mit HMAC-SHA256. Beim Verifizieren wird der Algorithmus aus dem
//! Header gegen HS256 gepinnt, damit Algorithm-Confusion-Angriffe
//! ("alg":"none", RS256-Verwechslung) ins Leere laufen.
//!
//! Claims: `{jti, user_id, username, iat, exp}`, Gueltigkeit 48 Stunden.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// Gueltigkeitsdauer eines Tokens in Sekunden (48 Stunden)
pub const TOKEN_GUELTIGKEIT_SEK: i64 = 48 * 60 * 60;

/// Einziger zugelassener Signaturalgorithmus
const ALGORITHMUS: &str = "HS256";

/// Token-Header (fest: HS256 / JWT)
#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// Claims eines Zugriffstokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Token-ID fuer die Sperrliste
    pub jti: String,
    pub user_id: i64,
    pub username: String,
    /// Ausstellungszeitpunkt (Unix-Sekunden)
    pub iat: i64,
    /// Ablaufzeitpunkt (Unix-Sekunden)
    pub exp: i64,
}

/// Dienst zum Praegen und Verifizieren von Zugriffstoken
pub struct TokenDienst {
    geheimnis: Vec<u8>,
}

impl TokenDienst {
    pub fn neu(geheimnis: impl Into<Vec<u8>>) -> Self {
        Self {
            geheimnis: geheimnis.into(),
        }
    }

    /// Praegt ein neues Token fuer den Benutzer (48h gueltig)
    pub fn praegen(&self, user_id: i64, username: &str) -> AuthResult<(String, TokenClaims)> {
        let jetzt = Utc::now().timestamp();
        let claims = TokenClaims {
            jti: Uuid::new_v4().to_string(),
            user_id,
            username: username.to_string(),
            iat: jetzt,
            exp: jetzt + TOKEN_GUELTIGKEIT_SEK,
        };

        let header = TokenHeader {
            alg: ALGORITHMUS.to_string(),
            typ: "JWT".to_string(),
        };

        let header_b64 = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&header)
                .map_err(|e| AuthError::TokenFehlerhaft(e.to_string()))?,
        );
        let claims_b64 = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims)
                .map_err(|e| AuthError::TokenFehlerhaft(e.to_string()))?,
        );

        let signatur = self.signieren(&header_b64, &claims_b64);
        let token = format!("{header_b64}.{claims_b64}.{signatur}");

        Ok((token, claims))
    }

    /// Verifiziert Signatur, Algorithmus und Ablauf
    pub fn validieren(&self, token: &str) -> AuthResult<TokenClaims> {
        let claims = self.signatur_pruefen(token)?;

        if claims.exp < Utc::now().timestamp() {
            return Err(AuthError::TokenAbgelaufen);
        }
        Ok(claims)
    }

    /// Verifiziert Signatur und Algorithmus, akzeptiert aber abgelaufene
    /// Token – fuer den Refresh-Pfad
    pub fn validieren_ohne_ablauf(&self, token: &str) -> AuthResult<TokenClaims> {
        self.signatur_pruefen(token)
    }

    // -----------------------------------------------------------------------
    // Interne Hilfsfunktionen
    // -----------------------------------------------------------------------

    fn signieren(&self, header_b64: &str, claims_b64: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.geheimnis)
            .expect("HMAC akzeptiert Schluessel jeder Laenge");
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }

    fn signatur_pruefen(&self, token: &str) -> AuthResult<TokenClaims> {
        let mut teile = token.split('.');
        let (header_b64, claims_b64, signatur_b64) =
            match (teile.next(), teile.next(), teile.next(), teile.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(AuthError::TokenFehlerhaft("erwartet drei Segmente".into())),
            };

        // Algorithmus pinnen bevor irgendetwas anderes passiert
        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|e| AuthError::TokenFehlerhaft(e.to_string()))?;
        let header: TokenHeader = serde_json::from_slice(&header_bytes)
            .map_err(|e| AuthError::TokenFehlerhaft(e.to_string()))?;
        if header.alg != ALGORITHMUS {
            tracing::warn!(alg = %header.alg, "Token mit unzulaessigem Algorithmus abgewiesen");
            return Err(AuthError::AlgorithmusUnzulaessig(header.alg));
        }

        let signatur = URL_SAFE_NO_PAD
            .decode(signatur_b64)
            .map_err(|e| AuthError::TokenFehlerhaft(e.to_string()))?;

        let mut mac = HmacSha256::new_from_slice(&self.geheimnis)
            .expect("HMAC akzeptiert Schluessel jeder Laenge");
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signatur)
            .map_err(|_| AuthError::SignaturUngueltig)?;

        let claims_bytes = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|e| AuthError::TokenFehlerhaft(e.to_string()))?;
        let claims: TokenClaims = serde_json::from_slice(&claims_bytes)
            .map_err(|e| AuthError::TokenFehlerhaft(e.to_string()))?;

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dienst() -> TokenDienst {
        TokenDienst::neu(b"testgeheimnis".to_vec())
    }

    #[test]
    fn praegen_und_validieren() {
        let d = dienst();
        let (token, claims) = d.praegen(42, "funker").unwrap();

        let geprueft = d.validieren(&token).expect("Token muss gueltig sein");
        assert_eq!(geprueft.user_id, 42);
        assert_eq!(geprueft.username, "funker");
        assert_eq!(geprueft.jti, claims.jti);
        assert!(geprueft.exp > geprueft.iat);
    }

    #[test]
    fn falsches_geheimnis_wird_abgewiesen() {
        let (token, _) = dienst().praegen(1, "a").unwrap();
        let anderer = TokenDienst::neu(b"anderes_geheimnis".to_vec());
        assert!(matches!(
            anderer.validieren(&token),
            Err(AuthError::SignaturUngueltig)
        ));
    }

    #[test]
    fn manipulierte_claims_werden_abgewiesen() {
        let d = dienst();
        let (token, _) = d.praegen(1, "a").unwrap();

        // Claims-Segment austauschen, Signatur behalten
        let teile: Vec<&str> = token.split('.').collect();
        let boese_claims = URL_SAFE_NO_PAD.encode(
            br#"{"jti":"x","user_id":999,"username":"admin","iat":0,"exp":9999999999}"#,
        );
        let manipuliert = format!("{}.{}.{}", teile[0], boese_claims, teile[2]);

        assert!(matches!(
            d.validieren(&manipuliert),
            Err(AuthError::SignaturUngueltig)
        ));
    }

    #[test]
    fn alg_none_wird_abgewiesen() {
        let d = dienst();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(
            br#"{"jti":"x","user_id":1,"username":"a","iat":0,"exp":9999999999}"#,
        );
        let token = format!("{header}.{claims}.");

        assert!(matches!(
            d.validieren(&token),
            Err(AuthError::AlgorithmusUnzulaessig(_))
        ));
    }

    #[test]
    fn abgelaufenes_token() {
        let d = dienst();
        let (token, _) = d.praegen(1, "a").unwrap();

        // Claims mit exp in der Vergangenheit nachbauen und korrekt signieren
        let jetzt = Utc::now().timestamp();
        let alte_claims = TokenClaims {
            jti: "alt".into(),
            user_id: 1,
            username: "a".into(),
            iat: jetzt - 100,
            exp: jetzt - 1,
        };
        let header_b64 = token.split('.').next().unwrap().to_string();
        let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&alte_claims).unwrap());
        let signatur = d.signieren(&header_b64, &claims_b64);
        let abgelaufen = format!("{header_b64}.{claims_b64}.{signatur}");

        // Normale Validierung lehnt ab ...
        assert!(matches!(
            d.validieren(&abgelaufen),
            Err(AuthError::TokenAbgelaufen)
        ));
        // ... der Refresh-Pfad akzeptiert
        let claims = d.validieren_ohne_ablauf(&abgelaufen).unwrap();
        assert_eq!(claims.jti, "alt");
    }

    #[test]
    fn muell_ist_fehlerhaft() {
        let d = dienst();
        assert!(d.validieren("kein.token").is_err());
        assert!(d.validieren("").is_err());
        assert!(d.validieren("a.b.c.d").is_err());
    }
}
