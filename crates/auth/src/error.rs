//! Fehlertypen fuer das Auth-Crate

use thiserror::Error;

/// Fehlertyp fuer alle Authentifizierungsvorgaenge
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Ungueltige Anmeldedaten")]
    UngueltigeAnmeldedaten,

    #[error("Benutzername oder E-Mail bereits vergeben: {0}")]
    BenutzerVergeben(String),

    #[error("Pflichtfeld fehlt: {0}")]
    FeldFehlt(&'static str),

    #[error("Token fehlerhaft: {0}")]
    TokenFehlerhaft(String),

    #[error("Token-Signatur ungueltig")]
    SignaturUngueltig,

    #[error("Signaturalgorithmus nicht zugelassen: {0}")]
    AlgorithmusUnzulaessig(String),

    #[error("Token abgelaufen")]
    TokenAbgelaufen,

    #[error("Token wurde widerrufen")]
    TokenWiderrufen,

    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),

    #[error("Datenbankfehler: {0}")]
    Db(#[from] sprechfunk_db::DbError),
}

/// Result-Typ fuer Authentifizierungsvorgaenge
pub type AuthResult<T> = Result<T, AuthError>;
