//! Fehlertypen fuer das Key-Value-Crate

use thiserror::Error;

/// Fehlertyp fuer alle Key-Value-Operationen
#[derive(Debug, Error)]
pub enum KvError {
    /// Fehler aus dem Redis-Treiber (Verbindung, Protokoll, Typkonvertierung)
    #[error("Redis-Fehler: {0}")]
    Redis(#[from] redis::RedisError),

    /// Zeitlimit ueberschritten (Health-Check)
    #[error("Zeitlimit ueberschritten: {0}")]
    Zeitlimit(String),

    /// Interner Fehler
    #[error("Interner KV-Fehler: {0}")]
    Intern(String),
}

impl KvError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }
}

/// Result-Typ fuer Key-Value-Operationen
pub type KvResult<T> = Result<T, KvError>;
