//! Redis-Verbindungsverwaltung
//!
//! Ein `KvStore` haelt einen `ConnectionManager` der Reconnects intern
//! behandelt. Clone ist billig und teilt die Verbindung.

use std::time::Duration;

use redis::aio::ConnectionManager;

use crate::error::{KvError, KvResult};

/// Zeitlimit fuer den Health-Check-Ping
const HEALTH_CHECK_FRIST: Duration = Duration::from_secs(5);

/// Duenner Wrapper um den Redis-ConnectionManager
#[derive(Clone)]
pub struct KvStore {
    manager: ConnectionManager,
}

impl KvStore {
    /// Verbindet zum Redis-Server unter der gegebenen URL
    ///
    /// Der ConnectionManager stellt die Verbindung bei Abbruechen
    /// selbststaendig wieder her.
    pub async fn verbinden(url: &str) -> KvResult<Self> {
        let client = redis::Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        tracing::info!(url = %url, "Redis-Verbindung hergestellt");
        Ok(Self { manager })
    }

    /// Gibt eine Verbindung fuer Kommandos zurueck (Clone des Managers)
    pub fn verbindung(&self) -> ConnectionManager {
        self.manager.clone()
    }

    /// Prueft die Verbindung mit einem PING (5-Sekunden-Frist)
    pub async fn health_check(&self) -> KvResult<()> {
        let mut conn = self.verbindung();
        let ping = async move {
            redis::cmd("PING")
                .query_async::<_, String>(&mut conn)
                .await
        };

        match tokio::time::timeout(HEALTH_CHECK_FRIST, ping).await {
            Ok(Ok(antwort)) if antwort == "PONG" => Ok(()),
            Ok(Ok(antwort)) => Err(KvError::intern(format!(
                "Unerwartete PING-Antwort: {antwort}"
            ))),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(KvError::Zeitlimit("PING nach 5s ohne Antwort".into())),
        }
    }
}
