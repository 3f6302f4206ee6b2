//! MySQL Connection Pool

use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::info;

use crate::error::DbError;
use crate::repository::DatenbankKonfig;

/// Wrapper um den MySQL Connection Pool
#[derive(Debug, Clone)]
pub struct MySqlDb {
    pub(crate) pool: MySqlPool,
}

impl MySqlDb {
    /// Erstellt einen neuen Pool und fuehrt Migrationen aus
    pub async fn oeffnen(konfig: &DatenbankKonfig) -> Result<Self, DbError> {
        let opts = MySqlConnectOptions::new()
            .host(&konfig.host)
            .port(konfig.port)
            .username(&konfig.benutzer)
            .password(&konfig.passwort)
            .database(&konfig.datenbank);

        let pool = MySqlPoolOptions::new()
            .max_connections(konfig.max_verbindungen)
            .connect_with(opts)
            .await?;

        info!(
            host = %konfig.host,
            port = konfig.port,
            datenbank = %konfig.datenbank,
            "MySQL-Pool geoeffnet"
        );

        let db = Self { pool };
        db.migrationen_ausfuehren().await?;

        Ok(db)
    }

    /// Fuehrt alle ausstehenden Migrationen aus
    pub async fn migrationen_ausfuehren(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Datenbank-Migrationen abgeschlossen");
        Ok(())
    }

    /// Prueft die Verbindung mit einer trivialen Abfrage
    pub async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Gibt den internen Pool zurueck (fuer Tests)
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}
