//! Sprechfunk Server – Einstiegspunkt
//!
//! Laedt die Konfiguration aus der Umgebung, initialisiert das Logging
//! und startet den Server.

use anyhow::Result;
use sprechfunk_server::{config::ServerConfig, Server};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::aus_env();

    sprechfunk_observability::logging_initialisieren(
        &config.logging.level,
        &config.logging.format,
    );

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Sprechfunk Server wird initialisiert"
    );

    let server = Server::neu(config);
    server.starten().await?;

    Ok(())
}
