//! sprechfunk-server – Bibliotheks-Root
//!
//! Verdrahtet alle Subsysteme: Key-Value-Store, Datenbank, Nabe,
//! HTTP-Oberflaeche, /msg-Endpunkt und die Wartungs-Tasks.

pub mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sprechfunk_api::{api_router, ApiZustand};
use sprechfunk_auth::{AnmeldeRateLimiter, AuthService, JtiSperrliste, TokenDienst};
use sprechfunk_db::MySqlDb;
use sprechfunk_hub::{msg_router, AudioSenke, ConnectionHub, MsgZustand};
use sprechfunk_kv::{Aufraeumer, KvStore, RedisLease, RedisPresence};
use sprechfunk_observability::{health_router, HealthState};

use config::ServerConfig;

/// Abstand der stuendlichen Wartungslaeufe (Sperrliste, Rate-Limiter)
const WARTUNGS_INTERVALL: Duration = Duration::from_secs(60 * 60);
/// Abstand der Backend-Erreichbarkeitspruefung
const UEBERWACHUNGS_INTERVALL: Duration = Duration::from_secs(60);

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Startet alle Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Redis verbinden und Selbsttest (PING)
    /// 2. MySQL verbinden, Migrationen ausfuehren
    /// 3. Audio-Verzeichnis sicherstellen
    /// 4. Nabe, Sweeper und Wartungs-Tasks starten
    /// 5. HTTP-Server (API + /msg + /health) bedienen
    pub async fn starten(self) -> Result<()> {
        tracing::info!(
            port = self.config.server_port,
            redis = %self.config.redis_url(),
            mysql_host = %self.config.mysql.host,
            "Server startet"
        );

        // --- 1. Key-Value-Store ---
        let kv = KvStore::verbinden(&self.config.redis_url())
            .await
            .map_err(|e| anyhow::anyhow!("Redis-Verbindung fehlgeschlagen: {e}"))?;
        kv.health_check()
            .await
            .map_err(|e| anyhow::anyhow!("Redis-Selbsttest fehlgeschlagen: {e}"))?;
        tracing::info!("Redis erreichbar");

        let lease = RedisLease::neu(kv.clone());
        let presence = RedisPresence::neu(kv.clone());

        // --- 2. Relationale Datenbank ---
        let db = Arc::new(
            MySqlDb::oeffnen(&self.config.datenbank_konfig())
                .await
                .map_err(|e| anyhow::anyhow!("Datenbankverbindung fehlgeschlagen: {e}"))?,
        );
        tracing::info!("MySQL erreichbar, Migrationen ausgefuehrt");

        // --- 3. Audio-Senke ---
        let senke = Arc::new(
            AudioSenke::anlegen(&self.config.audio_verzeichnis)
                .await
                .map_err(|e| anyhow::anyhow!("Audio-Verzeichnis nicht anlegbar: {e}"))?,
        );

        // --- 4. Dienste und Hintergrund-Tasks ---
        let token_dienst = Arc::new(TokenDienst::neu(self.config.jwt_secret.as_bytes().to_vec()));
        let sperrliste = JtiSperrliste::neu();
        let rate_limiter = Arc::new(AnmeldeRateLimiter::neu());
        let auth_service = Arc::new(AuthService::neu(
            Arc::clone(&db),
            Arc::clone(&token_dienst),
            sperrliste.clone(),
        ));

        let (nabe, hub) = ConnectionHub::neu(lease.clone(), presence.clone());
        tokio::spawn(nabe.ausfuehren());

        tokio::spawn(Aufraeumer::neu(kv.clone()).ausfuehren());

        let health_state = HealthState::neu();
        wartungs_task_starten(sperrliste.clone(), Arc::clone(&rate_limiter));
        ueberwachungs_task_starten(kv.clone(), Arc::clone(&db), health_state.clone());

        // --- 5. HTTP-Oberflaeche ---
        let api_zustand = ApiZustand {
            db,
            auth_service,
            token_dienst: Arc::clone(&token_dienst),
            sperrliste: sperrliste.clone(),
            rate_limiter,
            presence: presence.clone(),
        };

        let msg_zustand = MsgZustand {
            hub,
            lease,
            presence,
            senke,
            token_dienst,
            sperrliste,
        };

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let app = api_router(api_zustand)
            .merge(msg_router(msg_zustand))
            .merge(health_router(health_state))
            .layer(TraceLayer::new_for_http())
            .layer(cors);

        let listener = tokio::net::TcpListener::bind(self.config.bind_adresse()).await?;
        tracing::info!(adresse = %self.config.bind_adresse(), "Server lauscht");

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Server beendet");
        Ok(())
    }
}

/// Stuendlicher Wartungslauf: Sperrliste und Rate-Limiter aufraeumen
fn wartungs_task_starten(sperrliste: JtiSperrliste, rate_limiter: Arc<AnmeldeRateLimiter>) {
    tokio::spawn(async move {
        let mut takt = tokio::time::interval(WARTUNGS_INTERVALL);
        takt.tick().await; // erster Tick feuert sofort, ueberspringen
        loop {
            takt.tick().await;
            sperrliste.aufraeumen();
            rate_limiter.aufraeumen();
            tracing::debug!("Wartungslauf abgeschlossen");
        }
    });
}

/// Prueft periodisch die Erreichbarkeit der Backends fuer /health
fn ueberwachungs_task_starten(kv: KvStore, db: Arc<MySqlDb>, health: HealthState) {
    tokio::spawn(async move {
        let mut takt = tokio::time::interval(UEBERWACHUNGS_INTERVALL);
        loop {
            takt.tick().await;
            health.redis_status_setzen(kv.health_check().await.is_ok());
            health.db_status_setzen(db.ping().await.is_ok());
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(fehler = %e, "Shutdown-Signal nicht abonnierbar");
    }
    tracing::info!("Shutdown-Signal empfangen");
}
