//! Health-Check-Endpunkt
//!
//! Endpoint: `GET /health`
//! Liveness fuer Container-Probes: antwortet 200 solange der Prozess
//! lebt; der Status degradiert wenn ein Backend nicht erreichbar ist.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

/// Status des Health-Checks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub redis_connected: bool,
    pub db_connected: bool,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    start_time: Arc<Instant>,
    redis_connected: Arc<AtomicBool>,
    db_connected: Arc<AtomicBool>,
}

impl HealthState {
    pub fn neu() -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
            redis_connected: Arc::new(AtomicBool::new(true)),
            db_connected: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn redis_status_setzen(&self, verbunden: bool) {
        self.redis_connected.store(verbunden, Ordering::Relaxed);
    }

    pub fn db_status_setzen(&self, verbunden: bool) {
        self.db_connected.store(verbunden, Ordering::Relaxed);
    }

    pub fn redis_verbunden(&self) -> bool {
        self.redis_connected.load(Ordering::Relaxed)
    }

    pub fn db_verbunden(&self) -> bool {
        self.db_connected.load(Ordering::Relaxed)
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::neu()
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

/// `GET /health` – Liveness (200 auch bei degraded, Probes sollen nicht failen)
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    let redis_connected = state.redis_verbunden();
    let db_connected = state.db_verbunden();

    let status = if redis_connected && db_connected {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    let antwort = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        redis_connected,
        db_connected,
    };

    (StatusCode::OK, Json(antwort))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_state_standard_verbunden() {
        let state = HealthState::neu();
        assert!(state.redis_verbunden());
        assert!(state.db_verbunden());
    }

    #[test]
    fn health_state_status_umschalten() {
        let state = HealthState::neu();
        state.redis_status_setzen(false);
        assert!(!state.redis_verbunden());
        state.redis_status_setzen(true);
        assert!(state.redis_verbunden());
    }

    #[test]
    fn health_response_serialisierung() {
        let antwort = HealthResponse {
            status: HealthStatus::Healthy,
            version: "0.3.0".to_string(),
            uptime_seconds: 3600,
            redis_connected: true,
            db_connected: true,
        };

        let json = serde_json::to_string(&antwort).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"uptime_seconds\":3600"));
    }

    #[test]
    fn health_response_degraded_format() {
        let antwort = HealthResponse {
            status: HealthStatus::Degraded,
            version: "0.3.0".to_string(),
            uptime_seconds: 5,
            redis_connected: false,
            db_connected: true,
        };

        let json = serde_json::to_string(&antwort).unwrap();
        assert!(json.contains("\"status\":\"degraded\""));
        assert!(json.contains("\"redis_connected\":false"));
    }
}
