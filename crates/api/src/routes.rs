//! Route-Definitionen der HTTP-Oberflaeche
//!
//! | Route | Methode | Auth |
//! |---|---|---|
//! | `/auth/register`, `/auth/login` | POST | keine |
//! | `/api/refresh` | POST | Bearer (abgelaufen erlaubt) |
//! | `/api/logout` | POST | Bearer |
//! | `/api/protected/channels[...]` | POST/GET/DELETE | Bearer |
//! | `/api/protected/events[...]` | POST/GET/DELETE | Bearer |
//!
//! `/api/refresh` laeuft absichtlich nicht durch die Auth-Middleware:
//! der Handler prueft die Signatur selbst und toleriert den Ablauf.

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use sprechfunk_auth::{AnmeldeRateLimiter, AuthService, JtiSperrliste, TokenDienst};
use sprechfunk_db::MySqlDb;
use sprechfunk_kv::RedisPresence;

use crate::handlers::{auth, events, kanaele};
use crate::middleware::{auth_middleware, sicherheits_header};

/// Geteilter Zustand aller API-Handler
#[derive(Clone)]
pub struct ApiZustand {
    pub db: Arc<MySqlDb>,
    pub auth_service: Arc<AuthService<MySqlDb>>,
    pub token_dienst: Arc<TokenDienst>,
    pub sperrliste: JtiSperrliste,
    pub rate_limiter: Arc<AnmeldeRateLimiter>,
    pub presence: RedisPresence,
}

/// Baut den vollstaendigen API-Router
pub fn api_router(zustand: ApiZustand) -> Router {
    let geschuetzt = Router::new()
        .route("/api/logout", post(auth::abmelden))
        .route("/api/protected/channels/create", post(kanaele::kanal_anlegen))
        .route("/api/protected/channels", get(kanaele::kanaele_auflisten))
        .route(
            "/api/protected/channels/:uuid/delete",
            delete(kanaele::kanal_loeschen),
        )
        .route("/api/protected/events/create", post(events::event_anlegen))
        .route("/api/protected/events", get(events::events_auflisten))
        .route("/api/protected/events/join", post(events::event_beitreten))
        .route(
            "/api/protected/events/:uuid/delete",
            delete(events::event_loeschen),
        )
        .route_layer(middleware::from_fn_with_state(
            zustand.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/auth/register", post(auth::registrieren))
        .route("/auth/login", post(auth::anmelden))
        .route("/api/refresh", post(auth::token_erneuern))
        .merge(geschuetzt)
        .layer(middleware::from_fn(sicherheits_header))
        .with_state(zustand)
}
