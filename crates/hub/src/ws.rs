//! /msg-Endpunkt – Upgrade, Token-Pruefung und Verbindungs-Lebenszyklus
//!
//! `GET /msg?token=<jwt>&channel=<id>`: der Token kommt als Query-
//! Parameter (das Upgrade traegt keine Header), der Kanal faellt auf
//! `lobby` zurueck. Nach erfolgreichem Upgrade wird die Verbindung bei
//! der Nabe registriert, die Schreib-Pumpe gestartet und die Lese-Pumpe
//! bis zum Verbindungsende betrieben; der Nachlauf meldet ab.

use std::sync::Arc;

use axum::extract::ws::WebSocket;
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures_util::StreamExt;
use serde::Deserialize;
use sprechfunk_auth::{JtiSperrliste, TokenClaims, TokenDienst};
use sprechfunk_core::{ChannelId, UserId};
use sprechfunk_kv::{RedisLease, RedisPresence};

use crate::audio::AudioSenke;
use crate::dispatch::Leitung;
use crate::nabe::HubHandle;
use crate::pumpen::{lese_pumpe, schreib_pumpe, MAX_FRAME_GROESSE};
use crate::verbindung::Verbindung;

/// Kanal fuer Verbindungen ohne channel-Parameter
const STANDARD_KANAL: &str = "lobby";

/// Geteilter Zustand des /msg-Endpunkts
#[derive(Clone)]
pub struct MsgZustand {
    pub hub: HubHandle,
    pub lease: RedisLease,
    pub presence: RedisPresence,
    pub senke: Arc<AudioSenke>,
    pub token_dienst: Arc<TokenDienst>,
    pub sperrliste: JtiSperrliste,
}

#[derive(Debug, Deserialize)]
pub struct MsgParameter {
    token: Option<String>,
    channel: Option<String>,
}

/// Router fuer den /msg-Endpunkt
pub fn msg_router(zustand: MsgZustand) -> Router {
    Router::new()
        .route("/msg", get(msg_handler))
        .with_state(zustand)
}

async fn msg_handler(
    ws: WebSocketUpgrade,
    Query(parameter): Query<MsgParameter>,
    State(zustand): State<MsgZustand>,
) -> Response {
    let token = match parameter.token.as_deref() {
        Some(t) if !t.is_empty() => t,
        _ => {
            return (StatusCode::UNAUTHORIZED, "Invalid authentication method.")
                .into_response();
        }
    };

    let claims = match zustand.token_dienst.validieren(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(fehler = %e, "Upgrade mit ungueltigem Token abgewiesen");
            return (StatusCode::UNAUTHORIZED, "Invalid token.").into_response();
        }
    };

    if zustand.sperrliste.ist_gesperrt(&claims.jti) {
        return (StatusCode::UNAUTHORIZED, "Token has been revoked.").into_response();
    }

    let kanal = ChannelId::neu(
        parameter
            .channel
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| STANDARD_KANAL.to_string()),
    );

    ws.max_message_size(MAX_FRAME_GROESSE)
        .on_upgrade(move |socket| verbindung_bedienen(socket, zustand, claims, kanal))
}

/// Lebenszyklus einer aufgewerteten Verbindung
async fn verbindung_bedienen(
    socket: WebSocket,
    zustand: MsgZustand,
    claims: TokenClaims,
    kanal: ChannelId,
) {
    let (sender, empfaenger) = socket.split();
    let (verbindung, sende_rx) = Verbindung::neu(UserId(claims.user_id), kanal);

    tracing::info!(
        verbindung = %verbindung.id,
        user_id = claims.user_id,
        username = %claims.username,
        kanal = %verbindung.kanal(),
        "Verbindung aufgewertet"
    );

    // register strikt vor allem was die Verbindung beobachten kann
    zustand.hub.registrieren(Arc::clone(&verbindung)).await;

    let schreib_task = tokio::spawn(schreib_pumpe(
        sender,
        sende_rx,
        verbindung.sende_tx.clone(),
        verbindung.abbruch_signal(),
    ));

    let leitung = Leitung {
        verbindung: Arc::clone(&verbindung),
        hub: zustand.hub.clone(),
        lease: zustand.lease.clone(),
        presence: zustand.presence.clone(),
        senke: Arc::clone(&zustand.senke),
    };

    lese_pumpe(&leitung, empfaenger).await;

    // Nachlauf: abmelden schliesst die Queue, die Schreib-Pumpe endet
    zustand.hub.abmelden(Arc::clone(&verbindung)).await;
    let _ = schreib_task.await;

    tracing::info!(verbindung = %verbindung.id, "Verbindungs-Task beendet");
}
