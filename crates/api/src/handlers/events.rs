//! Handler fuer Event-Verwaltung

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::Extension;
use serde::Deserialize;
use serde_json::json;
use sprechfunk_db::models::NeuesEvent;
use sprechfunk_db::EventRepository as _;

use crate::error::{ApiError, ApiResult};
use crate::middleware::BenutzerKontext;
use crate::routes::ApiZustand;

#[derive(Debug, Deserialize)]
pub struct EventAnfrage {
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub event_description: String,
}

#[derive(Debug, Deserialize)]
pub struct EventBeitrittsAnfrage {
    #[serde(default)]
    pub event_uuid: String,
}

/// `POST /api/protected/events/create`
pub async fn event_anlegen(
    State(zustand): State<ApiZustand>,
    Extension(benutzer): Extension<BenutzerKontext>,
    Json(anfrage): Json<EventAnfrage>,
) -> ApiResult<impl IntoResponse> {
    if anfrage.event_name.is_empty() {
        return Err(ApiError::Ungueltig("Eventname ist erforderlich".into()));
    }

    let event_uuid = zustand
        .db
        .event_anlegen(NeuesEvent {
            event_name: &anfrage.event_name,
            event_description: &anfrage.event_description,
            organiser_user_id: benutzer.user_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Event created successfully",
            "event_uuid": event_uuid,
        })),
    ))
}

/// `GET /api/protected/events` – Events des Benutzers
pub async fn events_auflisten(
    State(zustand): State<ApiZustand>,
    Extension(benutzer): Extension<BenutzerKontext>,
) -> ApiResult<impl IntoResponse> {
    let events = zustand.db.events_fuer_benutzer(benutzer.user_id).await?;
    Ok(Json(events))
}

/// `POST /api/protected/events/join` – als einfaches Mitglied beitreten
pub async fn event_beitreten(
    State(zustand): State<ApiZustand>,
    Extension(benutzer): Extension<BenutzerKontext>,
    Json(anfrage): Json<EventBeitrittsAnfrage>,
) -> ApiResult<impl IntoResponse> {
    if anfrage.event_uuid.is_empty() {
        return Err(ApiError::Ungueltig("Event-UUID ist erforderlich".into()));
    }

    zustand
        .db
        .event_beitreten(&anfrage.event_uuid, benutzer.user_id)
        .await?;

    Ok(Json(json!({ "message": "Joined event successfully" })))
}

/// `DELETE /api/protected/events/:uuid/delete` – nur der Organisator
pub async fn event_loeschen(
    State(zustand): State<ApiZustand>,
    Extension(benutzer): Extension<BenutzerKontext>,
    Path(event_uuid): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if event_uuid.is_empty() {
        return Err(ApiError::Ungueltig("Event-UUID ist erforderlich".into()));
    }

    zustand
        .db
        .event_loeschen(&event_uuid, benutzer.user_id)
        .await?;

    Ok(Json(json!({ "message": "Event deleted successfully" })))
}
