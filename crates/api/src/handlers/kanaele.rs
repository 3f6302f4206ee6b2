//! Handler fuer Kanal-Verwaltung

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::Extension;
use serde::Deserialize;
use serde_json::json;
use sprechfunk_db::models::NeuerKanal;
use sprechfunk_db::KanalRepository as _;

use crate::error::{ApiError, ApiResult};
use crate::middleware::BenutzerKontext;
use crate::routes::ApiZustand;

#[derive(Debug, Deserialize)]
pub struct KanalAnfrage {
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub event_uuid: Option<String>,
}

/// `POST /api/protected/channels/create`
pub async fn kanal_anlegen(
    State(zustand): State<ApiZustand>,
    Extension(benutzer): Extension<BenutzerKontext>,
    Json(anfrage): Json<KanalAnfrage>,
) -> ApiResult<impl IntoResponse> {
    if anfrage.channel_name.is_empty() {
        return Err(ApiError::Ungueltig("Kanalname ist erforderlich".into()));
    }

    let channel_uuid = zustand
        .db
        .kanal_anlegen(NeuerKanal {
            channel_name: &anfrage.channel_name,
            event_uuid: anfrage.event_uuid.as_deref(),
            created_by: benutzer.user_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Channel created successfully",
            "channel_uuid": channel_uuid,
        })),
    ))
}

/// `GET /api/protected/channels` – Kanaele des Benutzers
///
/// Antwortet immer mit einem Array, auch wenn es leer ist.
pub async fn kanaele_auflisten(
    State(zustand): State<ApiZustand>,
    Extension(benutzer): Extension<BenutzerKontext>,
) -> ApiResult<impl IntoResponse> {
    let kanaele = zustand.db.kanaele_fuer_benutzer(benutzer.user_id).await?;
    Ok(Json(kanaele))
}

/// `DELETE /api/protected/channels/:uuid/delete` – nur der Ersteller
pub async fn kanal_loeschen(
    State(zustand): State<ApiZustand>,
    Extension(benutzer): Extension<BenutzerKontext>,
    Path(channel_uuid): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if channel_uuid.is_empty() {
        return Err(ApiError::Ungueltig("Kanal-UUID ist erforderlich".into()));
    }

    zustand
        .db
        .kanal_loeschen(&channel_uuid, benutzer.user_id)
        .await?;

    Ok(Json(json!({ "message": "Channel deleted successfully" })))
}
