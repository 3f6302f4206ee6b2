//! Handler fuer Registrierung, Login und Token-Verwaltung

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use sprechfunk_kv::PresenceStore as _;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{bearer_token, client_ip};
use crate::routes::ApiZustand;

#[derive(Debug, Deserialize)]
pub struct RegistrierungsAnfrage {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AnmeldeAnfrage {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `POST /auth/register` – legt einen neuen Benutzer an
///
/// Teilt sich das Rate-Limit mit dem Login (5 Versuche pro Minute).
pub async fn registrieren(
    State(zustand): State<ApiZustand>,
    ConnectInfo(adresse): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(anfrage): Json<RegistrierungsAnfrage>,
) -> ApiResult<impl IntoResponse> {
    let client = client_ip(&headers).unwrap_or_else(|| adresse.ip().to_string());
    if !zustand.rate_limiter.erlaubt(&client) {
        tracing::warn!(client = %client, "Rate-Limit fuer Registrierung erreicht");
        return Err(ApiError::ZuVieleAnfragen);
    }

    zustand
        .auth_service
        .registrieren(&anfrage.username, &anfrage.email, &anfrage.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Registration successful." })),
    ))
}

/// `POST /auth/login` – prueft Anmeldedaten und praegt ein Token
///
/// Rate-Limit: 5 Versuche pro Minute pro Client-Adresse.
pub async fn anmelden(
    State(zustand): State<ApiZustand>,
    ConnectInfo(adresse): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(anfrage): Json<AnmeldeAnfrage>,
) -> ApiResult<impl IntoResponse> {
    let client = client_ip(&headers).unwrap_or_else(|| adresse.ip().to_string());
    if !zustand.rate_limiter.erlaubt(&client) {
        tracing::warn!(client = %client, "Rate-Limit fuer Anmeldung erreicht");
        return Err(ApiError::ZuVieleAnfragen);
    }

    let kennung = if !anfrage.email.is_empty() {
        anfrage.email.as_str()
    } else {
        anfrage.username.as_str()
    };

    let (benutzer, token, _claims) = zustand.auth_service.anmelden(kennung, &anfrage.password).await?;

    // Benutzer-Info im KV-Store hinterlegen (Best-Effort)
    if let Err(e) = zustand
        .presence
        .info_setzen(benutzer.id.into(), &benutzer.username, &benutzer.email)
        .await
    {
        tracing::warn!(fehler = %e, "Benutzer-Info nicht hinterlegbar");
    }

    Ok(Json(json!({ "token": token })))
}

/// `POST /api/refresh` – tauscht ein (ggf. abgelaufenes) Token
///
/// Laeuft bewusst nicht durch die strenge Auth-Middleware: die Signatur
/// muss stimmen, der Ablauf darf ueberschritten sein.
pub async fn token_erneuern(
    State(zustand): State<ApiZustand>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::NichtAutorisiert("Authorization-Header fehlt".into()))?;

    let (neues_token, _claims) = zustand.auth_service.token_erneuern(token)?;

    Ok(Json(json!({ "token": neues_token })))
}

/// `POST /api/logout` – sperrt das Token und raeumt die Presence
pub async fn abmelden(
    State(zustand): State<ApiZustand>,
    headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::NichtAutorisiert("Authorization-Header fehlt".into()))?;

    let claims = zustand.auth_service.abmelden(token)?;

    if let Err(e) = zustand.presence.session_loeschen(claims.user_id.into()).await {
        tracing::warn!(fehler = %e, "Presence beim Logout nicht bereinigt");
    }

    Ok(Json(json!({ "message": "Logged out successfully" })))
}
