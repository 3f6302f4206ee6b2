//! Fehler-zu-HTTP-Abbildung der API

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use sprechfunk_auth::AuthError;
use sprechfunk_db::DbError;
use thiserror::Error;

/// API-Fehler mit festem HTTP-Status
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Ungueltige Anfrage: {0}")]
    Ungueltig(String),

    #[error("Nicht autorisiert: {0}")]
    NichtAutorisiert(String),

    #[error("Verboten: {0}")]
    Verboten(String),

    #[error("Nicht gefunden: {0}")]
    NichtGefunden(String),

    #[error("Konflikt: {0}")]
    Konflikt(String),

    #[error("Zu viele Anfragen")]
    ZuVieleAnfragen,

    #[error("Interner Fehler: {0}")]
    Intern(String),
}

/// Result-Typ der API-Handler
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Ungueltig(_) => StatusCode::BAD_REQUEST,
            Self::NichtAutorisiert(_) => StatusCode::UNAUTHORIZED,
            Self::Verboten(_) => StatusCode::FORBIDDEN,
            Self::NichtGefunden(_) => StatusCode::NOT_FOUND,
            Self::Konflikt(_) => StatusCode::CONFLICT,
            Self::ZuVieleAnfragen => StatusCode::TOO_MANY_REQUESTS,
            Self::Intern(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(fehler = %self, "Interner API-Fehler");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::UngueltigeAnmeldedaten => {
                Self::NichtAutorisiert("Ungueltige Anmeldedaten".into())
            }
            AuthError::BenutzerVergeben(wer) => {
                Self::Konflikt(format!("Bereits vergeben: {wer}"))
            }
            AuthError::FeldFehlt(feld) => Self::Ungueltig(format!("Pflichtfeld fehlt: {feld}")),
            AuthError::TokenFehlerhaft(_)
            | AuthError::SignaturUngueltig
            | AuthError::AlgorithmusUnzulaessig(_)
            | AuthError::TokenAbgelaufen
            | AuthError::TokenWiderrufen => Self::NichtAutorisiert(e.to_string()),
            AuthError::PasswortHashing(grund) => Self::Intern(grund),
            AuthError::Db(db) => db.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NichtGefunden(was) => Self::NichtGefunden(was),
            DbError::Eindeutigkeit(was) => Self::Konflikt(was),
            DbError::ZugriffVerweigert(grund) => Self::Verboten(grund),
            andere => Self::Intern(andere.to_string()),
        }
    }
}
