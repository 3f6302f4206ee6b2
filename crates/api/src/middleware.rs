//! Auth-Middleware und Sicherheits-Header
//!
//! Extrahiert den Bearer-Token aus `Authorization` (oder dem
//! Altbestands-Header `auth`), validiert Signatur, Algorithmus und
//! Sperrliste und legt den Benutzerkontext als Extension ab.
//! Jede Antwort der API bekommt die Standard-Sicherheits-Header.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use crate::error::ApiError;
use crate::routes::ApiZustand;

/// Authentifizierter Benutzerkontext (Extension fuer Handler)
#[derive(Debug, Clone)]
pub struct BenutzerKontext {
    pub user_id: i64,
    pub username: String,
    pub jti: String,
    pub exp: i64,
}

/// Extrahiert den Bearer-Token aus den Request-Headern
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .or_else(|| headers.get("auth"))
        .and_then(|wert| wert.to_str().ok())
        .and_then(|wert| wert.strip_prefix("Bearer "))
}

/// Extrahiert die Client-IP aus den Request-Headern
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|wert| wert.to_str().ok())
        .and_then(|wert| wert.split(',').next())
        .map(|wert| wert.trim().to_string())
}

/// Middleware: Bearer-Token pruefen, Benutzerkontext ablegen
pub async fn auth_middleware(
    State(zustand): State<ApiZustand>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::NichtAutorisiert("Authorization-Header fehlt".into()))?
        .to_string();

    let claims = zustand
        .token_dienst
        .validieren(&token)
        .map_err(ApiError::from)?;

    if zustand.sperrliste.ist_gesperrt(&claims.jti) {
        return Err(ApiError::NichtAutorisiert("Token wurde widerrufen".into()));
    }

    request.extensions_mut().insert(BenutzerKontext {
        user_id: claims.user_id,
        username: claims.username,
        jti: claims.jti,
        exp: claims.exp,
    });

    Ok(next.run(request).await)
}

/// Middleware: Standard-Sicherheits-Header auf jeder Antwort
pub async fn sicherheits_header(request: Request, next: Next) -> Response {
    let mut antwort = next.run(request).await;
    let headers = antwort.headers_mut();
    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("X-XSS-Protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        "Strict-Transport-Security",
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("default-src 'self'"),
    );
    antwort
}
