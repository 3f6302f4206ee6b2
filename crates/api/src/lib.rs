//! sprechfunk-api – Authentifizierte HTTP-Oberflaeche
//!
//! Axum-Router fuer Registrierung/Login, Token-Verwaltung und die
//! CRUD-Endpunkte fuer Kanaele und Events. Die Auth-Middleware prueft
//! Bearer-Token (Signatur, Algorithmus, Sperrliste) und reicht die
//! Benutzer-ID als Extension an die Handler weiter.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use middleware::BenutzerKontext;
pub use routes::{api_router, ApiZustand};
