//! sprechfunk-auth – Authentifizierung und Tokenverwaltung
//!
//! Zentraler Einstiegspunkt fuer Registrierung, Login und die
//! HMAC-signierten Zugriffstoken. Die Sperrliste haelt widerrufene
//! Token-IDs (jti) bis zu ihrem natuerlichen Ablauf.

pub mod blacklist;
pub mod error;
pub mod password;
pub mod rate_limit;
pub mod service;
pub mod token;

pub use blacklist::JtiSperrliste;
pub use error::{AuthError, AuthResult};
pub use rate_limit::AnmeldeRateLimiter;
pub use service::AuthService;
pub use token::{TokenClaims, TokenDienst};
