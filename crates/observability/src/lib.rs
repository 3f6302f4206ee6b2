//! sprechfunk-observability – Logging und Health-Check
//!
//! Tracing-Bootstrap (Text oder JSON, via Umgebung uebersteuerbar)
//! und der `/health`-Liveness-Endpunkt.

pub mod health;
pub mod logging;

pub use health::{health_router, HealthState};
pub use logging::logging_initialisieren;
