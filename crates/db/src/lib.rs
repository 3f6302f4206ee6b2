//! sprechfunk-db – Relationale Persistenz (MySQL via sqlx)
//!
//! Das Repository-Pattern entkoppelt die Handler von der konkreten
//! Datenbank: `UserRepository`, `KanalRepository` und `EventRepository`
//! sind Traits, `MySqlDb` die produktive Implementierung. `MemoryDb`
//! erfuellt dieselben Vertraege ohne laufende Datenbank und traegt die
//! Integrationstests.

pub mod error;
pub mod memory;
pub mod models;
pub mod repository;

mod mysql;

pub use error::{DbError, DbResult};
pub use memory::MemoryDb;
pub use mysql::pool::MySqlDb;
pub use repository::{DatenbankKonfig, EventRepository, KanalRepository, UserRepository};
