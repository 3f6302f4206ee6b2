//! sprechfunk-core – Gemeinsame Grundtypen
//!
//! Enthaelt die Identifikationstypen die von allen anderen Crates
//! verwendet werden. Bewusst abhaengigkeitsarm gehalten.

pub mod types;

pub use types::{ChannelId, ConnectionId, UserId};
