//! sprechfunk-kv – Key-Value-Fassaden ueber Redis
//!
//! Der Key-Value-Store traegt den prozessuebergreifenden Zustand:
//! die Sprecher-Leases pro Kanal, die Presence-Eintraege pro Benutzer
//! und die oeffentlichen Schluessel aus dem Key-Exchange.
//!
//! Die Fassaden sind als Traits geschnitten (`LeaseStore`, `PresenceStore`),
//! damit der Hub in Tests gegen In-Memory-Implementierungen laufen kann.
//! Die produktiven Implementierungen (`RedisLease`, `RedisPresence`)
//! teilen sich einen `redis::aio::ConnectionManager`.

pub mod backoff;
pub mod error;
pub mod lease;
pub mod presence;
pub mod schluessel;
pub mod store;
pub mod sweeper;

pub use error::{KvError, KvResult};
pub use lease::{LeaseStore, RedisLease};
pub use presence::{PresenceStore, RedisPresence};
pub use store::KvStore;
pub use sweeper::Aufraeumer;
