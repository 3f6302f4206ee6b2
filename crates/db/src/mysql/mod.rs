//! MySQL-Implementierung der Repositories

pub mod channels;
pub mod events;
pub mod pool;
pub mod users;
