//! Identifikationstypen fuer Sprechfunk
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen. Benutzer-IDs
//! sind Ganzzahlen (aus der relationalen Datenbank), Kanal-IDs sind
//! opake Strings.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Benutzer-ID (Primaerschluessel der users-Tabelle)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    /// Gibt den inneren Wert zurueck
    pub fn inner(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

/// Eindeutige Kanal-ID (opaker String, z.B. "lobby" oder eine UUID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl ChannelId {
    /// Erstellt eine ChannelId aus einem beliebigen String
    pub fn neu(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt die ID als &str zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Eindeutige Verbindungs-ID (stabil fuer die Prozess-Lebensdauer)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn neu() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::neu()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_eindeutig() {
        let a = ConnectionId::neu();
        let b = ConnectionId::neu();
        assert_ne!(a, b, "Zwei neue ConnectionIds muessen verschieden sein");
    }

    #[test]
    fn channel_id_aus_str() {
        let k = ChannelId::from("lobby");
        assert_eq!(k.as_str(), "lobby");
        assert_eq!(k.to_string(), "lobby");
    }

    #[test]
    fn user_id_display_ohne_praefix() {
        // Wird direkt in KV-Schluessel eingebaut ("user:<id>:session")
        let uid = UserId(42);
        assert_eq!(uid.to_string(), "42");
        assert_eq!(format!("user:{}:session", uid), "user:42:session");
    }

    #[test]
    fn ids_sind_serde_kompatibel() {
        let uid = UserId(7);
        let json = serde_json::to_string(&uid).unwrap();
        assert_eq!(json, "7");
        let zurueck: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(uid, zurueck);

        let kanal = ChannelId::neu("c1");
        let json = serde_json::to_string(&kanal).unwrap();
        assert_eq!(json, "\"c1\"");
    }
}
