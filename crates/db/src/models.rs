//! Datenbankmodelle fuer Sprechfunk
//!
//! Reine Datenuebertragungsobjekte zwischen Repository und Handlern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Benutzer
// ---------------------------------------------------------------------------

/// Benutzer-Datensatz aus der Datenbank
#[derive(Debug, Clone)]
pub struct BenutzerRecord {
    pub id: i64,
    pub user_uuid: String,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Erstellen eines neuen Benutzers
#[derive(Debug, Clone)]
pub struct NeuerBenutzer<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub hashed_password: &'a str,
}

// ---------------------------------------------------------------------------
// Kanaele
// ---------------------------------------------------------------------------

/// Daten zum Erstellen eines neuen Kanals
#[derive(Debug, Clone)]
pub struct NeuerKanal<'a> {
    pub channel_name: &'a str,
    /// UUID des zugehoerigen Events (None = freistehender Kanal)
    pub event_uuid: Option<&'a str>,
    pub created_by: i64,
}

/// Kanal aus Sicht eines Benutzers (Listen-Abfrage)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KanalUebersicht {
    pub channel_uuid: String,
    pub channel_name: String,
    pub event_uuid: Option<String>,
    pub is_creator: bool,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Daten zum Erstellen eines neuen Events
#[derive(Debug, Clone)]
pub struct NeuesEvent<'a> {
    pub event_name: &'a str,
    pub event_description: &'a str,
    pub organiser_user_id: i64,
}

/// Event aus Sicht eines Benutzers (Listen-Abfrage)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventUebersicht {
    pub event_uuid: String,
    pub event_name: String,
    pub event_description: String,
    pub is_organiser: bool,
}
