//! Repository-Trait-Definitionen
//!
//! Die Traits beschreiben die Datenzugriffe die Auth- und API-Schicht
//! benoetigen. `MySqlDb` implementiert alle drei; Tests verwenden
//! In-Memory-Implementierungen.

use crate::error::DbResult;
use crate::models::{
    BenutzerRecord, EventUebersicht, KanalUebersicht, NeuerBenutzer, NeuerKanal, NeuesEvent,
};

/// Konfiguration fuer die Datenbankverbindung
#[derive(Debug, Clone)]
pub struct DatenbankKonfig {
    pub host: String,
    pub port: u16,
    pub benutzer: String,
    pub passwort: String,
    pub datenbank: String,
    /// Maximale Anzahl gleichzeitiger Verbindungen im Pool
    pub max_verbindungen: u32,
}

impl Default for DatenbankKonfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 3306,
            benutzer: "sprechfunk".into(),
            passwort: String::new(),
            datenbank: "sprechfunk".into(),
            max_verbindungen: 10,
        }
    }
}

/// Repository fuer Benutzer-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait UserRepository: Send + Sync {
    /// Legt einen neuen Benutzer an (eindeutig nach Username und E-Mail)
    async fn erstellen(&self, daten: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord>;

    /// Laedt einen Benutzer anhand seiner E-Mail-Adresse
    async fn nach_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>>;

    /// Laedt einen Benutzer anhand seines Benutzernamens
    async fn nach_username(&self, username: &str) -> DbResult<Option<BenutzerRecord>>;
}

/// Repository fuer Kanal-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait KanalRepository: Send + Sync {
    /// Legt einen Kanal transaktional an (inkl. Ersteller als Admin-Mitglied).
    /// Gibt die UUID des neuen Kanals zurueck.
    async fn kanal_anlegen(&self, daten: NeuerKanal<'_>) -> DbResult<String>;

    /// Listet alle Kanaele in denen der Benutzer Mitglied ist
    /// (direkt oder ueber eine Event-Mitgliedschaft)
    async fn kanaele_fuer_benutzer(&self, user_id: i64) -> DbResult<Vec<KanalUebersicht>>;

    /// Loescht einen Kanal; nur der Ersteller darf das
    async fn kanal_loeschen(&self, channel_uuid: &str, user_id: i64) -> DbResult<()>;
}

/// Repository fuer Event-Datenzugriffe
#[allow(async_fn_in_trait)]
pub trait EventRepository: Send + Sync {
    /// Legt ein Event transaktional an (inkl. Organisator als Mitglied).
    /// Gibt die UUID des neuen Events zurueck.
    async fn event_anlegen(&self, daten: NeuesEvent<'_>) -> DbResult<String>;

    /// Listet alle Events in denen der Benutzer Mitglied ist
    async fn events_fuer_benutzer(&self, user_id: i64) -> DbResult<Vec<EventUebersicht>>;

    /// Tritt einem Event als einfaches Mitglied bei
    async fn event_beitreten(&self, event_uuid: &str, user_id: i64) -> DbResult<()>;

    /// Loescht ein Event; nur der Organisator darf das
    async fn event_loeschen(&self, event_uuid: &str, user_id: i64) -> DbResult<()>;
}
