//! In-Memory-Implementierung der Repositories
//!
//! Vertragsgleicher Ersatz fuer die MySQL-Implementierung in Tests:
//! dieselben Eindeutigkeits-, Eigentums- und Kaskadenregeln, ohne
//! laufende Datenbank. Uebernimmt die Rolle die eine In-Memory-
//! Datenbank bei den Integrationstests spielt.

use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{
    BenutzerRecord, EventUebersicht, KanalUebersicht, NeuerBenutzer, NeuerKanal, NeuesEvent,
};
use crate::repository::{EventRepository, KanalRepository, UserRepository};

struct EventZeile {
    id: i64,
    event_uuid: String,
    event_name: String,
    event_description: String,
    organiser_user_id: i64,
}

struct KanalZeile {
    id: i64,
    channel_uuid: String,
    channel_name: String,
    event_id: Option<i64>,
    created_by: i64,
}

/// (eltern_id, user_id, role) – eine Mitgliedschafts-Zeile
struct Mitgliedschaft {
    eltern_id: i64,
    user_id: i64,
    role: String,
}

#[derive(Default)]
struct MemoryTabellen {
    benutzer: Vec<BenutzerRecord>,
    events: Vec<EventZeile>,
    event_mitglieder: Vec<Mitgliedschaft>,
    kanaele: Vec<KanalZeile>,
    kanal_mitglieder: Vec<Mitgliedschaft>,
    naechste_id: i64,
}

impl MemoryTabellen {
    fn id_vergeben(&mut self) -> i64 {
        self.naechste_id += 1;
        self.naechste_id
    }
}

/// In-Memory-Datenbank mit denselben Repository-Vertraegen wie MySQL
#[derive(Default)]
pub struct MemoryDb {
    tabellen: Mutex<MemoryTabellen>,
}

impl MemoryDb {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Rolle eines Benutzers in einem Event (fuer Tests)
    pub fn event_rolle(&self, event_uuid: &str, user_id: i64) -> Option<String> {
        let tabellen = self.tabellen.lock();
        let event_id = tabellen
            .events
            .iter()
            .find(|e| e.event_uuid == event_uuid)?
            .id;
        tabellen
            .event_mitglieder
            .iter()
            .find(|m| m.eltern_id == event_id && m.user_id == user_id)
            .map(|m| m.role.clone())
    }

    /// Rolle eines Benutzers in einem Kanal (fuer Tests)
    pub fn kanal_rolle(&self, channel_uuid: &str, user_id: i64) -> Option<String> {
        let tabellen = self.tabellen.lock();
        let kanal_id = tabellen
            .kanaele
            .iter()
            .find(|k| k.channel_uuid == channel_uuid)?
            .id;
        tabellen
            .kanal_mitglieder
            .iter()
            .find(|m| m.eltern_id == kanal_id && m.user_id == user_id)
            .map(|m| m.role.clone())
    }
}

impl UserRepository for MemoryDb {
    async fn erstellen(&self, daten: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let mut tabellen = self.tabellen.lock();

        if tabellen
            .benutzer
            .iter()
            .any(|b| b.username == daten.username || b.email == daten.email)
        {
            return Err(DbError::Eindeutigkeit(format!(
                "Benutzername oder E-Mail bereits vergeben: {}",
                daten.username
            )));
        }

        let id = tabellen.id_vergeben();
        let record = BenutzerRecord {
            id,
            user_uuid: Uuid::new_v4().to_string(),
            username: daten.username.to_string(),
            email: daten.email.to_string(),
            hashed_password: daten.hashed_password.to_string(),
            created_at: Utc::now(),
        };
        tabellen.benutzer.push(record.clone());
        Ok(record)
    }

    async fn nach_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>> {
        Ok(self
            .tabellen
            .lock()
            .benutzer
            .iter()
            .find(|b| b.email == email)
            .cloned())
    }

    async fn nach_username(&self, username: &str) -> DbResult<Option<BenutzerRecord>> {
        Ok(self
            .tabellen
            .lock()
            .benutzer
            .iter()
            .find(|b| b.username == username)
            .cloned())
    }
}

impl KanalRepository for MemoryDb {
    async fn kanal_anlegen(&self, daten: NeuerKanal<'_>) -> DbResult<String> {
        let mut tabellen = self.tabellen.lock();

        // Bei Event-Bindung: nur der Organisator darf Kanaele anhaengen
        let event_id = match daten.event_uuid {
            Some(event_uuid) if !event_uuid.is_empty() => {
                let event = tabellen
                    .events
                    .iter()
                    .find(|e| e.event_uuid == event_uuid && e.organiser_user_id == daten.created_by);
                match event {
                    Some(e) => Some(e.id),
                    None => {
                        return Err(DbError::ZugriffVerweigert(
                            "Event nicht gefunden oder kein Organisator".into(),
                        ));
                    }
                }
            }
            _ => None,
        };

        let id = tabellen.id_vergeben();
        let channel_uuid = Uuid::new_v4().to_string();
        tabellen.kanaele.push(KanalZeile {
            id,
            channel_uuid: channel_uuid.clone(),
            channel_name: daten.channel_name.to_string(),
            event_id,
            created_by: daten.created_by,
        });
        tabellen.kanal_mitglieder.push(Mitgliedschaft {
            eltern_id: id,
            user_id: daten.created_by,
            role: "admin".into(),
        });

        Ok(channel_uuid)
    }

    async fn kanaele_fuer_benutzer(&self, user_id: i64) -> DbResult<Vec<KanalUebersicht>> {
        let tabellen = self.tabellen.lock();

        let uebersicht = tabellen
            .kanaele
            .iter()
            .filter(|kanal| {
                let direkt = tabellen
                    .kanal_mitglieder
                    .iter()
                    .any(|m| m.eltern_id == kanal.id && m.user_id == user_id);
                let ueber_event = kanal.event_id.is_some_and(|event_id| {
                    tabellen
                        .event_mitglieder
                        .iter()
                        .any(|m| m.eltern_id == event_id && m.user_id == user_id)
                });
                direkt || ueber_event
            })
            .map(|kanal| KanalUebersicht {
                channel_uuid: kanal.channel_uuid.clone(),
                channel_name: kanal.channel_name.clone(),
                event_uuid: kanal.event_id.and_then(|event_id| {
                    tabellen
                        .events
                        .iter()
                        .find(|e| e.id == event_id)
                        .map(|e| e.event_uuid.clone())
                }),
                is_creator: kanal.created_by == user_id,
            })
            .collect();

        Ok(uebersicht)
    }

    async fn kanal_loeschen(&self, channel_uuid: &str, user_id: i64) -> DbResult<()> {
        let mut tabellen = self.tabellen.lock();

        let kanal = tabellen
            .kanaele
            .iter()
            .find(|k| k.channel_uuid == channel_uuid)
            .ok_or_else(|| DbError::nicht_gefunden(format!("Kanal {channel_uuid}")))?;

        if kanal.created_by != user_id {
            return Err(DbError::ZugriffVerweigert(
                "Nur der Ersteller darf den Kanal loeschen".into(),
            ));
        }

        let kanal_id = kanal.id;
        tabellen.kanaele.retain(|k| k.id != kanal_id);
        tabellen
            .kanal_mitglieder
            .retain(|m| m.eltern_id != kanal_id);
        Ok(())
    }
}

impl EventRepository for MemoryDb {
    async fn event_anlegen(&self, daten: NeuesEvent<'_>) -> DbResult<String> {
        let mut tabellen = self.tabellen.lock();

        let id = tabellen.id_vergeben();
        let event_uuid = Uuid::new_v4().to_string();
        tabellen.events.push(EventZeile {
            id,
            event_uuid: event_uuid.clone(),
            event_name: daten.event_name.to_string(),
            event_description: daten.event_description.to_string(),
            organiser_user_id: daten.organiser_user_id,
        });
        tabellen.event_mitglieder.push(Mitgliedschaft {
            eltern_id: id,
            user_id: daten.organiser_user_id,
            role: "organiser".into(),
        });

        Ok(event_uuid)
    }

    async fn events_fuer_benutzer(&self, user_id: i64) -> DbResult<Vec<EventUebersicht>> {
        let tabellen = self.tabellen.lock();

        let uebersicht = tabellen
            .events
            .iter()
            .filter(|event| {
                tabellen
                    .event_mitglieder
                    .iter()
                    .any(|m| m.eltern_id == event.id && m.user_id == user_id)
            })
            .map(|event| EventUebersicht {
                event_uuid: event.event_uuid.clone(),
                event_name: event.event_name.clone(),
                event_description: event.event_description.clone(),
                is_organiser: event.organiser_user_id == user_id,
            })
            .collect();

        Ok(uebersicht)
    }

    async fn event_beitreten(&self, event_uuid: &str, user_id: i64) -> DbResult<()> {
        let mut tabellen = self.tabellen.lock();

        let event_id = tabellen
            .events
            .iter()
            .find(|e| e.event_uuid == event_uuid)
            .map(|e| e.id)
            .ok_or_else(|| DbError::nicht_gefunden(format!("Event {event_uuid}")))?;

        if tabellen
            .event_mitglieder
            .iter()
            .any(|m| m.eltern_id == event_id && m.user_id == user_id)
        {
            return Err(DbError::Eindeutigkeit("Bereits Mitglied dieses Events".into()));
        }

        tabellen.event_mitglieder.push(Mitgliedschaft {
            eltern_id: event_id,
            user_id,
            role: "member".into(),
        });
        Ok(())
    }

    async fn event_loeschen(&self, event_uuid: &str, user_id: i64) -> DbResult<()> {
        let mut tabellen = self.tabellen.lock();

        let event = tabellen
            .events
            .iter()
            .find(|e| e.event_uuid == event_uuid)
            .ok_or_else(|| DbError::nicht_gefunden(format!("Event {event_uuid}")))?;

        if event.organiser_user_id != user_id {
            return Err(DbError::ZugriffVerweigert(
                "Nur der Organisator darf das Event loeschen".into(),
            ));
        }

        // Kaskade wie die Fremdschluessel im Schema
        let event_id = event.id;
        tabellen.events.retain(|e| e.id != event_id);
        tabellen
            .event_mitglieder
            .retain(|m| m.eltern_id != event_id);

        let kanal_ids: Vec<i64> = tabellen
            .kanaele
            .iter()
            .filter(|k| k.event_id == Some(event_id))
            .map(|k| k.id)
            .collect();
        tabellen.kanaele.retain(|k| k.event_id != Some(event_id));
        tabellen
            .kanal_mitglieder
            .retain(|m| !kanal_ids.contains(&m.eltern_id));

        Ok(())
    }
}
