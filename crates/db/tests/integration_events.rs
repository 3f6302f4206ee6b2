//! Integration-Tests fuer EventRepository (In-Memory)
//!
//! Schwerpunkt: Beitritt (unbekanntes Event, doppelter Beitritt),
//! `is_organiser`-Berechnung und die Eigentums-Pruefung beim Loeschen.

use sprechfunk_db::models::{NeuerBenutzer, NeuerKanal, NeuesEvent};
use sprechfunk_db::{DbError, EventRepository, KanalRepository, MemoryDb, UserRepository};

fn db() -> MemoryDb {
    MemoryDb::neu()
}

async fn benutzer(db: &MemoryDb, username: &str) -> i64 {
    UserRepository::erstellen(
        db,
        NeuerBenutzer {
            username,
            email: &format!("{username}@example.com"),
            hashed_password: "$2b$12$testhash",
        },
    )
    .await
    .unwrap()
    .id
}

async fn event(db: &MemoryDb, name: &str, organisatorin: i64) -> String {
    EventRepository::event_anlegen(
        db,
        NeuesEvent {
            event_name: name,
            event_description: "Beschreibung",
            organiser_user_id: organisatorin,
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn event_anlegen_macht_organisatorin_zum_mitglied() {
    let db = db();
    let organisatorin = benutzer(&db, "organisatorin").await;

    let uuid = event(&db, "Fruehjahrsuebung", organisatorin).await;
    assert_eq!(
        db.event_rolle(&uuid, organisatorin).as_deref(),
        Some("organiser")
    );

    let liste = EventRepository::events_fuer_benutzer(&db, organisatorin)
        .await
        .unwrap();
    assert_eq!(liste.len(), 1);
    assert!(liste[0].is_organiser);
    assert_eq!(liste[0].event_name, "Fruehjahrsuebung");
}

#[tokio::test]
async fn beitritt_als_einfaches_mitglied() {
    let db = db();
    let organisatorin = benutzer(&db, "leitung").await;
    let teilnehmer = benutzer(&db, "teilnehmer").await;

    let uuid = event(&db, "Offenes Event", organisatorin).await;
    EventRepository::event_beitreten(&db, &uuid, teilnehmer)
        .await
        .unwrap();

    assert_eq!(db.event_rolle(&uuid, teilnehmer).as_deref(), Some("member"));

    let liste = EventRepository::events_fuer_benutzer(&db, teilnehmer)
        .await
        .unwrap();
    assert_eq!(liste.len(), 1);
    assert!(!liste[0].is_organiser, "Beigetretene sind keine Organisatoren");
}

#[tokio::test]
async fn beitritt_zu_unbekanntem_event_ist_nicht_gefunden() {
    let db = db();
    let teilnehmer = benutzer(&db, "verirrt").await;

    let ergebnis = EventRepository::event_beitreten(&db, "gibt-es-nicht", teilnehmer).await;
    assert!(matches!(ergebnis, Err(DbError::NichtGefunden(_))));
}

#[tokio::test]
async fn doppelter_beitritt_ist_eindeutigkeitsfehler() {
    let db = db();
    let organisatorin = benutzer(&db, "gastgeberin").await;
    let teilnehmer = benutzer(&db, "wiederholer").await;

    let uuid = event(&db, "Beliebtes Event", organisatorin).await;
    EventRepository::event_beitreten(&db, &uuid, teilnehmer)
        .await
        .unwrap();

    let zweiter = EventRepository::event_beitreten(&db, &uuid, teilnehmer).await;
    assert!(zweiter.as_ref().unwrap_err().ist_eindeutigkeit());
    assert!(matches!(zweiter, Err(DbError::Eindeutigkeit(_))));

    // Auch die Organisatorin ist bereits Mitglied
    let nochmal = EventRepository::event_beitreten(&db, &uuid, organisatorin).await;
    assert!(matches!(nochmal, Err(DbError::Eindeutigkeit(_))));
}

#[tokio::test]
async fn nur_die_organisatorin_darf_loeschen() {
    let db = db();
    let organisatorin = benutzer(&db, "inhaberin").await;
    let mitglied = benutzer(&db, "nur_mitglied").await;

    let uuid = event(&db, "Geschuetztes Event", organisatorin).await;
    EventRepository::event_beitreten(&db, &uuid, mitglied)
        .await
        .unwrap();

    let ergebnis = EventRepository::event_loeschen(&db, &uuid, mitglied).await;
    assert!(matches!(ergebnis, Err(DbError::ZugriffVerweigert(_))));

    EventRepository::event_loeschen(&db, &uuid, organisatorin)
        .await
        .unwrap();
    assert!(EventRepository::events_fuer_benutzer(&db, organisatorin)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn unbekanntes_event_loeschen_ist_nicht_gefunden() {
    let db = db();
    let jemand = benutzer(&db, "jemand").await;

    let ergebnis = EventRepository::event_loeschen(&db, "gibt-es-nicht", jemand).await;
    assert!(matches!(ergebnis, Err(DbError::NichtGefunden(_))));
}

#[tokio::test]
async fn event_loeschen_kaskadiert_auf_kanaele() {
    let db = db();
    let organisatorin = benutzer(&db, "kaskade").await;

    let uuid = event(&db, "Event mit Kanaelen", organisatorin).await;
    KanalRepository::kanal_anlegen(
        &db,
        NeuerKanal {
            channel_name: "Haengt am Event",
            event_uuid: Some(&uuid),
            created_by: organisatorin,
        },
    )
    .await
    .unwrap();
    assert_eq!(
        KanalRepository::kanaele_fuer_benutzer(&db, organisatorin)
            .await
            .unwrap()
            .len(),
        1
    );

    EventRepository::event_loeschen(&db, &uuid, organisatorin)
        .await
        .unwrap();

    assert!(
        KanalRepository::kanaele_fuer_benutzer(&db, organisatorin)
            .await
            .unwrap()
            .is_empty(),
        "Kanaele des Events verschwinden mit dem Event"
    );
}
