//! Integration-Tests fuer KanalRepository (In-Memory)
//!
//! Schwerpunkt: die Eigentums-Pruefung beim Loeschen und die
//! `is_creator`-Berechnung der Listen-Abfrage.

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

#[tokio::test]
async fn kanal_anlegen_macht_ersteller_zum_admin() {
    let db = db();
    let erstellerin = benutzer(&db, "erstellerin").await;

    let uuid = KanalRepository::kanal_anlegen(
        &db,
        NeuerKanal {
            channel_name: "Einsatzkanal",
            event_uuid: None,
            created_by: erstellerin,
        },
    )
    .await
    .unwrap();

    assert!(!uuid.is_empty());
    assert_eq!(db.kanal_rolle(&uuid, erstellerin).as_deref(), Some("admin"));
}

#[tokio::test]
async fn is_creator_nur_fuer_die_erstellerin() {
    let db = db();
    let erstellerin = benutzer(&db, "chefin").await;
    let gast = benutzer(&db, "gast").await;

    // Kanal haengt an einem Event; der Gast sieht ihn ueber die
    // Event-Mitgliedschaft, nicht als direktes Kanal-Mitglied
    let event_uuid = EventRepository::event_anlegen(
        &db,
        NeuesEvent {
            event_name: "Manoever",
            event_description: "Herbstuebung",
            organiser_user_id: erstellerin,
        },
    )
    .await
    .unwrap();
    EventRepository::event_beitreten(&db, &event_uuid, gast)
        .await
        .unwrap();

    KanalRepository::kanal_anlegen(
        &db,
        NeuerKanal {
            channel_name: "Leitstelle",
            event_uuid: Some(&event_uuid),
            created_by: erstellerin,
        },
    )
    .await
    .unwrap();

    let bei_erstellerin = KanalRepository::kanaele_fuer_benutzer(&db, erstellerin)
        .await
        .unwrap();
    assert_eq!(bei_erstellerin.len(), 1);
    assert!(bei_erstellerin[0].is_creator);
    assert_eq!(bei_erstellerin[0].event_uuid.as_deref(), Some(event_uuid.as_str()));

    let beim_gast = KanalRepository::kanaele_fuer_benutzer(&db, gast)
        .await
        .unwrap();
    assert_eq!(beim_gast.len(), 1, "Gast sieht den Kanal ueber das Event");
    assert!(!beim_gast[0].is_creator);
}

#[tokio::test]
async fn nichtmitglied_sieht_keinen_kanal() {
    let db = db();
    let erstellerin = benutzer(&db, "drinnen").await;
    let aussenstehende = benutzer(&db, "draussen").await;

    KanalRepository::kanal_anlegen(
        &db,
        NeuerKanal {
            channel_name: "Privat",
            event_uuid: None,
            created_by: erstellerin,
        },
    )
    .await
    .unwrap();

    let liste = KanalRepository::kanaele_fuer_benutzer(&db, aussenstehende)
        .await
        .unwrap();
    assert!(liste.is_empty());
}

#[tokio::test]
async fn kanal_an_fremdem_event_wird_verweigert() {
    let db = db();
    let organisatorin = benutzer(&db, "organisatorin").await;
    let fremde = benutzer(&db, "fremde").await;

    let event_uuid = EventRepository::event_anlegen(
        &db,
        NeuesEvent {
            event_name: "Fremdes Event",
            event_description: "",
            organiser_user_id: organisatorin,
        },
    )
    .await
    .unwrap();

    let ergebnis = KanalRepository::kanal_anlegen(
        &db,
        NeuerKanal {
            channel_name: "Eindringling",
            event_uuid: Some(&event_uuid),
            created_by: fremde,
        },
    )
    .await;

    assert!(matches!(ergebnis, Err(DbError::ZugriffVerweigert(_))));
}

#[tokio::test]
async fn nur_die_erstellerin_darf_loeschen() {
    let db = db();
    let erstellerin = benutzer(&db, "besitzerin").await;
    let andere = benutzer(&db, "andere").await;

    let uuid = KanalRepository::kanal_anlegen(
        &db,
        NeuerKanal {
            channel_name: "Zu loeschen",
            event_uuid: None,
            created_by: erstellerin,
        },
    )
    .await
    .unwrap();

    // Fremder Loeschversuch prallt ab, der Kanal bleibt
    let ergebnis = KanalRepository::kanal_loeschen(&db, &uuid, andere).await;
    assert!(matches!(ergebnis, Err(DbError::ZugriffVerweigert(_))));
    assert_eq!(
        KanalRepository::kanaele_fuer_benutzer(&db, erstellerin)
            .await
            .unwrap()
            .len(),
        1
    );

    // Die Erstellerin darf
    KanalRepository::kanal_loeschen(&db, &uuid, erstellerin)
        .await
        .unwrap();
    assert!(KanalRepository::kanaele_fuer_benutzer(&db, erstellerin)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn unbekannter_kanal_ist_nicht_gefunden() {
    let db = db();
    let jemand = benutzer(&db, "jemand").await;

    let ergebnis = KanalRepository::kanal_loeschen(&db, "gibt-es-nicht", jemand).await;
    assert!(matches!(ergebnis, Err(DbError::NichtGefunden(_))));
}
