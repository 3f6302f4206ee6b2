//! Integration-Tests fuer UserRepository (In-Memory)

use sprechfunk_db::models::NeuerBenutzer;
use sprechfunk_db::{MemoryDb, UserRepository};

fn db() -> MemoryDb {
    MemoryDb::neu()
}

fn neuer_benutzer<'a>(username: &'a str, email: &'a str) -> NeuerBenutzer<'a> {
    NeuerBenutzer {
        username,
        email,
        hashed_password: "$2b$12$testhash",
    }
}

#[tokio::test]
async fn benutzer_erstellen_und_laden() {
    let db = db();

    let benutzer = UserRepository::erstellen(&db, neuer_benutzer("funker", "funker@example.com"))
        .await
        .unwrap();
    assert_eq!(benutzer.username, "funker");
    assert!(!benutzer.user_uuid.is_empty());

    let per_email = UserRepository::nach_email(&db, "funker@example.com")
        .await
        .unwrap()
        .expect("Benutzer per E-Mail auffindbar");
    assert_eq!(per_email.id, benutzer.id);

    let per_name = UserRepository::nach_username(&db, "funker")
        .await
        .unwrap()
        .expect("Benutzer per Name auffindbar");
    assert_eq!(per_name.id, benutzer.id);
}

#[tokio::test]
async fn doppelter_benutzername_ist_eindeutigkeitsfehler() {
    let db = db();
    UserRepository::erstellen(&db, neuer_benutzer("doppelt", "a@example.com"))
        .await
        .unwrap();

    let ergebnis =
        UserRepository::erstellen(&db, neuer_benutzer("doppelt", "b@example.com")).await;
    assert!(ergebnis.unwrap_err().ist_eindeutigkeit());
}

#[tokio::test]
async fn doppelte_email_ist_eindeutigkeitsfehler() {
    let db = db();
    UserRepository::erstellen(&db, neuer_benutzer("erste", "gleich@example.com"))
        .await
        .unwrap();

    let ergebnis =
        UserRepository::erstellen(&db, neuer_benutzer("zweite", "gleich@example.com")).await;
    assert!(ergebnis.unwrap_err().ist_eindeutigkeit());
}

#[tokio::test]
async fn unbekannte_kennung_gibt_none() {
    let db = db();
    assert!(UserRepository::nach_email(&db, "niemand@example.com")
        .await
        .unwrap()
        .is_none());
    assert!(UserRepository::nach_username(&db, "niemand")
        .await
        .unwrap()
        .is_none());
}
