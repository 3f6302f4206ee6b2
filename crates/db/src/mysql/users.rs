//! MySQL-Implementierung des UserRepository

use sqlx::Row as _;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{BenutzerRecord, NeuerBenutzer};
use crate::mysql::pool::MySqlDb;
use crate::repository::UserRepository;

impl UserRepository for MySqlDb {
    async fn erstellen(&self, daten: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let user_uuid = Uuid::new_v4().to_string();

        let ergebnis = sqlx::query(
            "INSERT INTO users (user_uuid, username, email, hashed_password)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&user_uuid)
        .bind(daten.username)
        .bind(daten.email)
        .bind(daten.hashed_password)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("1062") || msg.contains("Duplicate entry") {
                DbError::Eindeutigkeit(format!(
                    "Benutzername oder E-Mail bereits vergeben: {}",
                    daten.username
                ))
            } else {
                DbError::Sqlx(e)
            }
        })?;

        let id = ergebnis.last_insert_id() as i64;

        self.nach_username(daten.username)
            .await?
            .ok_or_else(|| DbError::intern(format!("Benutzer {id} nach Insert nicht gefunden")))
    }

    async fn nach_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>> {
        let zeile = sqlx::query(
            "SELECT id, user_uuid, username, email, hashed_password, created_at
             FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        zeile.map(|z| zeile_zu_benutzer(&z)).transpose()
    }

    async fn nach_username(&self, username: &str) -> DbResult<Option<BenutzerRecord>> {
        let zeile = sqlx::query(
            "SELECT id, user_uuid, username, email, hashed_password, created_at
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        zeile.map(|z| zeile_zu_benutzer(&z)).transpose()
    }
}

fn zeile_zu_benutzer(zeile: &sqlx::mysql::MySqlRow) -> DbResult<BenutzerRecord> {
    Ok(BenutzerRecord {
        id: zeile.try_get::<i64, _>("id")?,
        user_uuid: zeile.try_get("user_uuid")?,
        username: zeile.try_get("username")?,
        email: zeile.try_get("email")?,
        hashed_password: zeile.try_get("hashed_password")?,
        created_at: zeile.try_get("created_at")?,
    })
}
