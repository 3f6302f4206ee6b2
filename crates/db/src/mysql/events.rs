//! MySQL-Implementierung des EventRepository

use sqlx::Row as _;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{EventUebersicht, NeuesEvent};
use crate::mysql::pool::MySqlDb;
use crate::repository::EventRepository;

impl EventRepository for MySqlDb {
    async fn event_anlegen(&self, daten: NeuesEvent<'_>) -> DbResult<String> {
        let event_uuid = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;

        let ergebnis = sqlx::query(
            "INSERT INTO events (event_uuid, event_name, event_description, organiser_user_id)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&event_uuid)
        .bind(daten.event_name)
        .bind(daten.event_description)
        .bind(daten.organiser_user_id)
        .execute(&mut *tx)
        .await?;

        let event_id = ergebnis.last_insert_id() as i64;

        sqlx::query("INSERT INTO event_members (event_id, user_id, role) VALUES (?, ?, 'organiser')")
            .bind(event_id)
            .bind(daten.organiser_user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = daten.organiser_user_id,
            event = %daten.event_name,
            uuid = %event_uuid,
            "Event angelegt"
        );
        Ok(event_uuid)
    }

    async fn events_fuer_benutzer(&self, user_id: i64) -> DbResult<Vec<EventUebersicht>> {
        let zeilen = sqlx::query(
            "SELECT e.event_uuid, e.event_name, e.event_description,
                    CAST(e.organiser_user_id = ? AS SIGNED) AS is_organiser
             FROM events e
             INNER JOIN event_members em ON e.id = em.event_id
             WHERE em.user_id = ?",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        zeilen
            .iter()
            .map(|z| {
                Ok(EventUebersicht {
                    event_uuid: z.try_get("event_uuid")?,
                    event_name: z.try_get("event_name")?,
                    event_description: z
                        .try_get::<Option<String>, _>("event_description")?
                        .unwrap_or_default(),
                    is_organiser: z.try_get::<i64, _>("is_organiser")? != 0,
                })
            })
            .collect()
    }

    async fn event_beitreten(&self, event_uuid: &str, user_id: i64) -> DbResult<()> {
        let zeile = sqlx::query("SELECT id FROM events WHERE event_uuid = ?")
            .bind(event_uuid)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::nicht_gefunden(format!("Event {event_uuid}")))?;

        let event_id: i64 = zeile.try_get("id")?;

        sqlx::query("INSERT INTO event_members (event_id, user_id, role) VALUES (?, ?, 'member')")
            .bind(event_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("1062") || msg.contains("Duplicate entry") {
                    DbError::Eindeutigkeit("Bereits Mitglied dieses Events".into())
                } else {
                    DbError::Sqlx(e)
                }
            })?;

        tracing::info!(user_id, event_uuid = %event_uuid, "Event beigetreten");
        Ok(())
    }

    async fn event_loeschen(&self, event_uuid: &str, user_id: i64) -> DbResult<()> {
        let zeile = sqlx::query(
            "SELECT event_name, organiser_user_id FROM events WHERE event_uuid = ?",
        )
        .bind(event_uuid)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::nicht_gefunden(format!("Event {event_uuid}")))?;

        let organiser: i64 = zeile.try_get("organiser_user_id")?;
        if organiser != user_id {
            return Err(DbError::ZugriffVerweigert(
                "Nur der Organisator darf das Event loeschen".into(),
            ));
        }

        sqlx::query("DELETE FROM events WHERE event_uuid = ?")
            .bind(event_uuid)
            .execute(&self.pool)
            .await?;

        let event_name: String = zeile.try_get("event_name")?;
        tracing::info!(
            user_id,
            event = %event_name,
            uuid = %event_uuid,
            "Event geloescht"
        );
        Ok(())
    }
}
