//! MySQL-Implementierung des KanalRepository
//!
//! Kanal-Erstellung ist transaktional: der Kanal und die Admin-
//! Mitgliedschaft des Erstellers entstehen zusammen oder gar nicht.

use sqlx::Row as _;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::{KanalUebersicht, NeuerKanal};
use crate::mysql::pool::MySqlDb;
use crate::repository::KanalRepository;

impl KanalRepository for MySqlDb {
    async fn kanal_anlegen(&self, daten: NeuerKanal<'_>) -> DbResult<String> {
        let channel_uuid = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await?;

        // Bei Event-Bindung: Event aufloesen und Organisator-Rechte pruefen
        let event_id: Option<i64> = match daten.event_uuid {
            Some(event_uuid) if !event_uuid.is_empty() => {
                let zeile = sqlx::query(
                    "SELECT id FROM events WHERE event_uuid = ? AND organiser_user_id = ?",
                )
                .bind(event_uuid)
                .bind(daten.created_by)
                .fetch_optional(&mut *tx)
                .await?;

                match zeile {
                    Some(z) => Some(z.try_get::<i64, _>("id")?),
                    None => {
                        return Err(DbError::ZugriffVerweigert(
                            "Event nicht gefunden oder kein Organisator".into(),
                        ));
                    }
                }
            }
            _ => None,
        };

        let ergebnis = sqlx::query(
            "INSERT INTO channels (channel_uuid, channel_name, event_id, created_by)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&channel_uuid)
        .bind(daten.channel_name)
        .bind(event_id)
        .bind(daten.created_by)
        .execute(&mut *tx)
        .await?;

        let kanal_id = ergebnis.last_insert_id() as i64;

        sqlx::query("INSERT INTO channel_members (channel_id, user_id, role) VALUES (?, ?, 'admin')")
            .bind(kanal_id)
            .bind(daten.created_by)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = daten.created_by,
            kanal = %daten.channel_name,
            uuid = %channel_uuid,
            "Kanal angelegt"
        );
        Ok(channel_uuid)
    }

    async fn kanaele_fuer_benutzer(&self, user_id: i64) -> DbResult<Vec<KanalUebersicht>> {
        let zeilen = sqlx::query(
            "SELECT DISTINCT c.channel_uuid, c.channel_name, e.event_uuid,
                    CAST(c.created_by = ? AS SIGNED) AS is_creator
             FROM channels c
             LEFT JOIN events e ON c.event_id = e.id
             LEFT JOIN channel_members cm ON c.id = cm.channel_id
             LEFT JOIN event_members em ON e.id = em.event_id
             WHERE cm.user_id = ? OR em.user_id = ?",
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        zeilen
            .iter()
            .map(|z| {
                Ok(KanalUebersicht {
                    channel_uuid: z.try_get("channel_uuid")?,
                    channel_name: z.try_get("channel_name")?,
                    event_uuid: z.try_get("event_uuid")?,
                    is_creator: z.try_get::<i64, _>("is_creator")? != 0,
                })
            })
            .collect()
    }

    async fn kanal_loeschen(&self, channel_uuid: &str, user_id: i64) -> DbResult<()> {
        let zeile = sqlx::query(
            "SELECT channel_name, created_by FROM channels WHERE channel_uuid = ?",
        )
        .bind(channel_uuid)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::nicht_gefunden(format!("Kanal {channel_uuid}")))?;

        let created_by: i64 = zeile.try_get("created_by")?;
        if created_by != user_id {
            return Err(DbError::ZugriffVerweigert(
                "Nur der Ersteller darf den Kanal loeschen".into(),
            ));
        }

        // Mitgliedschaften verschwinden ueber ON DELETE CASCADE
        sqlx::query("DELETE FROM channels WHERE channel_uuid = ?")
            .bind(channel_uuid)
            .execute(&self.pool)
            .await?;

        let kanal_name: String = zeile.try_get("channel_name")?;
        tracing::info!(
            user_id,
            kanal = %kanal_name,
            uuid = %channel_uuid,
            "Kanal geloescht"
        );
        Ok(())
    }
}
