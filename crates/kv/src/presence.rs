//! Presence – extern sichtbarer Sitzungs- und Kanalzustand
//!
//! Duenner Wrapper um die Key-Value-Operationen. Sobald eine logische
//! Aktion mehr als einen Schluessel beruehrt (Anmelden, Abmelden,
//! Kanalwechsel) laeuft sie als gepipelinete Multi-Operation, damit pro
//! Aktion nur ein Roundtrip anfaellt.
//!
//! Alle benutzerbezogenen Schluessel tragen eine 30-Minuten-TTL;
//! Kanal-Sets haben keine TTL und werden beim letzten Austritt geloescht.

use chrono::Utc;
use sprechfunk_core::{ChannelId, ConnectionId, UserId};

use crate::error::KvResult;
use crate::schluessel;
use crate::store::KvStore;

/// TTL der benutzerbezogenen Presence-Schluessel (30 Minuten)
pub const SESSION_TTL_SEK: u64 = 30 * 60;

/// TTL der hinterlegten oeffentlichen Schluessel (24 Stunden)
pub const PUBLIC_KEY_TTL_SEK: u64 = 24 * 60 * 60;

/// Fassade fuer Presence-Operationen
#[allow(async_fn_in_trait)]
pub trait PresenceStore: Send + Sync {
    /// Traegt eine neue Verbindung ein: Kanal-Set, Session- und Kanal-Schluessel
    async fn anmelden(
        &self,
        user: UserId,
        kanal: &ChannelId,
        verbindung: &ConnectionId,
    ) -> KvResult<()>;

    /// Entfernt die Presence-Eintraege einer Verbindung
    async fn abmelden(&self, user: UserId, kanal: &ChannelId) -> KvResult<()>;

    /// Spiegelt einen Kanalwechsel: altes Set verlassen, neues betreten
    async fn kanal_wechseln(
        &self,
        user: UserId,
        alt: &ChannelId,
        neu: &ChannelId,
    ) -> KvResult<()>;

    /// Loescht das Benutzer-Set eines Kanals (letzter Teilnehmer weg)
    async fn kanal_set_loeschen(&self, kanal: &ChannelId) -> KvResult<()>;

    /// Hinterlegt den Info-Hash eines Benutzers (username, email, last_seen)
    async fn info_setzen(&self, user: UserId, username: &str, email: &str) -> KvResult<()>;

    /// Speichert einen oeffentlichen Schluessel unter `channel:<id>:keys:<user>`
    async fn public_key_speichern(
        &self,
        kanal: &ChannelId,
        user: UserId,
        public_key: &str,
    ) -> KvResult<()>;

    /// Loescht Session- und Kanal-Schluessel eines Benutzers (Logout)
    async fn session_loeschen(&self, user: UserId) -> KvResult<()>;
}

/// Produktive Presence-Implementierung gegen Redis
#[derive(Clone)]
pub struct RedisPresence {
    kv: KvStore,
}

impl RedisPresence {
    pub fn neu(kv: KvStore) -> Self {
        Self { kv }
    }
}

impl PresenceStore for RedisPresence {
    async fn anmelden(
        &self,
        user: UserId,
        kanal: &ChannelId,
        verbindung: &ConnectionId,
    ) -> KvResult<()> {
        let mut conn = self.kv.verbindung();
        redis::pipe()
            .sadd(schluessel::kanal_users(kanal), user.inner())
            .set_ex(
                schluessel::user_session(user),
                verbindung.to_string(),
                SESSION_TTL_SEK,
            )
            .set_ex(schluessel::user_kanal(user), kanal.as_str(), SESSION_TTL_SEK)
            .query_async::<_, ()>(&mut conn)
            .await?;

        tracing::debug!(user_id = %user, kanal = %kanal, "Presence angemeldet");
        Ok(())
    }

    async fn abmelden(&self, user: UserId, kanal: &ChannelId) -> KvResult<()> {
        let mut conn = self.kv.verbindung();
        redis::pipe()
            .del(schluessel::user_session(user))
            .del(schluessel::user_kanal(user))
            .srem(schluessel::kanal_users(kanal), user.inner())
            .query_async::<_, ()>(&mut conn)
            .await?;

        tracing::debug!(user_id = %user, kanal = %kanal, "Presence abgemeldet");
        Ok(())
    }

    async fn kanal_wechseln(
        &self,
        user: UserId,
        alt: &ChannelId,
        neu: &ChannelId,
    ) -> KvResult<()> {
        let mut conn = self.kv.verbindung();
        redis::pipe()
            .srem(schluessel::kanal_users(alt), user.inner())
            .sadd(schluessel::kanal_users(neu), user.inner())
            .set_ex(schluessel::user_kanal(user), neu.as_str(), SESSION_TTL_SEK)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn kanal_set_loeschen(&self, kanal: &ChannelId) -> KvResult<()> {
        let mut conn = self.kv.verbindung();
        let _: () = redis::cmd("DEL")
            .arg(schluessel::kanal_users(kanal))
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn info_setzen(&self, user: UserId, username: &str, email: &str) -> KvResult<()> {
        let mut conn = self.kv.verbindung();
        let pfad = schluessel::user_info(user);
        let last_seen = Utc::now().to_rfc3339();
        redis::pipe()
            .hset_multiple(
                &pfad,
                &[
                    ("username", username),
                    ("email", email),
                    ("last_seen", last_seen.as_str()),
                ],
            )
            .expire(&pfad, SESSION_TTL_SEK as i64)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn public_key_speichern(
        &self,
        kanal: &ChannelId,
        user: UserId,
        public_key: &str,
    ) -> KvResult<()> {
        let mut conn = self.kv.verbindung();
        let _: () = redis::cmd("SET")
            .arg(schluessel::kanal_schluessel(kanal, user))
            .arg(public_key)
            .arg("EX")
            .arg(PUBLIC_KEY_TTL_SEK)
            .query_async(&mut conn)
            .await?;

        tracing::debug!(user_id = %user, kanal = %kanal, "Oeffentlicher Schluessel hinterlegt");
        Ok(())
    }

    async fn session_loeschen(&self, user: UserId) -> KvResult<()> {
        let mut conn = self.kv.verbindung();
        redis::pipe()
            .del(schluessel::user_session(user))
            .del(schluessel::user_kanal(user))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}
