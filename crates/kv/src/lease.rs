//! Sprecher-Lease – kanalweites exklusives Sprechrecht
//!
//! Die Lease ist der prozessuebergreifende Schiedsrichter: hoechstens ein
//! Benutzer pro Kanal kann `uebernehmen` erfolgreich abschliessen. Die
//! Atomizitaet kommt aus `SET NX EX`; die TTL raeumt Leases abgestuerzter
//! Halter automatisch ab.
//!
//! Auf dem Broadcast-Pfad wird die Lease nicht konsultiert – dort gilt
//! der lokale Aufnahme-Zustand der sendenden Verbindung.

use sprechfunk_core::{ChannelId, UserId};

use crate::error::KvResult;
use crate::schluessel;
use crate::store::KvStore;

/// Lebensdauer einer Sprecher-Lease in Sekunden
pub const LEASE_TTL_SEK: u64 = 30;

/// Fassade fuer die Sprecher-Lease eines Kanals
///
/// Als Trait geschnitten damit Hub- und Dispatch-Tests eine
/// In-Memory-Implementierung verwenden koennen.
#[allow(async_fn_in_trait)]
pub trait LeaseStore: Send + Sync {
    /// Versucht die Lease zu uebernehmen (atomar, mit TTL).
    /// Gibt `true` zurueck wenn dieser Aufrufer jetzt der Halter ist.
    async fn uebernehmen(&self, kanal: &ChannelId, user: UserId) -> KvResult<bool>;

    /// Gibt die Lease frei, aber nur wenn `user` der aktuelle Halter ist
    async fn freigeben_wenn_halter(&self, kanal: &ChannelId, user: UserId) -> KvResult<()>;

    /// Gibt den aktuellen Halter zurueck (None wenn frei)
    async fn halter(&self, kanal: &ChannelId) -> KvResult<Option<UserId>>;
}

/// Produktive Lease-Implementierung gegen Redis
#[derive(Clone)]
pub struct RedisLease {
    kv: KvStore,
}

impl RedisLease {
    pub fn neu(kv: KvStore) -> Self {
        Self { kv }
    }
}

impl LeaseStore for RedisLease {
    async fn uebernehmen(&self, kanal: &ChannelId, user: UserId) -> KvResult<bool> {
        let mut conn = self.kv.verbindung();
        // SET key value NX EX 30 – antwortet "OK" oder Nil
        let antwort: Option<String> = redis::cmd("SET")
            .arg(schluessel::kanal_sprecher(kanal))
            .arg(user.inner())
            .arg("NX")
            .arg("EX")
            .arg(LEASE_TTL_SEK)
            .query_async(&mut conn)
            .await?;

        let erworben = antwort.is_some();
        if erworben {
            tracing::debug!(kanal = %kanal, user_id = %user, "Sprecher-Lease uebernommen");
        }
        Ok(erworben)
    }

    async fn freigeben_wenn_halter(&self, kanal: &ChannelId, user: UserId) -> KvResult<()> {
        let mut conn = self.kv.verbindung();
        let pfad = schluessel::kanal_sprecher(kanal);

        // Halter lesen, nur bei Uebereinstimmung loeschen
        let aktuell: Option<i64> = redis::cmd("GET")
            .arg(&pfad)
            .query_async(&mut conn)
            .await?;

        match aktuell {
            Some(halter) if halter == user.inner() => {
                let _: () = redis::cmd("DEL").arg(&pfad).query_async(&mut conn).await?;
                tracing::debug!(kanal = %kanal, user_id = %user, "Sprecher-Lease freigegeben");
            }
            Some(anderer) => {
                tracing::debug!(
                    kanal = %kanal,
                    user_id = %user,
                    halter = anderer,
                    "Lease-Freigabe verweigert: anderer Halter"
                );
            }
            None => {
                // Bereits abgelaufen oder nie vergeben
            }
        }
        Ok(())
    }

    async fn halter(&self, kanal: &ChannelId) -> KvResult<Option<UserId>> {
        let mut conn = self.kv.verbindung();
        let wert: Option<i64> = redis::cmd("GET")
            .arg(schluessel::kanal_sprecher(kanal))
            .query_async(&mut conn)
            .await?;
        Ok(wert.map(UserId))
    }
}
