//! In-Memory-Implementierungen der KV-Traits fuer Tests
//!
//! Bilden die Semantik der Redis-Fassaden ohne externen Store nach:
//! die Lease ist atomar (Mutex), Presence fuehrt Buch ueber Sets und
//! Schluessel damit Tests den Endzustand pruefen koennen.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use sprechfunk_core::{ChannelId, ConnectionId, UserId};
use sprechfunk_kv::{KvResult, LeaseStore, PresenceStore};

/// Atomare In-Memory-Lease (ohne TTL; Ablauf wird explizit simuliert)
#[derive(Clone, Default)]
pub struct InMemoryLease {
    halter: Arc<Mutex<HashMap<ChannelId, UserId>>>,
}

impl InMemoryLease {
    /// Simuliert den TTL-Ablauf einer Lease (abgestuerzter Halter)
    pub fn ablauf_simulieren(&self, kanal: &ChannelId) {
        self.halter.lock().remove(kanal);
    }
}

impl LeaseStore for InMemoryLease {
    async fn uebernehmen(&self, kanal: &ChannelId, user: UserId) -> KvResult<bool> {
        let mut halter = self.halter.lock();
        if halter.contains_key(kanal) {
            Ok(false)
        } else {
            halter.insert(kanal.clone(), user);
            Ok(true)
        }
    }

    async fn freigeben_wenn_halter(&self, kanal: &ChannelId, user: UserId) -> KvResult<()> {
        let mut halter = self.halter.lock();
        if halter.get(kanal) == Some(&user) {
            halter.remove(kanal);
        }
        Ok(())
    }

    async fn halter(&self, kanal: &ChannelId) -> KvResult<Option<UserId>> {
        Ok(self.halter.lock().get(kanal).copied())
    }
}

/// Presence-Attrappe die alle Schreibvorgaenge nachvollziehbar speichert
#[derive(Clone, Default)]
pub struct InMemoryPresence {
    kanal_sets: Arc<Mutex<HashMap<String, HashSet<i64>>>>,
    sessions: Arc<Mutex<HashMap<i64, String>>>,
    kanaele: Arc<Mutex<HashMap<i64, String>>>,
    infos: Arc<Mutex<HashMap<i64, (String, String)>>>,
    schluessel: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryPresence {
    pub fn hat_session(&self, user_id: i64) -> bool {
        self.sessions.lock().contains_key(&user_id)
    }

    pub fn kanal_von(&self, user_id: i64) -> Option<String> {
        self.kanaele.lock().get(&user_id).cloned()
    }

    pub fn schluessel_von(&self, pfad: &str) -> Option<String> {
        self.schluessel.lock().get(pfad).cloned()
    }

    /// Sind alle Presence-Strukturen leer? (Rundlauf-Gesetz register/unregister)
    pub fn ist_leer(&self) -> bool {
        self.sessions.lock().is_empty()
            && self.kanaele.lock().is_empty()
            && self.kanal_sets.lock().values().all(|s| s.is_empty())
    }
}

impl PresenceStore for InMemoryPresence {
    async fn anmelden(
        &self,
        user: UserId,
        kanal: &ChannelId,
        verbindung: &ConnectionId,
    ) -> KvResult<()> {
        self.kanal_sets
            .lock()
            .entry(kanal.to_string())
            .or_default()
            .insert(user.inner());
        self.sessions
            .lock()
            .insert(user.inner(), verbindung.to_string());
        self.kanaele.lock().insert(user.inner(), kanal.to_string());
        Ok(())
    }

    async fn abmelden(&self, user: UserId, kanal: &ChannelId) -> KvResult<()> {
        self.sessions.lock().remove(&user.inner());
        self.kanaele.lock().remove(&user.inner());
        if let Some(set) = self.kanal_sets.lock().get_mut(kanal.as_str()) {
            set.remove(&user.inner());
        }
        Ok(())
    }

    async fn kanal_wechseln(
        &self,
        user: UserId,
        alt: &ChannelId,
        neu: &ChannelId,
    ) -> KvResult<()> {
        let mut sets = self.kanal_sets.lock();
        if let Some(set) = sets.get_mut(alt.as_str()) {
            set.remove(&user.inner());
        }
        sets.entry(neu.to_string()).or_default().insert(user.inner());
        drop(sets);
        self.kanaele.lock().insert(user.inner(), neu.to_string());
        Ok(())
    }

    async fn kanal_set_loeschen(&self, kanal: &ChannelId) -> KvResult<()> {
        self.kanal_sets.lock().remove(kanal.as_str());
        Ok(())
    }

    async fn info_setzen(&self, user: UserId, username: &str, email: &str) -> KvResult<()> {
        self.infos
            .lock()
            .insert(user.inner(), (username.to_string(), email.to_string()));
        Ok(())
    }

    async fn public_key_speichern(
        &self,
        kanal: &ChannelId,
        user: UserId,
        public_key: &str,
    ) -> KvResult<()> {
        self.schluessel.lock().insert(
            format!("channel:{}:keys:{}", kanal, user),
            public_key.to_string(),
        );
        Ok(())
    }

    async fn session_loeschen(&self, user: UserId) -> KvResult<()> {
        self.sessions.lock().remove(&user.inner());
        self.kanaele.lock().remove(&user.inner());
        Ok(())
    }
}
