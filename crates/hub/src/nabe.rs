//! Verbindungsnabe – die Event-Schleife mit Alleinbesitz der Topologie
//!
//! Genau ein Task fuehrt `ausfuehren` aus und waehlt ueber vier
//! Eingangs-Queues: register, unregister, broadcast, channel_change.
//! Nur dieser Task schreibt die Kanal-Topologie; Hilfsabfragen lesen
//! Momentaufnahmen unter dem Mutex.
//!
//! Langsame Empfaenger (volle Sende-Queue) werden beim Broadcast
//! entfernt, damit ein blockierter Client die Schleife nicht aufhaelt.
//! Ausfaelle des Key-Value-Stores degradieren zu Log-Zeilen – die
//! lokale Topologie bleibt fuer den Fan-Out massgeblich.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sprechfunk_core::{ChannelId, ConnectionId};
use sprechfunk_kv::{KvResult, LeaseStore, PresenceStore};
use tokio::sync::mpsc;

use crate::verbindung::Verbindung;

/// Kapazitaet der Lebenszyklus-Queues (register/unregister/channel_change)
const EREIGNIS_QUEUE_GROESSE: usize = 256;
/// Kapazitaet der Broadcast-Queue
const BROADCAST_QUEUE_GROESSE: usize = 1024;
/// Frist fuer KV-Aufrufe aus der Nabe heraus
const KV_FRIST: Duration = Duration::from_secs(5);

/// Nachrichtenumschlag fuer den Fan-Out
///
/// Entsteht auf der Lese-Seite, wird genau einmal vom Broadcast-Ereignis
/// der Nabe konsumiert.
#[derive(Debug)]
pub struct Nachricht {
    pub kanal: ChannelId,
    pub daten: Vec<u8>,
    pub absender: ConnectionId,
}

/// Kanalwechsel-Anforderung
pub struct KanalWechsel {
    pub verbindung: Arc<Verbindung>,
    pub neuer_kanal: ChannelId,
}

type Topologie = HashMap<ChannelId, HashMap<ConnectionId, Arc<Verbindung>>>;

/// Handle auf die Nabe: Ereignisse einreihen, Topologie-Momentaufnahmen lesen
#[derive(Clone)]
pub struct HubHandle {
    register_tx: mpsc::Sender<Arc<Verbindung>>,
    unregister_tx: mpsc::Sender<Arc<Verbindung>>,
    broadcast_tx: mpsc::Sender<Nachricht>,
    wechsel_tx: mpsc::Sender<KanalWechsel>,
    topologie: Arc<Mutex<Topologie>>,
}

impl HubHandle {
    /// Reiht eine neue Verbindung zur Registrierung ein
    pub async fn registrieren(&self, verbindung: Arc<Verbindung>) {
        if self.register_tx.send(verbindung).await.is_err() {
            tracing::error!("Nabe nicht erreichbar: register verworfen");
        }
    }

    /// Reiht eine Verbindung zur Abmeldung ein
    pub async fn abmelden(&self, verbindung: Arc<Verbindung>) {
        if self.unregister_tx.send(verbindung).await.is_err() {
            tracing::error!("Nabe nicht erreichbar: unregister verworfen");
        }
    }

    /// Reiht eine Nachricht fuer den Fan-Out ein
    pub async fn rundsenden(&self, nachricht: Nachricht) {
        if self.broadcast_tx.send(nachricht).await.is_err() {
            tracing::error!("Nabe nicht erreichbar: broadcast verworfen");
        }
    }

    /// Fordert einen Kanalwechsel an – nicht-blockierend, bei voller
    /// Queue wird die Anforderung mit Log-Zeile verworfen
    pub fn kanal_wechsel_anfordern(&self, wechsel: KanalWechsel) {
        match self.wechsel_tx.try_send(wechsel) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(w)) => {
                tracing::warn!(
                    verbindung = %w.verbindung.id,
                    neuer_kanal = %w.neuer_kanal,
                    "Wechsel-Queue voll – Kanalwechsel verworfen"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::error!("Nabe nicht erreichbar: Kanalwechsel verworfen");
            }
        }
    }

    /// Momentaufnahme der Verbindungs-IDs eines Kanals (Hilfsabfrage)
    pub fn mitglieder(&self, kanal: &ChannelId) -> Vec<ConnectionId> {
        self.topologie
            .lock()
            .get(kanal)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Anzahl der aktiven Kanaele (Hilfsabfrage)
    pub fn kanal_anzahl(&self) -> usize {
        self.topologie.lock().len()
    }
}

/// Die Verbindungsnabe – Alleinbesitzerin der Kanal-Topologie
pub struct ConnectionHub<L, P> {
    topologie: Arc<Mutex<Topologie>>,
    lease: L,
    presence: P,
    register_rx: mpsc::Receiver<Arc<Verbindung>>,
    unregister_rx: mpsc::Receiver<Arc<Verbindung>>,
    broadcast_rx: mpsc::Receiver<Nachricht>,
    wechsel_rx: mpsc::Receiver<KanalWechsel>,
}

impl<L, P> ConnectionHub<L, P>
where
    L: LeaseStore,
    P: PresenceStore,
{
    /// Erstellt Nabe und Handle
    pub fn neu(lease: L, presence: P) -> (Self, HubHandle) {
        let (register_tx, register_rx) = mpsc::channel(EREIGNIS_QUEUE_GROESSE);
        let (unregister_tx, unregister_rx) = mpsc::channel(EREIGNIS_QUEUE_GROESSE);
        let (broadcast_tx, broadcast_rx) = mpsc::channel(BROADCAST_QUEUE_GROESSE);
        let (wechsel_tx, wechsel_rx) = mpsc::channel(EREIGNIS_QUEUE_GROESSE);
        let topologie = Arc::new(Mutex::new(Topologie::new()));

        let handle = HubHandle {
            register_tx,
            unregister_tx,
            broadcast_tx,
            wechsel_tx,
            topologie: Arc::clone(&topologie),
        };

        let nabe = Self {
            topologie,
            lease,
            presence,
            register_rx,
            unregister_rx,
            broadcast_rx,
            wechsel_rx,
        };

        (nabe, handle)
    }

    /// Die Event-Schleife. Laeuft bis alle Handles fallengelassen wurden.
    pub async fn ausfuehren(mut self) {
        tracing::info!("Nabe gestartet");
        loop {
            tokio::select! {
                Some(verbindung) = self.register_rx.recv() => {
                    self.verbindung_registrieren(verbindung).await;
                }
                Some(verbindung) = self.unregister_rx.recv() => {
                    self.verbindung_abmelden(verbindung).await;
                }
                Some(nachricht) = self.broadcast_rx.recv() => {
                    self.rundsenden(nachricht);
                }
                Some(wechsel) = self.wechsel_rx.recv() => {
                    self.kanal_wechseln(wechsel).await;
                }
                else => break,
            }
        }
        tracing::info!("Nabe beendet");
    }

    // -----------------------------------------------------------------------
    // Ereignis-Handler (nur aus der Schleife aufgerufen)
    // -----------------------------------------------------------------------

    async fn verbindung_registrieren(&self, verbindung: Arc<Verbindung>) {
        let kanal = verbindung.kanal();
        {
            let mut topo = self.topologie.lock();
            topo.entry(kanal.clone())
                .or_default()
                .insert(verbindung.id.clone(), Arc::clone(&verbindung));
        }

        tracing::info!(
            verbindung = %verbindung.id,
            user_id = %verbindung.user_id,
            kanal = %kanal,
            "Verbindung registriert"
        );

        kv_mit_frist(
            "presence_anmelden",
            self.presence
                .anmelden(verbindung.user_id, &kanal, &verbindung.id),
        )
        .await;
    }

    async fn verbindung_abmelden(&self, verbindung: Arc<Verbindung>) {
        let kanal = verbindung.kanal();
        let kanal_leer = {
            let mut topo = self.topologie.lock();
            match topo.get_mut(&kanal) {
                Some(mitglieder) => {
                    mitglieder.remove(&verbindung.id);
                    if mitglieder.is_empty() {
                        topo.remove(&kanal);
                        true
                    } else {
                        false
                    }
                }
                // Bucket bereits weg (z.B. nach Eviction): lokal leer
                None => true,
            }
        };

        verbindung.queue_schliessen();

        if verbindung.aufnahme_beenden() {
            kv_mit_frist(
                "lease_freigabe",
                self.lease
                    .freigeben_wenn_halter(&kanal, verbindung.user_id),
            )
            .await;
            verbindung.utterance_leeren();
        }

        kv_mit_frist(
            "presence_abmelden",
            self.presence.abmelden(verbindung.user_id, &kanal),
        )
        .await;

        if kanal_leer {
            kv_mit_frist(
                "kanal_set_loeschen",
                self.presence.kanal_set_loeschen(&kanal),
            )
            .await;
        }

        tracing::info!(
            verbindung = %verbindung.id,
            user_id = %verbindung.user_id,
            kanal = %kanal,
            "Verbindung abgemeldet"
        );
    }

    /// Fan-Out an alle Kanalmitglieder ausser dem Absender.
    ///
    /// Volle Sende-Queues gelten als langsame Empfaenger: Queue schliessen,
    /// aus dem Bucket entfernen. Der Absender wird nie blockiert.
    fn rundsenden(&self, nachricht: Nachricht) {
        let mitglieder: Vec<Arc<Verbindung>> = {
            let topo = self.topologie.lock();
            match topo.get(&nachricht.kanal) {
                Some(m) => m.values().cloned().collect(),
                None => return,
            }
        };

        let mut langsame: Vec<Arc<Verbindung>> = Vec::new();
        for mitglied in &mitglieder {
            if mitglied.id == nachricht.absender {
                continue;
            }
            match mitglied.sende_tx.try_send(nachricht.daten.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        verbindung = %mitglied.id,
                        kanal = %nachricht.kanal,
                        "Sende-Queue voll – langsamer Empfaenger wird entfernt"
                    );
                    mitglied.queue_schliessen();
                    langsame.push(Arc::clone(mitglied));
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::debug!(verbindung = %mitglied.id, "Sende-Queue bereits geschlossen");
                }
            }
        }

        if !langsame.is_empty() {
            let mut topo = self.topologie.lock();
            if let Some(m) = topo.get_mut(&nachricht.kanal) {
                for langsamer in &langsame {
                    m.remove(&langsamer.id);
                }
                if m.is_empty() {
                    topo.remove(&nachricht.kanal);
                }
            }
        }
    }

    async fn kanal_wechseln(&self, wechsel: KanalWechsel) {
        let verbindung = wechsel.verbindung;
        let neu = wechsel.neuer_kanal;
        let alt = verbindung.kanal();

        if alt == neu {
            tracing::debug!(verbindung = %verbindung.id, kanal = %alt, "Wechsel in denselben Kanal");
            return;
        }

        let alt_leer = {
            let mut topo = self.topologie.lock();
            let leer = match topo.get_mut(&alt) {
                Some(mitglieder) => {
                    mitglieder.remove(&verbindung.id);
                    if mitglieder.is_empty() {
                        topo.remove(&alt);
                        true
                    } else {
                        false
                    }
                }
                None => true,
            };

            verbindung.kanal_setzen(neu.clone());
            topo.entry(neu.clone())
                .or_default()
                .insert(verbindung.id.clone(), Arc::clone(&verbindung));
            leer
        };

        // Jeder Austritt gibt eine gehaltene Lease frei – auch der Wechsel
        if verbindung.aufnahme_beenden() {
            kv_mit_frist(
                "lease_freigabe",
                self.lease
                    .freigeben_wenn_halter(&alt, verbindung.user_id),
            )
            .await;
            verbindung.utterance_leeren();
        }

        kv_mit_frist(
            "presence_kanal_wechseln",
            self.presence.kanal_wechseln(verbindung.user_id, &alt, &neu),
        )
        .await;

        if alt_leer {
            kv_mit_frist("kanal_set_loeschen", self.presence.kanal_set_loeschen(&alt)).await;
        }

        tracing::info!(
            verbindung = %verbindung.id,
            user_id = %verbindung.user_id,
            von = %alt,
            nach = %neu,
            "Kanal gewechselt"
        );
    }
}

/// Fuehrt eine KV-Operation mit Frist aus; Fehler werden geloggt,
/// nie propagiert – die Nabe darf an Store-Ausfaellen nicht haengen.
async fn kv_mit_frist<T>(was: &str, operation: impl Future<Output = KvResult<T>>) -> Option<T> {
    match tokio::time::timeout(KV_FRIST, operation).await {
        Ok(Ok(wert)) => Some(wert),
        Ok(Err(e)) => {
            tracing::warn!(operation = was, fehler = %e, "KV-Operation fehlgeschlagen");
            None
        }
        Err(_) => {
            tracing::warn!(operation = was, "KV-Operation: Frist ueberschritten");
            None
        }
    }
}
