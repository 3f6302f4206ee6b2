//! Verbindungs-Zustand – eine authentifizierte, aufgewertete Transportverbindung
//!
//! ## State Machine
//! ```text
//!       register               aufnahme=false          unregister
//! start ────────► AKTIV ─────────────────────────────────► ENDE
//!                   │ ptt start (Lease)     ▲
//!                   ▼                       │ ptt stop
//!                AUFNAHME ──────────────────┘
//! ```
//!
//! Der Kanalwechsel ist orthogonal zu AKTIV/AUFNAHME; die Nabe gibt beim
//! Wechsel eine gehaltene Lease frei.
//!
//! Die Sende-Queue wird genau einmal "geschlossen": ein AtomicBool
//! bewacht das Cancellation-Token auf dem die Schreib-Pumpe wartet.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use sprechfunk_core::{ChannelId, ConnectionId, UserId};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Kapazitaet der Sende-Queue pro Verbindung
pub const SENDE_QUEUE_GROESSE: usize = 256;

/// Zustand des Key-Exchange pro Verbindung
///
/// In `Angeboten` wird genau der naechste binaere Frame als
/// JSON-Schluessel interpretiert statt als Audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KryptoZustand {
    Aus,
    Angeboten,
    Aktiv,
}

/// Eine authentifizierte Verbindung mit ihrem veraenderlichen Zustand
///
/// Wird als `Arc` zwischen Nabe, Lese- und Schreib-Pumpe geteilt.
/// Den Kanal wechselt ausschliesslich die Nabe.
pub struct Verbindung {
    /// Stabile ID fuer die Prozess-Lebensdauer
    pub id: ConnectionId,
    pub user_id: UserId,
    kanal: Mutex<ChannelId>,
    /// Sende-Seite der Queue (Nabe und Selbst-Antworten)
    pub sende_tx: mpsc::Sender<Vec<u8>>,
    abbruch: CancellationToken,
    queue_zu: AtomicBool,
    aufnahme: AtomicBool,
    utterance: Mutex<Option<String>>,
    krypto: Mutex<KryptoZustand>,
    verschluesselung_aktiv: AtomicBool,
    peer_public_key: Mutex<Option<String>>,
    /// (Sekunde, Laufnummer) der letzten Utterance-Praegung
    letzte_utterance: Mutex<(i64, u32)>,
}

impl Verbindung {
    /// Erstellt eine neue Verbindung samt Empfangs-Queue fuer die
    /// Schreib-Pumpe
    pub fn neu(user_id: UserId, kanal: ChannelId) -> (Arc<Self>, mpsc::Receiver<Vec<u8>>) {
        let (sende_tx, sende_rx) = mpsc::channel(SENDE_QUEUE_GROESSE);
        let verbindung = Arc::new(Self {
            id: ConnectionId::neu(),
            user_id,
            kanal: Mutex::new(kanal),
            sende_tx,
            abbruch: CancellationToken::new(),
            queue_zu: AtomicBool::new(false),
            aufnahme: AtomicBool::new(false),
            utterance: Mutex::new(None),
            krypto: Mutex::new(KryptoZustand::Aus),
            verschluesselung_aktiv: AtomicBool::new(false),
            peer_public_key: Mutex::new(None),
            letzte_utterance: Mutex::new((0, 0)),
        });
        (verbindung, sende_rx)
    }

    /// Gibt den aktuellen Kanal zurueck (Momentaufnahme)
    pub fn kanal(&self) -> ChannelId {
        self.kanal.lock().clone()
    }

    /// Setzt den Kanal – nur die Nabe ruft das auf
    pub(crate) fn kanal_setzen(&self, neu: ChannelId) {
        *self.kanal.lock() = neu;
    }

    /// Schliesst die Sende-Queue genau einmal.
    ///
    /// Gibt `true` zurueck wenn dieser Aufruf das Schliessen ausgeloest hat.
    pub fn queue_schliessen(&self) -> bool {
        if self.queue_zu.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.abbruch.cancel();
        true
    }

    /// Token auf dem die Schreib-Pumpe das Queue-Schliessen beobachtet
    pub fn abbruch_signal(&self) -> CancellationToken {
        self.abbruch.clone()
    }

    /// Nimmt diese Verbindung gerade auf?
    pub fn nimmt_auf(&self) -> bool {
        self.aufnahme.load(Ordering::SeqCst)
    }

    /// Startet eine Aufnahme und praegt die Utterance-ID.
    ///
    /// Format `<user_id>-<unix_ts>`; praegt dieselbe Verbindung zweimal in
    /// derselben Sekunde, wird eine Laufnummer angehaengt.
    pub fn aufnahme_starten(&self) -> String {
        let id = self.utterance_praegen();
        *self.utterance.lock() = Some(id.clone());
        self.aufnahme.store(true, Ordering::SeqCst);
        id
    }

    /// Beendet die Aufnahme. Gibt `true` zurueck wenn zuvor aufgenommen wurde.
    pub fn aufnahme_beenden(&self) -> bool {
        self.aufnahme.swap(false, Ordering::SeqCst)
    }

    /// Aktuelle Utterance-ID (None wenn keine Aufnahme laeuft)
    pub fn aktuelle_utterance(&self) -> Option<String> {
        self.utterance.lock().clone()
    }

    pub fn utterance_leeren(&self) {
        *self.utterance.lock() = None;
    }

    pub fn krypto_zustand(&self) -> KryptoZustand {
        *self.krypto.lock()
    }

    pub fn krypto_setzen(&self, zustand: KryptoZustand) {
        *self.krypto.lock() = zustand;
    }

    pub fn verschluesselung_aktiv(&self) -> bool {
        self.verschluesselung_aktiv.load(Ordering::SeqCst)
    }

    pub fn verschluesselung_einschalten(&self) {
        self.verschluesselung_aktiv.store(true, Ordering::SeqCst);
    }

    pub fn peer_public_key_setzen(&self, key: String) {
        *self.peer_public_key.lock() = Some(key);
    }

    pub fn peer_public_key(&self) -> Option<String> {
        self.peer_public_key.lock().clone()
    }

    /// Legt eine Nachricht nicht-blockierend in die eigene Sende-Queue
    /// (Bestaetigungen, ptt_busy usw.)
    pub fn selbst_senden(&self, daten: Vec<u8>) {
        match self.sende_tx.try_send(daten) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(verbindung = %self.id, "Eigene Sende-Queue voll – Antwort verworfen");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(verbindung = %self.id, "Sende-Queue geschlossen");
            }
        }
    }

    fn utterance_praegen(&self) -> String {
        let jetzt = Utc::now().timestamp();
        let mut letzte = self.letzte_utterance.lock();
        if letzte.0 == jetzt {
            letzte.1 += 1;
            format!("{}-{}-{}", self.user_id, jetzt, letzte.1)
        } else {
            *letzte = (jetzt, 0);
            format!("{}-{}", self.user_id, jetzt)
        }
    }
}
