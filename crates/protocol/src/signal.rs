//! Signal-Codec – Steuerungsnachrichten auf der /msg-Verbindung
//!
//! Eingehende Text-Frames sind JSON-Objekte `{"type": string, "payload": ...}`.
//! Unbekannte Typen werden nicht als Fehler behandelt sondern als
//! `Signal::Unbekannt` durchgereicht (Logging entscheidet der Aufrufer).
//!
//! Ausgehende Nachrichten sind flach serialisiert (`type` plus Felder auf
//! oberster Ebene), so wie die Clients sie erwarten.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sprechfunk_core::{ChannelId, UserId};
use thiserror::Error;

/// Fehler beim Dekodieren von Signalen
#[derive(Debug, Error)]
pub enum ProtokollFehler {
    #[error("Ungueltiges JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Signal '{0}' ohne erforderliches Payload")]
    PayloadFehlt(String),

    #[error("channel_change mit leerer new_channel_id")]
    LeererKanal,
}

// ---------------------------------------------------------------------------
// Eingehende Signale (Client -> Server)
// ---------------------------------------------------------------------------

/// Rohform eines eingehenden Signals, wie es auf dem Draht liegt
#[derive(Debug, Deserialize)]
struct RohSignal {
    #[serde(rename = "type")]
    typ: String,
    #[serde(default)]
    payload: Option<Value>,
}

/// Payload des `channel_change`-Signals
#[derive(Debug, Clone, Deserialize)]
pub struct KanalWechselPayload {
    pub new_channel_id: String,
}

/// Dekodiertes eingehendes Signal
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// "ptt start" – Sprecher-Lease anfordern
    PttStart,
    /// "ptt stop" – Lease freigeben, Utterance beenden
    PttStop,
    /// "channel_change" – Kanalwechsel anfordern
    ChannelChange { neuer_kanal: ChannelId },
    /// "key_exchange" – der naechste binaere Frame traegt einen Schluessel
    KeyExchange,
    /// Unbekannter Typ – wird geloggt und ignoriert
    Unbekannt(String),
}

impl Signal {
    /// Dekodiert einen Text-Frame zu einem Signal.
    ///
    /// Protokollfehler (kaputtes JSON, fehlendes Pflicht-Payload) geben
    /// `Err` zurueck; unbekannte Typen sind kein Fehler.
    pub fn dekodieren(text: &str) -> Result<Signal, ProtokollFehler> {
        let roh: RohSignal = serde_json::from_str(text)?;

        match roh.typ.as_str() {
            "ptt start" => Ok(Signal::PttStart),
            "ptt stop" => Ok(Signal::PttStop),
            "channel_change" => {
                let payload = roh
                    .payload
                    .ok_or_else(|| ProtokollFehler::PayloadFehlt(roh.typ.clone()))?;
                let wechsel: KanalWechselPayload = serde_json::from_value(payload)?;
                if wechsel.new_channel_id.is_empty() {
                    return Err(ProtokollFehler::LeererKanal);
                }
                Ok(Signal::ChannelChange {
                    neuer_kanal: ChannelId::neu(wechsel.new_channel_id),
                })
            }
            "key_exchange" => Ok(Signal::KeyExchange),
            _ => Ok(Signal::Unbekannt(roh.typ)),
        }
    }
}

// ---------------------------------------------------------------------------
// Key-Exchange-Frame (binaer, aber JSON-kodiert)
// ---------------------------------------------------------------------------

/// Inhalt des binaeren Frames der auf ein `key_exchange`-Signal folgt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchluesselFrame {
    pub channel_id: String,
    pub public_key: String,
    pub user_id: i64,
}

impl SchluesselFrame {
    /// Parst den Frame aus rohen Bytes
    pub fn dekodieren(daten: &[u8]) -> Result<Self, ProtokollFehler> {
        Ok(serde_json::from_slice(daten)?)
    }
}

// ---------------------------------------------------------------------------
// Ausgehende Nachrichten (Server -> Client)
// ---------------------------------------------------------------------------

/// Benachrichtigungen die der Server als Text-Frames verschickt
///
/// Flache Serialisierung: das `type`-Feld liegt neben den Nutzdaten,
/// nicht in einem payload-Umschlag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerNachricht {
    /// Ein Teilnehmer hat das Sprechrecht erworben
    SpeakerActive { channel_id: String, user_id: i64 },
    /// Das Sprechrecht wurde freigegeben
    SpeakerInactive { channel_id: String, user_id: i64 },
    /// Bestaetigung an den neuen Sprecher selbst
    PttStartConfirmed { utterance_id: String },
    /// Bestaetigung des Sprech-Endes an den Sprecher selbst
    PttStopConfirmed,
    /// Lease bereits vergeben; traegt den aktuellen Halter falls bekannt
    PttBusy { current_speaker: Option<i64> },
    /// Ein Teilnehmer hat seinen oeffentlichen Schluessel verteilt
    KeyExchangeBroadcast {
        channel_id: String,
        user_id: i64,
        public_key: String,
    },
}

impl ServerNachricht {
    /// Serialisiert die Nachricht als JSON-Bytes fuer die Sende-Queue
    pub fn als_bytes(&self) -> Vec<u8> {
        // Serialisierung der eigenen Enum-Varianten kann nicht fehlschlagen
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn speaker_active(kanal: &ChannelId, user: UserId) -> Self {
        Self::SpeakerActive {
            channel_id: kanal.to_string(),
            user_id: user.inner(),
        }
    }

    pub fn speaker_inactive(kanal: &ChannelId, user: UserId) -> Self {
        Self::SpeakerInactive {
            channel_id: kanal.to_string(),
            user_id: user.inner(),
        }
    }
}
