//! sprechfunk-protocol – Wire-Format der /msg-Verbindung
//!
//! Definiert beide Richtungen des Signalprotokolls:
//! - Eingehend: Text-Frames als `{"type": ..., "payload": ...}` (tagged union)
//! - Ausgehend: flache JSON-Benachrichtigungen mit `type`-Feld
//!
//! Binaere Frames sind opake Audiodaten und laufen am Codec vorbei –
//! mit einer Ausnahme: im Key-Exchange-Fenster traegt genau ein binaerer
//! Frame ein JSON-Objekt mit dem oeffentlichen Schluessel.

pub mod signal;

pub use signal::{
    KanalWechselPayload, ProtokollFehler, SchluesselFrame, ServerNachricht, Signal,
};
