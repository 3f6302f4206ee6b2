//! sprechfunk-hub – Verbindungsnabe und /msg-Endpunkt
//!
//! Das Herz des Servers: eine Event-Schleife in einem einzigen Task
//! besitzt die Kanal-Topologie (`channel_id -> Verbindungen`) und
//! verarbeitet vier Ereignisarten: register, unregister, broadcast und
//! channel_change. Nur dieser Task veraendert die Topologie; alle
//! anderen lesen Momentaufnahmen unter einem kurzen Mutex.
//!
//! Um die Nabe herum: pro Verbindung eine Lese- und eine Schreib-Pumpe,
//! die Signal-Dispatch-Schicht und die Audio-Senke.

pub mod audio;
pub mod dispatch;
pub mod nabe;
pub mod pumpen;
pub mod verbindung;
pub mod ws;

#[cfg(test)]
pub(crate) mod testhilfe;

pub use audio::AudioSenke;
pub use nabe::{ConnectionHub, HubHandle, KanalWechsel, Nachricht};
pub use verbindung::{KryptoZustand, Verbindung, SENDE_QUEUE_GROESSE};
pub use ws::{msg_router, MsgZustand};
