//! Lese- und Schreib-Pumpe einer /msg-Verbindung
//!
//! Lese-Pumpe: ein Frame pro Schleifendurchlauf, 60-Sekunden-Frist die
//! jeder eingehende Frame (auch Pings) erneuert. Jeder Transportfehler
//! beendet die Verbindung; Dekodierfehler behandelt der Dispatch.
//!
//! Schreib-Pumpe: waehlt zwischen Sende-Queue, Herzschlag-Ticker und
//! dem Abbruch-Token der Nabe. Rahmung (Text vs. Binaer) richtet sich
//! danach ob die Nutzlast gueltiges JSON ist; anstehende Eintraege mit
//! gleicher Rahmung werden im selben Durchlauf mitgenommen.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use sprechfunk_kv::{LeaseStore, PresenceStore};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::dispatch::Leitung;

/// Maximale Groesse eines eingehenden Frames in Bytes
pub const MAX_FRAME_GROESSE: usize = 8192;
/// Lese-Frist: ohne Frame innerhalb dieser Zeit wird getrennt
pub const LESE_FRIST: Duration = Duration::from_secs(60);
/// Schreib-Frist pro Frame
pub const SCHREIB_FRIST: Duration = Duration::from_secs(20);
/// Herzschlag-Abstand (90% der Lese-Frist)
pub const HERZSCHLAG: Duration = Duration::from_secs(54);

/// Liest Frames bis zum ersten Transportfehler oder Fristablauf.
///
/// Der Aufrufer meldet die Verbindung danach bei der Nabe ab.
pub async fn lese_pumpe<L, P>(leitung: &Leitung<L, P>, mut empfaenger: SplitStream<WebSocket>)
where
    L: LeaseStore,
    P: PresenceStore,
{
    let verbindung_id = leitung.verbindung.id.clone();

    loop {
        let frame = match tokio::time::timeout(LESE_FRIST, empfaenger.next()).await {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(e))) => {
                tracing::warn!(verbindung = %verbindung_id, fehler = %e, "Lesefehler");
                break;
            }
            Ok(None) => {
                tracing::info!(verbindung = %verbindung_id, "Transport geschlossen");
                break;
            }
            Err(_) => {
                tracing::warn!(verbindung = %verbindung_id, "Lese-Frist ueberschritten");
                break;
            }
        };

        match frame {
            Message::Text(text) => leitung.text_verarbeiten(&text).await,
            Message::Binary(daten) => leitung.binaer_verarbeiten(daten).await,
            // Pings beantwortet axum selbst; beide erneuern die Frist
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => {
                tracing::info!(verbindung = %verbindung_id, "Close-Frame empfangen");
                break;
            }
        }
    }
}

/// Bedient die Sende-Queue bis zum Queue-Schliessen oder Sendefehler
pub async fn schreib_pumpe(
    mut sender: SplitSink<WebSocket, Message>,
    mut sende_rx: mpsc::Receiver<Vec<u8>>,
    rueckgabe_tx: mpsc::Sender<Vec<u8>>,
    abbruch: CancellationToken,
) {
    let mut herzschlag = tokio::time::interval_at(
        tokio::time::Instant::now() + HERZSCHLAG,
        HERZSCHLAG,
    );

    loop {
        tokio::select! {
            eintrag = sende_rx.recv() => {
                match eintrag {
                    Some(daten) => {
                        let als_text = ist_json(&daten);
                        if !senden_mit_frist(&mut sender, frame_bauen(daten, als_text)).await {
                            return;
                        }

                        // Anstehende Eintraege gleicher Rahmung mitnehmen
                        while let Ok(weitere) = sende_rx.try_recv() {
                            if ist_json(&weitere) == als_text {
                                if !senden_mit_frist(&mut sender, frame_bauen(weitere, als_text))
                                    .await
                                {
                                    return;
                                }
                            } else {
                                // Andere Rahmung: zurueck in die Queue wenn Platz
                                if rueckgabe_tx.try_send(weitere).is_err() {
                                    tracing::warn!("Rueckgabe in volle Queue – Frame verworfen");
                                }
                                break;
                            }
                        }
                    }
                    None => {
                        let _ = sender.send(Message::Close(None)).await;
                        return;
                    }
                }
            }

            _ = herzschlag.tick() => {
                if !senden_mit_frist(&mut sender, Message::Ping(Vec::new())).await {
                    tracing::debug!("Ping fehlgeschlagen, Schreib-Pumpe endet");
                    return;
                }
            }

            _ = abbruch.cancelled() => {
                // Die Nabe hat die Queue geschlossen
                let _ = sender.send(Message::Close(None)).await;
                return;
            }
        }
    }
}

/// Prueft ob die Nutzlast gueltiges JSON ist (entscheidet die Rahmung)
pub(crate) fn ist_json(daten: &[u8]) -> bool {
    serde_json::from_slice::<serde::de::IgnoredAny>(daten).is_ok()
}

fn frame_bauen(daten: Vec<u8>, als_text: bool) -> Message {
    if als_text {
        match String::from_utf8(daten) {
            Ok(text) => Message::Text(text),
            Err(e) => Message::Binary(e.into_bytes()),
        }
    } else {
        Message::Binary(daten)
    }
}

async fn senden_mit_frist(sender: &mut SplitSink<WebSocket, Message>, frame: Message) -> bool {
    match tokio::time::timeout(SCHREIB_FRIST, sender.send(frame)).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::debug!(fehler = %e, "Senden fehlgeschlagen");
            false
        }
        Err(_) => {
            tracing::warn!("Schreib-Frist ueberschritten");
            false
        }
    }
}
