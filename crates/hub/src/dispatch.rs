//! Signal-Dispatch – verarbeitet dekodierte Frames einer Verbindung
//!
//! Die `Leitung` buendelt alles was die Lese-Pumpe zum Verarbeiten
//! braucht: die Verbindung selbst, das Nabe-Handle, Lease- und
//! Presence-Fassade und die Audio-Senke.
//!
//! Zustaendigkeiten:
//! - `ptt start` / `ptt stop` laufen gegen die Lease-Fassade, nicht
//!   durch die Nabe (nur die Benachrichtigungen gehen in den Fan-Out)
//! - `channel_change` wird als Ereignis an die Nabe gereicht
//! - Binaere Frames werden je nach Krypto-/Aufnahme-Zustand als
//!   Schluessel geparst, persistiert und verteilt, oder verworfen

use std::sync::Arc;

use sprechfunk_core::ChannelId;
use sprechfunk_kv::{LeaseStore, PresenceStore};
use sprechfunk_protocol::{SchluesselFrame, ServerNachricht, Signal};

use crate::audio::AudioSenke;
use crate::nabe::{HubHandle, KanalWechsel, Nachricht};
use crate::verbindung::{KryptoZustand, Verbindung};

/// Verarbeitungskontext einer Verbindung
pub struct Leitung<L, P> {
    pub verbindung: Arc<Verbindung>,
    pub hub: HubHandle,
    pub lease: L,
    pub presence: P,
    pub senke: Arc<AudioSenke>,
}

impl<L, P> Leitung<L, P>
where
    L: LeaseStore,
    P: PresenceStore,
{
    /// Verarbeitet einen Text-Frame.
    ///
    /// Dekodierfehler werden geloggt und uebersprungen – sie beenden
    /// die Verbindung nicht.
    pub async fn text_verarbeiten(&self, text: &str) {
        let signal = match Signal::dekodieren(text) {
            Ok(signal) => signal,
            Err(e) => {
                tracing::warn!(
                    verbindung = %self.verbindung.id,
                    fehler = %e,
                    "Ungueltiges Signal verworfen"
                );
                return;
            }
        };

        match signal {
            Signal::PttStart => self.ptt_start().await,
            Signal::PttStop => self.ptt_stop().await,
            Signal::ChannelChange { neuer_kanal } => self.kanal_wechsel(neuer_kanal),
            Signal::KeyExchange => {
                self.verbindung.krypto_setzen(KryptoZustand::Angeboten);
                tracing::debug!(verbindung = %self.verbindung.id, "Key-Exchange angeboten");
            }
            Signal::Unbekannt(typ) => {
                tracing::warn!(
                    verbindung = %self.verbindung.id,
                    typ = %typ,
                    "Unbekanntes Signal ignoriert"
                );
            }
        }
    }

    /// Verarbeitet einen binaeren Frame nach Verbindungszustand
    pub async fn binaer_verarbeiten(&self, daten: Vec<u8>) {
        if self.verbindung.krypto_zustand() == KryptoZustand::Angeboten {
            self.schluessel_frame(&daten).await;
            return;
        }

        if !self.verbindung.nimmt_auf() {
            tracing::debug!(
                verbindung = %self.verbindung.id,
                bytes = daten.len(),
                "Binaerer Frame ohne Aufnahme verworfen"
            );
            return;
        }

        // Persistenz ist Best-Effort; der Broadcast ist das SLO
        if let Some(utterance) = self.verbindung.aktuelle_utterance() {
            let verschluesselt = self.verbindung.verschluesselung_aktiv();
            if let Err(e) = self
                .senke
                .anhaengen(&utterance, &daten, verschluesselt)
                .await
            {
                tracing::error!(
                    utterance = %utterance,
                    fehler = %e,
                    "Audio-Persistenz fehlgeschlagen, Broadcast laeuft weiter"
                );
            }
        }

        self.hub
            .rundsenden(Nachricht {
                kanal: self.verbindung.kanal(),
                daten,
                absender: self.verbindung.id.clone(),
            })
            .await;
    }

    // -----------------------------------------------------------------------
    // Signal-Handler
    // -----------------------------------------------------------------------

    async fn ptt_start(&self) {
        if self.verbindung.nimmt_auf() {
            tracing::warn!(
                verbindung = %self.verbindung.id,
                "ptt start waehrend laufender Aufnahme ignoriert"
            );
            return;
        }

        let kanal = self.verbindung.kanal();
        match self.lease.uebernehmen(&kanal, self.verbindung.user_id).await {
            Ok(true) => {
                let utterance = self.verbindung.aufnahme_starten();
                tracing::info!(
                    verbindung = %self.verbindung.id,
                    user_id = %self.verbindung.user_id,
                    kanal = %kanal,
                    utterance = %utterance,
                    "Sprechrecht erworben"
                );

                self.hub
                    .rundsenden(Nachricht {
                        kanal: kanal.clone(),
                        daten: ServerNachricht::speaker_active(&kanal, self.verbindung.user_id)
                            .als_bytes(),
                        absender: self.verbindung.id.clone(),
                    })
                    .await;

                self.verbindung.selbst_senden(
                    ServerNachricht::PttStartConfirmed {
                        utterance_id: utterance,
                    }
                    .als_bytes(),
                );
            }
            Ok(false) => {
                let halter = match self.lease.halter(&kanal).await {
                    Ok(halter) => halter,
                    Err(e) => {
                        tracing::warn!(fehler = %e, "Lease-Halter nicht abfragbar");
                        None
                    }
                };
                self.verbindung.selbst_senden(
                    ServerNachricht::PttBusy {
                        current_speaker: halter.map(|h| h.inner()),
                    }
                    .als_bytes(),
                );
            }
            Err(e) => {
                tracing::warn!(
                    verbindung = %self.verbindung.id,
                    fehler = %e,
                    "Lease-Erwerb fehlgeschlagen"
                );
                self.verbindung.selbst_senden(
                    ServerNachricht::PttBusy {
                        current_speaker: None,
                    }
                    .als_bytes(),
                );
            }
        }
    }

    async fn ptt_stop(&self) {
        if !self.verbindung.nimmt_auf() {
            tracing::warn!(
                verbindung = %self.verbindung.id,
                "ptt stop ohne laufende Aufnahme ignoriert"
            );
            return;
        }

        let kanal = self.verbindung.kanal();
        if let Err(e) = self
            .lease
            .freigeben_wenn_halter(&kanal, self.verbindung.user_id)
            .await
        {
            tracing::warn!(fehler = %e, "Lease-Freigabe fehlgeschlagen");
        }

        self.verbindung.aufnahme_beenden();

        self.hub
            .rundsenden(Nachricht {
                kanal: kanal.clone(),
                daten: ServerNachricht::speaker_inactive(&kanal, self.verbindung.user_id)
                    .als_bytes(),
                absender: self.verbindung.id.clone(),
            })
            .await;

        self.verbindung
            .selbst_senden(ServerNachricht::PttStopConfirmed.als_bytes());
        self.verbindung.utterance_leeren();

        tracing::info!(
            verbindung = %self.verbindung.id,
            user_id = %self.verbindung.user_id,
            kanal = %kanal,
            "Sprechrecht freigegeben"
        );
    }

    fn kanal_wechsel(&self, neuer_kanal: ChannelId) {
        self.hub.kanal_wechsel_anfordern(KanalWechsel {
            verbindung: Arc::clone(&self.verbindung),
            neuer_kanal,
        });
    }

    /// Der binaere Frame direkt nach `key_exchange`: JSON mit dem
    /// oeffentlichen Schluessel. Parsfehler setzen den Zustand zurueck
    /// damit nachfolgende Audio-Frames nicht fehlinterpretiert werden.
    async fn schluessel_frame(&self, daten: &[u8]) {
        let frame = match SchluesselFrame::dekodieren(daten) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(
                    verbindung = %self.verbindung.id,
                    fehler = %e,
                    "Schluessel-Frame nicht parsbar, Key-Exchange abgebrochen"
                );
                self.verbindung.krypto_setzen(KryptoZustand::Aus);
                return;
            }
        };

        let kanal = ChannelId::neu(frame.channel_id.clone());
        if let Err(e) = self
            .presence
            .public_key_speichern(&kanal, frame.user_id.into(), &frame.public_key)
            .await
        {
            tracing::warn!(fehler = %e, "Schluessel konnte nicht hinterlegt werden");
        }

        self.verbindung.peer_public_key_setzen(frame.public_key.clone());
        self.verbindung.verschluesselung_einschalten();
        self.verbindung.krypto_setzen(KryptoZustand::Aktiv);

        self.hub
            .rundsenden(Nachricht {
                kanal: self.verbindung.kanal(),
                daten: ServerNachricht::KeyExchangeBroadcast {
                    channel_id: frame.channel_id,
                    user_id: frame.user_id,
                    public_key: frame.public_key,
                }
                .als_bytes(),
                absender: self.verbindung.id.clone(),
            })
            .await;

        tracing::info!(
            verbindung = %self.verbindung.id,
            user_id = %self.verbindung.user_id,
            "Key-Exchange abgeschlossen"
        );
    }
}
