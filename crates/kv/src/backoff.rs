//! Wiederholung mit exponentiellem Backoff
//!
//! Fuer Best-Effort-Operationen ausserhalb des heissen Pfads (Sweeper,
//! Health-Check). Startet bei 10 ms, verdoppelt bis maximal 512 ms,
//! hoechstens 3 Wiederholungen.

use std::future::Future;
use std::time::Duration;

use crate::error::KvResult;

/// Startwartezeit vor der ersten Wiederholung
const BACKOFF_START: Duration = Duration::from_millis(10);
/// Obergrenze der Wartezeit
const BACKOFF_MAX: Duration = Duration::from_millis(512);
/// Maximale Anzahl Wiederholungen nach dem ersten Versuch
const MAX_WIEDERHOLUNGEN: u32 = 3;

/// Fuehrt `operation` aus und wiederholt sie bei Fehlern mit Backoff.
///
/// Gibt den letzten Fehler zurueck wenn alle Versuche scheitern.
pub async fn mit_backoff<F, Fut, T>(beschreibung: &str, mut operation: F) -> KvResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = KvResult<T>>,
{
    let mut wartezeit = BACKOFF_START;
    let mut versuch = 0u32;

    loop {
        match operation().await {
            Ok(wert) => return Ok(wert),
            Err(e) if versuch < MAX_WIEDERHOLUNGEN => {
                versuch += 1;
                tracing::warn!(
                    operation = beschreibung,
                    versuch,
                    wartezeit_ms = wartezeit.as_millis() as u64,
                    fehler = %e,
                    "KV-Operation fehlgeschlagen, Wiederholung"
                );
                tokio::time::sleep(wartezeit).await;
                wartezeit = (wartezeit * 2).min(BACKOFF_MAX);
            }
            Err(e) => {
                tracing::error!(
                    operation = beschreibung,
                    versuche = versuch + 1,
                    fehler = %e,
                    "KV-Operation endgueltig fehlgeschlagen"
                );
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KvError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn erfolg_beim_ersten_versuch() {
        let aufrufe = AtomicU32::new(0);
        let ergebnis = mit_backoff("test", || {
            aufrufe.fetch_add(1, Ordering::SeqCst);
            async { Ok(42u32) }
        })
        .await;

        assert_eq!(ergebnis.unwrap(), 42);
        assert_eq!(aufrufe.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn erfolg_nach_zwei_fehlschlaegen() {
        let aufrufe = AtomicU32::new(0);
        let ergebnis = mit_backoff("test", || {
            let n = aufrufe.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(KvError::intern("noch nicht"))
                } else {
                    Ok("fertig")
                }
            }
        })
        .await;

        assert_eq!(ergebnis.unwrap(), "fertig");
        assert_eq!(aufrufe.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gibt_nach_drei_wiederholungen_auf() {
        let aufrufe = AtomicU32::new(0);
        let ergebnis: KvResult<()> = mit_backoff("test", || {
            aufrufe.fetch_add(1, Ordering::SeqCst);
            async { Err(KvError::intern("dauerhaft kaputt")) }
        })
        .await;

        assert!(ergebnis.is_err());
        // 1 Erstversuch + 3 Wiederholungen
        assert_eq!(aufrufe.load(Ordering::SeqCst), 4);
    }
}
