//! Aufraeumer – periodische Bereinigung verwaister KV-Eintraege
//!
//! Laeuft einmal pro Stunde und entfernt:
//! - Session-Eintraege ohne (oder mit negativer) TTL samt zugehoerigem
//!   `channel`- und `info`-Schluessel
//! - Sprecher-Leases deren Halter keine lebende Session mehr hat
//!
//! Jeder Durchlauf ist in den Backoff-Wrapper eingepackt; ein Redis-Ausfall
//! fuehrt zu Log-Zeilen, nie zum Abbruch der Schleife.

use std::time::Duration;

use redis::aio::ConnectionManager;
use sprechfunk_core::UserId;

use crate::backoff::mit_backoff;
use crate::error::KvResult;
use crate::schluessel;
use crate::store::KvStore;

/// Abstand zwischen zwei Aufraeum-Durchlaeufen
const DURCHLAUF_INTERVALL: Duration = Duration::from_secs(60 * 60);

/// Periodischer Bereiniger fuer Sessions und verwaiste Leases
pub struct Aufraeumer {
    kv: KvStore,
}

impl Aufraeumer {
    pub fn neu(kv: KvStore) -> Self {
        Self { kv }
    }

    /// Endlosschleife: stuendlicher Durchlauf, Fehler werden geloggt
    pub async fn ausfuehren(self) {
        let mut takt = tokio::time::interval(DURCHLAUF_INTERVALL);
        takt.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // Der erste Tick feuert sofort; den ueberspringen wir bewusst nicht,
        // ein Durchlauf direkt nach dem Start ist harmlos.
        loop {
            takt.tick().await;
            if let Err(e) = mit_backoff("sweeper_durchlauf", || self.durchlauf()).await {
                tracing::error!(fehler = %e, "Aufraeum-Durchlauf fehlgeschlagen");
            }
        }
    }

    /// Ein einzelner Bereinigungs-Durchlauf
    pub async fn durchlauf(&self) -> KvResult<()> {
        let mut conn = self.kv.verbindung();

        let mut sessions_entfernt = 0usize;
        for session_pfad in schluessel_sammeln(&mut conn, "user:*:session").await? {
            let ttl: i64 = redis::cmd("TTL")
                .arg(&session_pfad)
                .query_async(&mut conn)
                .await?;

            // -1: Schluessel ohne TTL (sollte nie vorkommen), -2: bereits weg
            if ttl < 0 {
                if let Some(user) = schluessel::user_id_aus_session_schluessel(&session_pfad) {
                    redis::pipe()
                        .del(schluessel::user_session(user))
                        .del(schluessel::user_kanal(user))
                        .del(schluessel::user_info(user))
                        .query_async::<_, ()>(&mut conn)
                        .await?;
                    sessions_entfernt += 1;
                }
            }
        }

        let mut leases_entfernt = 0usize;
        for sprecher_pfad in schluessel_sammeln(&mut conn, "channel:*:speaker").await? {
            let halter: Option<i64> = redis::cmd("GET")
                .arg(&sprecher_pfad)
                .query_async(&mut conn)
                .await?;

            if let Some(halter) = halter {
                let session: Option<String> = redis::cmd("GET")
                    .arg(schluessel::user_session(UserId(halter)))
                    .query_async(&mut conn)
                    .await?;

                if session.is_none() {
                    let _: () = redis::cmd("DEL")
                        .arg(&sprecher_pfad)
                        .query_async(&mut conn)
                        .await?;
                    leases_entfernt += 1;
                }
            }
        }

        if sessions_entfernt > 0 || leases_entfernt > 0 {
            tracing::info!(
                sessions = sessions_entfernt,
                leases = leases_entfernt,
                "Verwaiste KV-Eintraege bereinigt"
            );
        }
        Ok(())
    }
}

/// Sammelt alle Schluessel zu einem Muster via SCAN (nicht-blockierend)
async fn schluessel_sammeln(conn: &mut ConnectionManager, muster: &str) -> KvResult<Vec<String>> {
    let mut cursor: u64 = 0;
    let mut gefunden = Vec::new();

    loop {
        let (naechster, teil): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(muster)
            .arg("COUNT")
            .arg(100)
            .query_async(conn)
            .await?;

        gefunden.extend(teil);
        cursor = naechster;
        if cursor == 0 {
            break;
        }
    }

    Ok(gefunden)
}
