//! Rate Limiter fuer die Auth-Endpunkte
//!
//! Gleitendes Fenster pro Client-Adresse: hoechstens 5 Versuche pro
//! Minute. Aeltere Zeitstempel fallen beim naechsten Zugriff aus dem
//! Fenster; leere Eintraege raeumt der Wartungslauf ab.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Standardlimit: 5 Versuche pro Minute
const STANDARD_LIMIT: usize = 5;
const STANDARD_FENSTER: Duration = Duration::from_secs(60);

/// Rate Limiter mit gleitendem Fenster pro Client-Adresse
pub struct AnmeldeRateLimiter {
    limit: usize,
    fenster: Duration,
    anfragen: Mutex<HashMap<String, Vec<Instant>>>,
}

impl AnmeldeRateLimiter {
    pub fn neu() -> Self {
        Self::mit_limit(STANDARD_LIMIT, STANDARD_FENSTER)
    }

    /// Konstruktor mit frei waehlbarem Limit und Fenster (Tests)
    pub fn mit_limit(limit: usize, fenster: Duration) -> Self {
        Self {
            limit,
            fenster,
            anfragen: Mutex::new(HashMap::new()),
        }
    }

    /// Prueft ob ein weiterer Versuch fuer diese Adresse erlaubt ist
    /// und zaehlt ihn gegebenenfalls mit.
    pub fn erlaubt(&self, adresse: &str) -> bool {
        let jetzt = Instant::now();
        let mut anfragen = self.anfragen.lock();

        let eintraege = anfragen.entry(adresse.to_string()).or_default();
        eintraege.retain(|t| jetzt.duration_since(*t) < self.fenster);

        if eintraege.len() >= self.limit {
            return false;
        }

        eintraege.push(jetzt);
        true
    }

    /// Entfernt Adressen ohne Versuche im aktuellen Fenster
    pub fn aufraeumen(&self) {
        let jetzt = Instant::now();
        let mut anfragen = self.anfragen.lock();

        anfragen.retain(|_, eintraege| {
            eintraege.retain(|t| jetzt.duration_since(*t) < self.fenster);
            !eintraege.is_empty()
        });
    }
}

impl Default for AnmeldeRateLimiter {
    fn default() -> Self {
        Self::neu()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erlaubt_bis_zum_limit() {
        let limiter = AnmeldeRateLimiter::neu();
        for i in 0..5 {
            assert!(limiter.erlaubt("10.0.0.1"), "Versuch {i} sollte erlaubt sein");
        }
        assert!(!limiter.erlaubt("10.0.0.1"), "6. Versuch muss abgelehnt werden");
    }

    #[test]
    fn adressen_sind_unabhaengig() {
        let limiter = AnmeldeRateLimiter::mit_limit(1, Duration::from_secs(60));
        assert!(limiter.erlaubt("192.168.1.1"));
        assert!(limiter.erlaubt("192.168.1.2"));
        assert!(!limiter.erlaubt("192.168.1.1"));
    }

    #[test]
    fn fenster_laeuft_ab() {
        let limiter = AnmeldeRateLimiter::mit_limit(1, Duration::from_millis(20));
        assert!(limiter.erlaubt("a"));
        assert!(!limiter.erlaubt("a"));

        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.erlaubt("a"), "Nach Fensterablauf wieder erlaubt");
    }

    #[test]
    fn aufraeumen_entfernt_leere_eintraege() {
        let limiter = AnmeldeRateLimiter::mit_limit(5, Duration::from_millis(10));
        limiter.erlaubt("fluechtig");
        std::thread::sleep(Duration::from_millis(20));

        limiter.aufraeumen();
        assert!(limiter.anfragen.lock().is_empty());
    }
}
