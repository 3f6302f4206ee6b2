//! Sperrliste fuer widerrufene Token-IDs (jti)
//!
//! Eintraege leben bis zum natuerlichen Ablauf des Tokens; danach
//! sind sie bedeutungslos und werden beim Zugriff oder im stuendlichen
//! Aufraeumlauf entfernt.

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;

/// Thread-sichere jti-Sperrliste
///
/// Clone teilt den inneren Zustand.
#[derive(Clone, Default)]
pub struct JtiSperrliste {
    /// jti -> Ablaufzeitpunkt (Unix-Sekunden)
    eintraege: Arc<DashMap<String, i64>>,
}

impl JtiSperrliste {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Sperrt eine Token-ID bis zu ihrem Ablaufzeitpunkt
    pub fn sperren(&self, jti: &str, ablauf: i64) {
        self.eintraege.insert(jti.to_string(), ablauf);
        tracing::debug!(jti = %jti, "Token gesperrt");
    }

    /// Prueft ob eine Token-ID gesperrt ist.
    /// Abgelaufene Eintraege werden dabei gleich entfernt.
    pub fn ist_gesperrt(&self, jti: &str) -> bool {
        match self.eintraege.get(jti).map(|e| *e.value()) {
            Some(ablauf) if ablauf < Utc::now().timestamp() => {
                self.eintraege.remove(jti);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Entfernt alle abgelaufenen Eintraege (stuendlicher Wartungslauf)
    pub fn aufraeumen(&self) {
        let jetzt = Utc::now().timestamp();
        let vorher = self.eintraege.len();
        self.eintraege.retain(|_, ablauf| *ablauf >= jetzt);
        let entfernt = vorher - self.eintraege.len();
        if entfernt > 0 {
            tracing::debug!(entfernt, "Abgelaufene Sperrlisten-Eintraege entfernt");
        }
    }

    /// Anzahl der aktuell gesperrten Token
    pub fn anzahl(&self) -> usize {
        self.eintraege.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sperren_und_pruefen() {
        let liste = JtiSperrliste::neu();
        let ablauf = Utc::now().timestamp() + 3600;

        assert!(!liste.ist_gesperrt("abc"));
        liste.sperren("abc", ablauf);
        assert!(liste.ist_gesperrt("abc"));
        assert!(!liste.ist_gesperrt("xyz"));
    }

    #[test]
    fn abgelaufene_sperre_gilt_nicht_mehr() {
        let liste = JtiSperrliste::neu();
        liste.sperren("alt", Utc::now().timestamp() - 10);

        assert!(!liste.ist_gesperrt("alt"));
        // Der Zugriff hat den Eintrag entfernt
        assert_eq!(liste.anzahl(), 0);
    }

    #[test]
    fn aufraeumen_entfernt_nur_abgelaufene() {
        let liste = JtiSperrliste::neu();
        let jetzt = Utc::now().timestamp();
        liste.sperren("alt", jetzt - 10);
        liste.sperren("frisch", jetzt + 3600);

        liste.aufraeumen();
        assert_eq!(liste.anzahl(), 1);
        assert!(liste.ist_gesperrt("frisch"));
    }

    #[test]
    fn clone_teilt_zustand() {
        let liste1 = JtiSperrliste::neu();
        let liste2 = liste1.clone();
        liste1.sperren("geteilt", Utc::now().timestamp() + 100);
        assert!(liste2.ist_gesperrt("geteilt"));
    }
}
