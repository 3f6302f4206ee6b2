//! Auth-Service fuer Sprechfunk
//!
//! Zentraler Service fuer Registrierung, Login, Token-Refresh und
//! Logout. Nutzt das UserRepository, den Token-Dienst und die
//! jti-Sperrliste.

use std::sync::Arc;

use sprechfunk_db::models::{BenutzerRecord, NeuerBenutzer};
use sprechfunk_db::UserRepository;

use crate::blacklist::JtiSperrliste;
use crate::error::{AuthError, AuthResult};
use crate::password::{passwort_hashen, passwort_pruefen};
use crate::token::{TokenClaims, TokenDienst};

/// Auth-Service – Einstiegspunkt fuer alle Authentifizierungsvorgaenge
pub struct AuthService<U: UserRepository> {
    user_repo: Arc<U>,
    token_dienst: Arc<TokenDienst>,
    sperrliste: JtiSperrliste,
}

impl<U: UserRepository> AuthService<U> {
    pub fn neu(user_repo: Arc<U>, token_dienst: Arc<TokenDienst>, sperrliste: JtiSperrliste) -> Self {
        Self {
            user_repo,
            token_dienst,
            sperrliste,
        }
    }

    /// Registriert einen neuen Benutzer
    ///
    /// Alle drei Felder sind Pflicht; Duplikate meldet die Datenbank.
    pub async fn registrieren(
        &self,
        username: &str,
        email: &str,
        passwort: &str,
    ) -> AuthResult<BenutzerRecord> {
        if username.is_empty() {
            return Err(AuthError::FeldFehlt("username"));
        }
        if email.is_empty() {
            return Err(AuthError::FeldFehlt("email"));
        }
        if passwort.is_empty() {
            return Err(AuthError::FeldFehlt("password"));
        }

        let hash = passwort_hashen(passwort)?;

        let benutzer = self
            .user_repo
            .erstellen(NeuerBenutzer {
                username,
                email,
                hashed_password: &hash,
            })
            .await
            .map_err(|e| {
                if e.ist_eindeutigkeit() {
                    AuthError::BenutzerVergeben(username.to_string())
                } else {
                    AuthError::Db(e)
                }
            })?;

        tracing::info!(
            user_id = benutzer.id,
            username = %benutzer.username,
            "Neuer Benutzer registriert"
        );
        Ok(benutzer)
    }

    /// Meldet einen Benutzer an und praegt ein Zugriffstoken.
    ///
    /// Die Kennung wird zuerst als E-Mail-Adresse gesucht; schlaegt das
    /// fehl und enthaelt sie kein '@', folgt die Suche nach Benutzername.
    pub async fn anmelden(
        &self,
        kennung: &str,
        passwort: &str,
    ) -> AuthResult<(BenutzerRecord, String, TokenClaims)> {
        if kennung.is_empty() {
            return Err(AuthError::FeldFehlt("username oder email"));
        }

        let mut benutzer = self.user_repo.nach_email(kennung).await?;
        if benutzer.is_none() && !kennung.contains('@') {
            benutzer = self.user_repo.nach_username(kennung).await?;
        }

        let benutzer = match benutzer {
            Some(b) => b,
            None => {
                tracing::warn!(kennung = %kennung, "Login-Versuch fuer unbekannte Kennung");
                return Err(AuthError::UngueltigeAnmeldedaten);
            }
        };

        let korrekt = passwort_pruefen(passwort, &benutzer.hashed_password)?;
        if !korrekt {
            tracing::warn!(username = %benutzer.username, "Fehlgeschlagener Login-Versuch");
            return Err(AuthError::UngueltigeAnmeldedaten);
        }

        let (token, claims) = self.token_dienst.praegen(benutzer.id, &benutzer.username)?;

        tracing::info!(
            user_id = benutzer.id,
            username = %benutzer.username,
            "Benutzer angemeldet"
        );
        Ok((benutzer, token, claims))
    }

    /// Tauscht ein (auch bereits abgelaufenes) Token gegen ein frisches.
    ///
    /// Das alte jti wandert auf die Sperrliste.
    pub fn token_erneuern(&self, token: &str) -> AuthResult<(String, TokenClaims)> {
        let alt = self.token_dienst.validieren_ohne_ablauf(token)?;

        if self.sperrliste.ist_gesperrt(&alt.jti) {
            return Err(AuthError::TokenWiderrufen);
        }

        let (neues_token, neue_claims) =
            self.token_dienst.praegen(alt.user_id, &alt.username)?;

        self.sperrliste.sperren(&alt.jti, alt.exp);

        tracing::info!(username = %alt.username, "Token erneuert");
        Ok((neues_token, neue_claims))
    }

    /// Meldet einen Benutzer ab: das Token wird gesperrt.
    ///
    /// Gibt die Claims zurueck damit der Aufrufer die Presence des
    /// Benutzers bereinigen kann.
    pub fn abmelden(&self, token: &str) -> AuthResult<TokenClaims> {
        let claims = self.token_dienst.validieren(token)?;
        self.sperrliste.sperren(&claims.jti, claims.exp);
        tracing::info!(username = %claims.username, jti = %claims.jti, "Benutzer abgemeldet");
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parking_lot::Mutex;
    use sprechfunk_db::DbResult;

    // Minimales In-Memory UserRepository fuer Tests
    #[derive(Default)]
    struct TestUserRepo {
        benutzer: Mutex<Vec<BenutzerRecord>>,
    }

    impl UserRepository for TestUserRepo {
        async fn erstellen(&self, daten: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
            let mut benutzer = self.benutzer.lock();
            if benutzer
                .iter()
                .any(|b| b.username == daten.username || b.email == daten.email)
            {
                return Err(sprechfunk_db::DbError::Eindeutigkeit(
                    daten.username.to_string(),
                ));
            }
            let record = BenutzerRecord {
                id: benutzer.len() as i64 + 1,
                user_uuid: uuid::Uuid::new_v4().to_string(),
                username: daten.username.to_string(),
                email: daten.email.to_string(),
                hashed_password: daten.hashed_password.to_string(),
                created_at: Utc::now(),
            };
            benutzer.push(record.clone());
            Ok(record)
        }

        async fn nach_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>> {
            Ok(self
                .benutzer
                .lock()
                .iter()
                .find(|b| b.email == email)
                .cloned())
        }

        async fn nach_username(&self, username: &str) -> DbResult<Option<BenutzerRecord>> {
            Ok(self
                .benutzer
                .lock()
                .iter()
                .find(|b| b.username == username)
                .cloned())
        }
    }

    fn test_service() -> AuthService<TestUserRepo> {
        AuthService::neu(
            Arc::new(TestUserRepo::default()),
            Arc::new(TokenDienst::neu(b"testgeheimnis".to_vec())),
            JtiSperrliste::neu(),
        )
    }

    #[tokio::test]
    async fn registrieren_und_anmelden() {
        let service = test_service();

        let benutzer = service
            .registrieren("funker", "funker@example.com", "sicher!")
            .await
            .expect("Registrierung fehlgeschlagen");
        assert_eq!(benutzer.username, "funker");

        // Anmeldung per E-Mail
        let (angemeldet, token, claims) = service
            .anmelden("funker@example.com", "sicher!")
            .await
            .expect("Anmeldung per E-Mail fehlgeschlagen");
        assert_eq!(angemeldet.id, benutzer.id);
        assert_eq!(claims.user_id, benutzer.id);
        assert!(!token.is_empty());

        // Anmeldung per Benutzername
        let (_, token2, _) = service
            .anmelden("funker", "sicher!")
            .await
            .expect("Anmeldung per Benutzername fehlgeschlagen");
        assert!(!token2.is_empty());
    }

    #[tokio::test]
    async fn doppelte_registrierung_schlaegt_fehl() {
        let service = test_service();
        service
            .registrieren("duplikat", "d@example.com", "pw")
            .await
            .unwrap();
        let ergebnis = service.registrieren("duplikat", "d2@example.com", "pw").await;
        assert!(matches!(ergebnis, Err(AuthError::BenutzerVergeben(_))));
    }

    #[tokio::test]
    async fn leere_felder_abgelehnt() {
        let service = test_service();
        assert!(matches!(
            service.registrieren("", "a@b.c", "pw").await,
            Err(AuthError::FeldFehlt("username"))
        ));
        assert!(matches!(
            service.registrieren("a", "a@b.c", "").await,
            Err(AuthError::FeldFehlt("password"))
        ));
    }

    #[tokio::test]
    async fn falsches_passwort_abgelehnt() {
        let service = test_service();
        service
            .registrieren("user", "u@example.com", "richtig")
            .await
            .unwrap();
        let ergebnis = service.anmelden("user", "falsch").await;
        assert!(matches!(ergebnis, Err(AuthError::UngueltigeAnmeldedaten)));
    }

    #[tokio::test]
    async fn token_erneuern_sperrt_altes() {
        let service = test_service();
        service
            .registrieren("refresher", "r@example.com", "pw")
            .await
            .unwrap();
        let (_, token, alte_claims) = service.anmelden("refresher", "pw").await.unwrap();

        let (neues_token, neue_claims) = service.token_erneuern(&token).unwrap();
        assert_ne!(neue_claims.jti, alte_claims.jti);
        assert!(!neues_token.is_empty());

        // Das alte Token ist jetzt widerrufen
        assert!(matches!(
            service.token_erneuern(&token),
            Err(AuthError::TokenWiderrufen)
        ));
    }

    #[tokio::test]
    async fn abmelden_sperrt_token() {
        let service = test_service();
        service
            .registrieren("logout", "l@example.com", "pw")
            .await
            .unwrap();
        let (_, token, claims) = service.anmelden("logout", "pw").await.unwrap();

        service.abmelden(&token).unwrap();
        assert!(service.sperrliste.ist_gesperrt(&claims.jti));
    }
}
