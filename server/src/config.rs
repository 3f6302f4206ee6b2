//! Server-Konfiguration aus der Umgebung
//!
//! Alle Werte kommen aus Umgebungsvariablen mit sinnvollen
//! Standardwerten, so dass der Server in der Entwicklungsumgebung ohne
//! weitere Konfiguration startet:
//!
//! `JWT_SECRET`, `REDIS_HOST`, `REDIS_PORT`, `MYSQL_HOST`, `MYSQL_PORT`,
//! `MYSQL_USER`, `MYSQL_PASSWORD`, `MYSQL_DATABASE`, `SERVER_PORT`,
//! `AUDIO_DIR`, `SF_LOG_LEVEL`, `SF_LOG_FORMAT`

use sprechfunk_db::DatenbankKonfig;

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Geheimnis fuer die HMAC-Token-Signatur
    pub jwt_secret: String,
    /// Redis-Einstellungen (Key-Value-Store)
    pub redis: RedisEinstellungen,
    /// MySQL-Einstellungen (relationale Datenbank)
    pub mysql: MySqlEinstellungen,
    /// HTTP/WebSocket-Port
    pub server_port: u16,
    /// Verzeichnis fuer Utterance-Dateien
    pub audio_verzeichnis: String,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

#[derive(Debug, Clone)]
pub struct RedisEinstellungen {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct MySqlEinstellungen {
    pub host: String,
    pub port: u16,
    pub benutzer: String,
    pub passwort: String,
    pub datenbank: String,
}

#[derive(Debug, Clone)]
pub struct LoggingEinstellungen {
    pub level: String,
    pub format: String,
}

impl ServerConfig {
    /// Laedt die Konfiguration aus der Umgebung
    pub fn aus_env() -> Self {
        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(geheimnis) if !geheimnis.is_empty() => geheimnis,
            _ => {
                tracing::warn!(
                    "JWT_SECRET nicht gesetzt – Entwicklungsgeheimnis wird verwendet"
                );
                "entwicklungs-geheimnis".to_string()
            }
        };

        Self {
            jwt_secret,
            redis: RedisEinstellungen {
                host: env_oder("REDIS_HOST", "localhost"),
                port: env_port("REDIS_PORT", 6379),
            },
            mysql: MySqlEinstellungen {
                host: env_oder("MYSQL_HOST", "localhost"),
                port: env_port("MYSQL_PORT", 3306),
                benutzer: env_oder("MYSQL_USER", "sprechfunk"),
                passwort: env_oder("MYSQL_PASSWORD", ""),
                datenbank: env_oder("MYSQL_DATABASE", "sprechfunk"),
            },
            server_port: env_port("SERVER_PORT", 8000),
            audio_verzeichnis: env_oder("AUDIO_DIR", "./audio"),
            logging: LoggingEinstellungen {
                level: env_oder("SF_LOG_LEVEL", "info"),
                format: env_oder("SF_LOG_FORMAT", "text"),
            },
        }
    }

    /// Redis-Verbindungs-URL
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/", self.redis.host, self.redis.port)
    }

    /// Datenbank-Konfiguration fuer den Pool
    pub fn datenbank_konfig(&self) -> DatenbankKonfig {
        DatenbankKonfig {
            host: self.mysql.host.clone(),
            port: self.mysql.port,
            benutzer: self.mysql.benutzer.clone(),
            passwort: self.mysql.passwort.clone(),
            datenbank: self.mysql.datenbank.clone(),
            max_verbindungen: 10,
        }
    }

    /// Bind-Adresse des HTTP-Servers
    pub fn bind_adresse(&self) -> String {
        format!("0.0.0.0:{}", self.server_port)
    }
}

fn env_oder(name: &str, standard: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| standard.to_string())
}

fn env_port(name: &str, standard: u16) -> u16 {
    std::env::var(name)
        .ok()
        .and_then(|wert| wert.parse().ok())
        .unwrap_or(standard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardwerte_ohne_umgebung() {
        // Hinweis: laeuft gegen die echte Prozess-Umgebung; die Variablen
        // sind in der Testumgebung nicht gesetzt.
        let cfg = ServerConfig::aus_env();
        assert_eq!(cfg.redis.port, 6379);
        assert_eq!(cfg.mysql.port, 3306);
        assert_eq!(cfg.server_port, 8000);
        assert_eq!(cfg.audio_verzeichnis, "./audio");
    }

    #[test]
    fn redis_url_format() {
        let cfg = ServerConfig::aus_env();
        assert!(cfg.redis_url().starts_with("redis://"));
        assert!(cfg.redis_url().ends_with(":6379/"));
    }

    #[test]
    fn bind_adresse_format() {
        let cfg = ServerConfig::aus_env();
        assert_eq!(cfg.bind_adresse(), "0.0.0.0:8000");
    }
}
