//! Schluessel-Namensraeume im Key-Value-Store
//!
//! Alle Pfade an einer Stelle, damit Fassaden und Sweeper dieselben
//! Formate verwenden.
//!
//! | Pfad | Inhalt |
//! |---|---|
//! | `channel:<id>:users` | Set der User-IDs im Kanal |
//! | `channel:<id>:speaker` | User-ID des Lease-Halters (TTL 30 s) |
//! | `channel:<id>:keys:<user>` | Oeffentlicher Schluessel (TTL 24 h) |
//! | `user:<id>:session` | Verbindungs-ID (TTL 30 min) |
//! | `user:<id>:channel` | Aktueller Kanal (TTL 30 min) |
//! | `user:<id>:info` | Hash: username, email, last_seen (TTL 30 min) |

use sprechfunk_core::{ChannelId, UserId};

pub fn kanal_users(kanal: &ChannelId) -> String {
    format!("channel:{}:users", kanal)
}

pub fn kanal_sprecher(kanal: &ChannelId) -> String {
    format!("channel:{}:speaker", kanal)
}

pub fn kanal_schluessel(kanal: &ChannelId, user: UserId) -> String {
    format!("channel:{}:keys:{}", kanal, user)
}

pub fn user_session(user: UserId) -> String {
    format!("user:{}:session", user)
}

pub fn user_kanal(user: UserId) -> String {
    format!("user:{}:channel", user)
}

pub fn user_info(user: UserId) -> String {
    format!("user:{}:info", user)
}

/// Extrahiert die User-ID aus einem `user:<id>:session`-Schluessel
pub fn user_id_aus_session_schluessel(schluessel: &str) -> Option<UserId> {
    let mitte = schluessel.strip_prefix("user:")?.strip_suffix(":session")?;
    mitte.parse::<i64>().ok().map(UserId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pfade_entsprechen_namensraum() {
        let kanal = ChannelId::neu("c1");
        assert_eq!(kanal_users(&kanal), "channel:c1:users");
        assert_eq!(kanal_sprecher(&kanal), "channel:c1:speaker");
        assert_eq!(kanal_schluessel(&kanal, UserId(7)), "channel:c1:keys:7");
        assert_eq!(user_session(UserId(7)), "user:7:session");
        assert_eq!(user_kanal(UserId(7)), "user:7:channel");
        assert_eq!(user_info(UserId(7)), "user:7:info");
    }

    #[test]
    fn session_schluessel_rueckwaerts() {
        assert_eq!(
            user_id_aus_session_schluessel("user:42:session"),
            Some(UserId(42))
        );
        assert_eq!(user_id_aus_session_schluessel("user:abc:session"), None);
        assert_eq!(user_id_aus_session_schluessel("channel:1:speaker"), None);
    }
}
