//! Audio-Senke – persistiert Utterances als Append-Only-Dateien
//!
//! Eine Datei pro Utterance unter `<verzeichnis>/<utterance_id>.opus`
//! (mit Suffix `_encrypted` wenn die Verbindung verschluesselt sendet).
//! Die Dateien werden nie gelesen; Fehler sind nicht fatal – der
//! Broadcast laeuft weiter, Persistenz ist Best-Effort.

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

/// Dateiendung der Utterance-Dateien
const DATEI_ENDUNG: &str = "opus";
/// Suffix fuer verschluesselt aufgenommene Utterances
const VERSCHLUESSELT_SUFFIX: &str = "_encrypted";

/// Append-Only-Senke fuer Audio-Frames
#[derive(Clone)]
pub struct AudioSenke {
    verzeichnis: PathBuf,
}

impl AudioSenke {
    /// Legt die Senke an und stellt sicher dass das Verzeichnis existiert
    pub async fn anlegen(verzeichnis: impl AsRef<Path>) -> io::Result<Self> {
        let verzeichnis = verzeichnis.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&verzeichnis).await?;
        tracing::info!(verzeichnis = %verzeichnis.display(), "Audio-Verzeichnis bereit");
        Ok(Self { verzeichnis })
    }

    /// Dateipfad einer Utterance
    pub fn pfad(&self, utterance_id: &str, verschluesselt: bool) -> PathBuf {
        let suffix = if verschluesselt {
            VERSCHLUESSELT_SUFFIX
        } else {
            ""
        };
        self.verzeichnis
            .join(format!("{utterance_id}{suffix}.{DATEI_ENDUNG}"))
    }

    /// Haengt Bytes an die Utterance-Datei an (erstellt sie beim ersten Frame)
    pub async fn anhaengen(
        &self,
        utterance_id: &str,
        daten: &[u8],
        verschluesselt: bool,
    ) -> io::Result<()> {
        let pfad = self.pfad(utterance_id, verschluesselt);

        let mut optionen = tokio::fs::OpenOptions::new();
        optionen.create(true).append(true);
        #[cfg(unix)]
        optionen.mode(0o644);

        let mut datei = optionen.open(&pfad).await?;
        datei.write_all(daten).await?;
        datei.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_senke() -> AudioSenke {
        let verzeichnis =
            std::env::temp_dir().join(format!("sprechfunk-audio-{}", uuid::Uuid::new_v4()));
        AudioSenke::anlegen(&verzeichnis)
            .await
            .expect("Senke muss anlegbar sein")
    }

    #[tokio::test]
    async fn anhaengen_erstellt_und_verlaengert() {
        let senke = test_senke().await;

        // Fuenf Frames zu je 320 Bytes -> Datei mit 1600 Bytes
        for _ in 0..5 {
            senke
                .anhaengen("7-1700000000", &[0xAB; 320], false)
                .await
                .expect("Anhaengen fehlgeschlagen");
        }

        let meta = tokio::fs::metadata(senke.pfad("7-1700000000", false))
            .await
            .expect("Datei muss existieren");
        assert_eq!(meta.len(), 1600);
    }

    #[tokio::test]
    async fn verschluesselt_bekommt_suffix() {
        let senke = test_senke().await;
        senke
            .anhaengen("3-1700000001", b"geheim", true)
            .await
            .unwrap();

        let pfad = senke.pfad("3-1700000001", true);
        assert!(pfad
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_encrypted.opus"));
        assert!(tokio::fs::metadata(&pfad).await.is_ok());
    }

    #[tokio::test]
    async fn getrennte_utterances_getrennte_dateien() {
        let senke = test_senke().await;
        senke.anhaengen("1-100", b"a", false).await.unwrap();
        senke.anhaengen("1-101", b"b", false).await.unwrap();

        assert!(tokio::fs::metadata(senke.pfad("1-100", false)).await.is_ok());
        assert!(tokio::fs::metadata(senke.pfad("1-101", false)).await.is_ok());
    }
}
