use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

use crate::error::Result;

/// What a fetched caption file looks like, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionSummary {
    pub has_header: bool,
    pub cues: usize,
    pub bytes: usize,
}

impl CaptionSummary {
    /// Inspect WebVTT-style caption bytes. Never fails; malformed input just counts zero cues.
    pub fn inspect(content: &[u8]) -> Self {
        let text = String::from_utf8_lossy(content);
        let has_header = text.trim_start_matches('\u{feff}').starts_with("WEBVTT");
        let cues = text.lines().filter(|line| line.contains("-->")).count();

        Self {
            has_header,
            cues,
            bytes: content.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cues == 0
    }

    pub(crate) fn log(&self, what: &str) {
        if self.is_empty() {
            warn!("{} has no caption cues ({} bytes)", what, self.bytes);
        } else {
            info!(
                "{} has {} cues ({} bytes{})",
                what,
                self.cues,
                self.bytes,
                if self.has_header { "" } else { ", no WEBVTT header" }
            );
        }
    }
}

/// Write caption bytes to disk
pub async fn write_caption<P: AsRef<Path>>(content: &[u8], output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Writing caption file: {}", output_path.display());

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(output_path, content).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_counts_cues() {
        let vtt = "WEBVTT\n\n00:00:00.000 --> 00:00:01.500\nHello\n\n\
                   00:00:01.500 --> 00:00:03.000\nWorld\n";
        let summary = CaptionSummary::inspect(vtt.as_bytes());
        assert!(summary.has_header);
        assert_eq!(summary.cues, 2);
        assert!(!summary.is_empty());
    }

    #[test]
    fn test_inspect_tolerates_garbage() {
        let summary = CaptionSummary::inspect(&[0xff, 0xfe, 0x00]);
        assert!(!summary.has_header);
        assert!(summary.is_empty());
        assert_eq!(summary.bytes, 3);
    }

    #[tokio::test]
    async fn test_write_caption_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("transcript_translated.vtt");
        write_caption(b"WEBVTT\n", &path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"WEBVTT\n");
    }
}
