//! Pipeline stage state machine.
//!
//! [`PipelineStage`] is the single source of truth for which user actions are
//! currently permitted. [`Controls`] is the derived view a presentation layer
//! renders from it.
//!
//! ```text
//! Idle ──select──▶ FileSelected ──generate──▶ Extracting
//!                                              ──▶ Transcribing
//!                                              ──▶ Translating
//!                                              ──▶ Ready ◀──▶ Downloading
//! any running stage ──error──▶ Failed
//! Ready / Failed ──select──▶ FileSelected
//! Ready / Failed ──generate──▶ Extracting
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PipelineStage {
    #[default]
    Idle,
    FileSelected,
    Extracting,
    Transcribing,
    Translating,
    Ready,
    Downloading,
    Failed,
}

impl PipelineStage {
    /// Returns `true` while a remote call is in flight.
    ///
    /// The generate action stays disabled for as long as this holds.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Extracting | Self::Transcribing | Self::Translating | Self::Downloading
        )
    }

    /// Download is only permitted once translation has completed.
    pub fn permits_download(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// A short human-readable label for status display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::FileSelected => "File selected",
            Self::Extracting => "Extracting audio",
            Self::Transcribing => "Transcribing",
            Self::Translating => "Translating",
            Self::Ready => "Ready",
            Self::Downloading => "Downloading",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::FileSelected => "file-selected",
            Self::Extracting => "extracting",
            Self::Transcribing => "transcribing",
            Self::Translating => "translating",
            Self::Ready => "ready",
            Self::Downloading => "downloading",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Remote operation a stage failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Step {
    Extract,
    Transcribe,
    FetchTranscript,
    Translate,
}

impl Step {
    /// The pipeline stage during which this step runs.
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Extract => PipelineStage::Extracting,
            Self::Transcribe => PipelineStage::Transcribing,
            Self::FetchTranscript | Self::Translate => PipelineStage::Translating,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Extract => "Audio extraction",
            Self::Transcribe => "Transcription",
            Self::FetchTranscript => "Transcript download",
            Self::Translate => "Translation",
        };
        f.write_str(name)
    }
}

/// Enabled state of the two user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub generate_enabled: bool,
    pub download_enabled: bool,
}

impl Controls {
    pub fn derive(stage: PipelineStage, has_selection: bool) -> Self {
        Self {
            generate_enabled: has_selection && !stage.is_busy(),
            download_enabled: stage.permits_download(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PipelineStage; 8] = [
        PipelineStage::Idle,
        PipelineStage::FileSelected,
        PipelineStage::Extracting,
        PipelineStage::Transcribing,
        PipelineStage::Translating,
        PipelineStage::Ready,
        PipelineStage::Downloading,
        PipelineStage::Failed,
    ];

    #[test]
    fn test_only_ready_permits_download() {
        for stage in ALL {
            assert_eq!(stage.permits_download(), stage == PipelineStage::Ready, "{stage}");
        }
    }

    #[test]
    fn test_busy_stages() {
        let busy: Vec<_> = ALL.iter().filter(|s| s.is_busy()).copied().collect();
        assert_eq!(
            busy,
            vec![
                PipelineStage::Extracting,
                PipelineStage::Transcribing,
                PipelineStage::Translating,
                PipelineStage::Downloading,
            ]
        );
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(PipelineStage::default(), PipelineStage::Idle);
    }

    #[test]
    fn test_controls_follow_stage() {
        let c = Controls::derive(PipelineStage::Ready, true);
        assert!(c.generate_enabled && c.download_enabled);

        let c = Controls::derive(PipelineStage::Transcribing, true);
        assert!(!c.generate_enabled && !c.download_enabled);

        let c = Controls::derive(PipelineStage::Idle, false);
        assert!(!c.generate_enabled && !c.download_enabled);

        let c = Controls::derive(PipelineStage::Failed, true);
        assert!(c.generate_enabled);
        assert!(!c.download_enabled);
    }

    #[test]
    fn test_fetch_and_translate_share_a_stage() {
        assert_eq!(Step::FetchTranscript.stage(), PipelineStage::Translating);
        assert_eq!(Step::Translate.stage(), PipelineStage::Translating);
        assert_eq!(Step::Extract.stage(), PipelineStage::Extracting);
    }
}
