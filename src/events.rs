//! State-transition notifications and the presentation-side contracts.
//!
//! The workflow never renders anything. It publishes [`PipelineEvent`]s to
//! every subscribed [`PipelineObserver`] and hands downloaded bytes to an
//! [`ArtifactSink`]. A presentation layer implements those two traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use crate::caption::write_caption;
use crate::error::Result;
use crate::stage::{Controls, PipelineStage, Step};

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// The pipeline stage changed; `controls` is the new action availability.
    StageChanged {
        from: PipelineStage,
        to: PipelineStage,
        controls: Controls,
    },
    /// Human-readable status emitted before and after each step.
    Progress { stage: PipelineStage, message: String },
    /// A run or download failed. `step` is `None` for download failures.
    Failed { step: Option<Step>, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineEvent {
    pub at: DateTime<Utc>,
    /// Set while a pipeline run is in flight and for its download
    pub run_id: Option<Uuid>,
    pub kind: EventKind,
}

impl PipelineEvent {
    pub fn new(run_id: Option<Uuid>, kind: EventKind) -> Self {
        Self {
            at: Utc::now(),
            run_id,
            kind,
        }
    }

    /// One-line status text for display.
    pub fn message(&self) -> String {
        match &self.kind {
            EventKind::StageChanged { to, .. } => to.label().to_string(),
            EventKind::Progress { message, .. } => message.clone(),
            EventKind::Failed { message, .. } => format!("Error: {}", message),
        }
    }

    /// The stage this event concerns. Failures report the stage of the failing step.
    pub fn stage(&self) -> Option<PipelineStage> {
        match &self.kind {
            EventKind::StageChanged { to, .. } => Some(*to),
            EventKind::Progress { stage, .. } => Some(*stage),
            EventKind::Failed { step, .. } => step.map(|s| s.stage()),
        }
    }
}

/// Receives every event the workflow publishes.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, event: &PipelineEvent);
}

/// Persists a downloaded artifact locally.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn save(&self, suggested_name: &str, content: &[u8]) -> Result<()>;
}

/// Writes each event to the tracing log.
pub struct LogObserver;

impl PipelineObserver for LogObserver {
    fn on_event(&self, event: &PipelineEvent) {
        let run = event.run_id.map(|id| id.to_string()).unwrap_or_default();
        match &event.kind {
            EventKind::StageChanged { from, to, controls } => info!(
                run = %run,
                "Stage {} -> {} (generate: {}, download: {})",
                from, to, controls.generate_enabled, controls.download_enabled
            ),
            EventKind::Progress { stage, message } => info!(run = %run, "[{}] {}", stage, message),
            EventKind::Failed { message, .. } => match event.stage() {
                Some(stage) => error!(run = %run, stage = %stage, "{}", message),
                None => error!(run = %run, "{}", message),
            },
        }
    }
}

/// Terminal status line backed by an indicatif spinner.
pub struct ConsoleObserver {
    bar: ProgressBar,
}

impl ConsoleObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }
}

impl Default for ConsoleObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineObserver for ConsoleObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match &event.kind {
            EventKind::StageChanged { to, .. } if *to == PipelineStage::Ready => {
                self.bar.set_message("Subtitles ready for download");
            }
            EventKind::Failed { .. } => {
                self.bar.abandon_with_message(event.message());
            }
            _ => self.bar.set_message(event.message()),
        }
    }
}

impl Drop for ConsoleObserver {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

/// Saves artifacts into a directory under their suggested name.
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, suggested_name: &str) -> PathBuf {
        // Only the final component of the suggested name is honoured.
        let name = Path::new(suggested_name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "subtitle.vtt".into());
        self.dir.join(name)
    }
}

#[async_trait]
impl ArtifactSink for FileSink {
    async fn save(&self, suggested_name: &str, content: &[u8]) -> Result<()> {
        let path = self.path_for(suggested_name);
        write_caption(content, &path).await?;
        info!("Saved {} ({} bytes)", path.display(), content.len());
        Ok(())
    }
}
