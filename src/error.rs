use thiserror::Error;

use crate::stage::{PipelineStage, Step};

#[derive(Error, Debug)]
pub enum CapflowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot start pipeline: {0}")]
    Precondition(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("{step} failed: {message}")]
    Stage { step: Step, message: String },

    #[error("No subtitle file is ready for download (pipeline is {0})")]
    NotReady(PipelineStage),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Cleanup failed: {0}")]
    CleanupWarning(String),
}

impl CapflowError {
    /// The pipeline step a stage failure originated from, if any.
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Stage { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CapflowError>;
