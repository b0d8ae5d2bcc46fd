// Remote pipeline service
//
// The captioning backend is a stateful HTTP service. Everything the workflow
// needs from it goes through the PipelineService trait so the state machine
// can be exercised without a network:
// - http: reqwest implementation speaking the multipart/JSON protocol
//
// The service keeps the last transcript and translation under fixed names.
// Only the translation response may name its output file explicitly.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::input::SelectedInput;

pub use http::HttpPipelineService;

/// Errors reported by the remote service adapter.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Connection, DNS or timeout failure before a response arrived.
    #[error("{0}")]
    Transport(String),

    /// Non-2xx response; `message` is the service's `detail` when it sent one.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// 2xx response whose body could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Transport(format!("request timed out: {}", e))
        } else {
            ServiceError::Transport(format!("request failed: {}", e))
        }
    }
}

/// Opaque server-side file identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactReference(pub String);

impl ArtifactReference {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub extracted_audio_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscribeResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslateResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Server-side path of the translated file, when the service reports it
    #[serde(default)]
    pub output_file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanupResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub llm_loaded: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// How the transcript reaches the translation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateInput {
    /// Caption bytes uploaded as the `input_file` part
    File { name: String, content: Vec<u8> },
    /// Server-side name sent as the `input_path` field
    Path(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateRequest {
    pub input: TranslateInput,
    /// Locale name, e.g. "English"
    pub source_language: String,
    /// Locale name, e.g. "German"
    pub target_language: String,
}

/// Request/response contract of the captioning backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PipelineService: Send + Sync {
    /// POST /extract_audio
    async fn extract_audio(&self, video: &SelectedInput) -> Result<ExtractResponse, ServiceError>;

    /// POST /transcribe_audio with a two-letter language code
    async fn transcribe(
        &self,
        media: &SelectedInput,
        language_code: &str,
    ) -> Result<TranscribeResponse, ServiceError>;

    /// GET /download_transcript
    async fn fetch_transcript(&self) -> Result<Vec<u8>, ServiceError>;

    /// POST /translate_text
    async fn translate(&self, request: &TranslateRequest) -> Result<TranslateResponse, ServiceError>;

    /// Fetch the translated caption file
    async fn fetch_translated(&self, reference: &ArtifactReference) -> Result<Vec<u8>, ServiceError>;

    /// POST /cleanup
    async fn cleanup(&self) -> Result<CleanupResponse, ServiceError>;

    /// GET /health
    async fn health(&self) -> Result<HealthStatus, ServiceError>;
}
