// reqwest implementation of the captioning service protocol.
// Uploads are multipart forms; successes and failures come back as JSON
// except for artifact fetches, which return raw caption bytes.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::config::{DownloadRoute, ServiceConfig, TranscriptionConfig};
use crate::error::{CapflowError, Result};
use crate::input::SelectedInput;
use super::{
    ArtifactReference, CleanupResponse, ExtractResponse, HealthStatus, PipelineService,
    ServiceError, TranscribeResponse, TranslateInput, TranslateRequest, TranslateResponse,
};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: serde_json::Value,
}

pub struct HttpPipelineService {
    client: Client,
    base_url: String,
    download_route: DownloadRoute,
    transcription: TranscriptionConfig,
}

impl HttpPipelineService {
    pub fn new(config: &ServiceConfig, download_route: DownloadRoute) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(CapflowError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            download_route,
            transcription: TranscriptionConfig::default(),
        })
    }

    /// Forward these whisper settings with every transcription request.
    pub fn with_transcription(mut self, transcription: TranscriptionConfig) -> Self {
        self.transcription = transcription;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/download/{name}` with the name percent-encoded as a single path segment.
    fn named_download_url(
        &self,
        reference: &ArtifactReference,
    ) -> std::result::Result<Url, ServiceError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ServiceError::Transport(format!("invalid service URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|()| {
                ServiceError::Transport(format!("service URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .push("download")
            .push(&reference.0);
        Ok(url)
    }

    fn video_part(media: &SelectedInput) -> std::result::Result<Part, ServiceError> {
        let body = Body::from(media.content.clone());
        Ok(Part::stream_with_length(body, media.size() as u64)
            .file_name(media.name.clone())
            .mime_str(media.upload_media_type())?)
    }

    async fn read_json<T: DeserializeOwned>(
        response: Response,
        operation: &str,
    ) -> std::result::Result<T, ServiceError> {
        let body = Self::read_body(response).await?;
        serde_json::from_slice(&body).map_err(|e| {
            ServiceError::Malformed(format!("{} returned unparseable JSON: {}", operation, e))
        })
    }

    async fn read_body(response: Response) -> std::result::Result<Vec<u8>, ServiceError> {
        let status = response.status();
        let body = response.bytes().await?;
        debug!("Response {} ({} bytes)", status, body.len());

        if !status.is_success() {
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }
        Ok(body.to_vec())
    }
}

/// The service's `detail` field if the body carries one, else the HTTP status.
pub(crate) fn error_message(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body).map(|b| b.detail) {
        Ok(serde_json::Value::String(detail)) if !detail.trim().is_empty() => detail,
        Ok(serde_json::Value::Null) | Err(_) => format!("HTTP {}", status),
        Ok(serde_json::Value::String(_)) => format!("HTTP {}", status),
        Ok(other) => other.to_string(),
    }
}

#[async_trait]
impl PipelineService for HttpPipelineService {
    async fn extract_audio(
        &self,
        video: &SelectedInput,
    ) -> std::result::Result<ExtractResponse, ServiceError> {
        let url = self.url("/extract_audio");
        debug!("POST {} ({} bytes)", url, video.size());

        let form = Form::new().part("video_file", Self::video_part(video)?);
        let response = self.client.post(&url).multipart(form).send().await?;
        Self::read_json(response, "Audio extraction").await
    }

    async fn transcribe(
        &self,
        media: &SelectedInput,
        language_code: &str,
    ) -> std::result::Result<TranscribeResponse, ServiceError> {
        let url = self.url("/transcribe_audio");
        let mut params = vec![("language", language_code)];
        params.extend(self.transcription.options());
        debug!("POST {} ({:?}, {} bytes)", url, params, media.size());

        let form = params.iter().fold(
            Form::new().part("audio_file", Self::video_part(media)?),
            |form, (name, value)| form.text(*name, value.to_string()),
        );
        let response = self
            .client
            .post(&url)
            // The service reads these from the query string as well as the form.
            .query(&params)
            .multipart(form)
            .send()
            .await?;
        Self::read_json(response, "Transcription").await
    }

    async fn fetch_transcript(&self) -> std::result::Result<Vec<u8>, ServiceError> {
        let url = self.url("/download_transcript");
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        Self::read_body(response).await
    }

    async fn translate(
        &self,
        request: &TranslateRequest,
    ) -> std::result::Result<TranslateResponse, ServiceError> {
        let url = self.url("/translate_text");
        debug!(
            "POST {} ({} -> {})",
            url, request.source_language, request.target_language
        );

        let form = match &request.input {
            TranslateInput::File { name, content } => Form::new().part(
                "input_file",
                Part::bytes(content.clone())
                    .file_name(name.clone())
                    .mime_str("text/vtt")?,
            ),
            TranslateInput::Path(path) => Form::new().text("input_path", path.clone()),
        }
        .text("source_language", request.source_language.clone())
        .text("target_language", request.target_language.clone());

        let response = self.client.post(&url).multipart(form).send().await?;
        Self::read_json(response, "Translation").await
    }

    async fn fetch_translated(
        &self,
        reference: &ArtifactReference,
    ) -> std::result::Result<Vec<u8>, ServiceError> {
        let url = match self.download_route {
            DownloadRoute::TranslatedSubtitle => Url::parse(&self.url("/download_translated_subtitle"))
                .map_err(|e| ServiceError::Transport(format!("invalid service URL: {}", e)))?,
            DownloadRoute::Named => self.named_download_url(reference)?,
        };
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        Self::read_body(response).await
    }

    async fn cleanup(&self) -> std::result::Result<CleanupResponse, ServiceError> {
        let url = self.url("/cleanup");
        debug!("POST {}", url);

        let response = self.client.post(&url).json(&json!({})).send().await?;
        Self::read_json(response, "Cleanup").await
    }

    async fn health(&self) -> std::result::Result<HealthStatus, ServiceError> {
        let url = self.url("/health");
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        Self::read_json(response, "Health check").await
    }
}
