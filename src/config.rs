use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, CapflowError};

fn default_user_agent() -> String {
    concat!("capflow/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_cleanup_delay_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    pub cleanup: CleanupConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the captioning service
    pub base_url: String,
    /// Transport timeout in seconds; no timeout when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// How the transcript is handed to the translation endpoint
    pub translate_field: TranslateField,
    /// Server-side name of the transcription artifact
    pub transcript_name: String,
    /// Route used to fetch the translated artifact
    pub download_route: DownloadRoute,
    /// Server-side and suggested local name of the translated artifact
    pub translated_name: String,
}

/// Optional whisper settings forwarded to the transcription endpoint.
/// Unset fields are omitted so the service applies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute_type: Option<String>,
}

impl TranscriptionConfig {
    /// The configured options as `(name, value)` pairs, unset ones skipped.
    pub fn options(&self) -> Vec<(&'static str, &str)> {
        [
            ("model_size", &self.model_size),
            ("device", &self.device),
            ("compute_type", &self.compute_type),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranslateField {
    /// Upload the fetched transcript bytes as `input_file`
    InputFile,
    /// Send the transcript's server-side name as `input_path`
    InputPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadRoute {
    /// GET /download_translated_subtitle
    TranslatedSubtitle,
    /// GET /download/{filename}
    Named,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Ask the service to discard intermediate files after a download
    pub auto_cleanup: bool,
    /// Delay between a successful download and the cleanup request
    #[serde(default = "default_cleanup_delay_secs")]
    pub delay_secs: u64,
    /// Send a best-effort cleanup when the session ends
    pub on_exit: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                base_url: "http://localhost:8000".to_string(),
                timeout_secs: None,
                user_agent: default_user_agent(),
            },
            pipeline: PipelineConfig {
                translate_field: TranslateField::InputFile,
                transcript_name: "transcription.vtt".to_string(),
                download_route: DownloadRoute::TranslatedSubtitle,
                translated_name: "transcript_translated.vtt".to_string(),
            },
            transcription: TranscriptionConfig::default(),
            cleanup: CleanupConfig {
                auto_cleanup: true,
                delay_secs: default_cleanup_delay_secs(),
                on_exit: true,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CapflowError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| CapflowError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml()?;

        std::fs::write(path, content)
            .map_err(|e| CapflowError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CapflowError::Config(format!("Failed to serialize config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        let base = self.service.base_url.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(CapflowError::Config(format!(
                "service.base_url must be an http(s) URL, got '{}'",
                self.service.base_url
            )));
        }
        if self
            .transcription
            .options()
            .iter()
            .any(|(_, value)| value.trim().is_empty())
        {
            return Err(CapflowError::Config(
                "transcription options must not be empty when set".to_string(),
            ));
        }
        if self.pipeline.transcript_name.trim().is_empty()
            || self.pipeline.translated_name.trim().is_empty()
        {
            return Err(CapflowError::Config(
                "pipeline artifact names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.service.base_url, "http://localhost:8000");
        assert_eq!(config.pipeline.translate_field, TranslateField::InputFile);
        assert_eq!(config.pipeline.translated_name, "transcript_translated.vtt");
        assert!(config.service.timeout_secs.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capflow.toml");

        let mut config = Config::default();
        config.service.base_url = "http://media-box:9000".to_string();
        config.pipeline.download_route = DownloadRoute::Named;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.service.base_url, "http://media-box:9000");
        assert_eq!(loaded.pipeline.download_route, DownloadRoute::Named);
    }

    #[test]
    fn test_optional_fields_default() {
        let toml = r#"
            [service]
            base_url = "http://localhost:8000"

            [pipeline]
            translate_field = "InputPath"
            transcript_name = "transcription.txt"
            download_route = "TranslatedSubtitle"
            translated_name = "translated_text.txt"

            [cleanup]
            auto_cleanup = false
            on_exit = false
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cleanup.delay_secs, 5);
        assert!(config.service.user_agent.starts_with("capflow/"));
        assert_eq!(config.pipeline.translate_field, TranslateField::InputPath);
        assert!(config.transcription.options().is_empty());
    }

    #[test]
    fn test_transcription_options_skip_unset() {
        let toml = r#"
            [service]
            base_url = "http://localhost:8000"

            [pipeline]
            translate_field = "InputFile"
            transcript_name = "transcription.vtt"
            download_route = "TranslatedSubtitle"
            translated_name = "transcript_translated.vtt"

            [transcription]
            model_size = "small"
            compute_type = "int8"

            [cleanup]
            auto_cleanup = true
            on_exit = true
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        assert_eq!(
            config.transcription.options(),
            vec![("model_size", "small"), ("compute_type", "int8")]
        );
        assert!(!config.to_toml().unwrap().contains("device"));
    }

    #[test]
    fn test_rejects_blank_transcription_option() {
        let mut config = Config::default();
        config.transcription.device = Some(" ".to_string());
        assert!(matches!(config.validate(), Err(CapflowError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let mut config = Config::default();
        config.service.base_url = "localhost:8000".to_string();
        assert!(matches!(config.validate(), Err(CapflowError::Config(_))));
    }
}
