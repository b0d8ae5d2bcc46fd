use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CapflowError, Result};

/// Languages the captioning service supports.
///
/// Two encodings exist per language: the two-letter code sent with the
/// transcription request and the locale name sent with the translation request.
/// They are not interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Hindi,
    German,
    Chinese,
    Korean,
    Japanese,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::Hindi,
        Language::German,
        Language::Chinese,
        Language::Korean,
        Language::Japanese,
    ];

    /// Two-letter code used by the transcription request
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::German => "de",
            Self::Chinese => "zh",
            Self::Korean => "ko",
            Self::Japanese => "ja",
        }
    }

    /// Locale name used by the translation request
    pub fn locale_name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::German => "German",
            Self::Chinese => "Chinese",
            Self::Korean => "Korean",
            Self::Japanese => "Japanese",
        }
    }

    /// Lowercase selection value
    pub fn label(&self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Hindi => "hindi",
            Self::German => "german",
            Self::Chinese => "chinese",
            Self::Korean => "korean",
            Self::Japanese => "japanese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.locale_name())
    }
}

impl FromStr for Language {
    type Err = CapflowError;

    /// Accepts the label, the locale name or the two-letter code, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        if needle.is_empty() {
            return Err(CapflowError::Precondition(
                "Please select both source and target languages".to_string(),
            ));
        }

        Language::ALL
            .into_iter()
            .find(|lang| lang.label() == needle || lang.code() == needle)
            .ok_or_else(|| {
                CapflowError::Precondition(format!(
                    "Unsupported language '{}'. Valid languages: {}",
                    s.trim(),
                    Language::ALL.map(|l| l.label()).join(", ")
                ))
            })
    }
}

/// Source and target language of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageChoice {
    pub source: Language,
    pub target: Language,
}

impl LanguageChoice {
    pub fn new(source: Language, target: Language) -> Result<Self> {
        let choice = Self { source, target };
        choice.validate()?;
        Ok(choice)
    }

    pub fn parse(source: &str, target: &str) -> Result<Self> {
        Self::new(source.parse()?, target.parse()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source == self.target {
            return Err(CapflowError::Precondition(
                "Source and target language cannot be the same".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for LanguageChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}
