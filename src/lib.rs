//! capflow - Subtitle generation client
//!
//! Orchestrates a remote captioning service: audio extraction, transcription
//! and translation run as one fail-fast pipeline whose progress is published
//! to observers, followed by download of the translated WebVTT file.

pub mod caption;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod input;
pub mod language;
pub mod selection;
pub mod service;
pub mod stage;
pub mod workflow;
