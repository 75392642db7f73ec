//! Error types for Innsikt.

use thiserror::Error;

/// Library-level error type for Innsikt operations.
#[derive(Error, Debug)]
pub enum InnsiktError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Podcast search failed: {0}")]
    ResolverTransport(String),

    #[error("Episode has no transcript and no audio URL")]
    NoAudioAvailable,

    #[error("Audio extraction failed: {0}")]
    AudioExtraction(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Transcript segment was empty")]
    EmptyTranscript,

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Notion API error: {0}")]
    Notion(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl InnsiktError {
    /// Short stable name for a failure, used in audit records.
    pub fn kind(&self) -> &'static str {
        match self {
            InnsiktError::Config(_) => "config",
            InnsiktError::Validation(_) => "validation",
            InnsiktError::ResolverTransport(_) => "resolver_transport",
            InnsiktError::NoAudioAvailable => "no_audio_available",
            InnsiktError::AudioExtraction(_) => "audio_extraction",
            InnsiktError::Transcription(_) => "transcription",
            InnsiktError::EmptyTranscript => "empty_transcript",
            InnsiktError::Summarization(_) => "summarization",
            InnsiktError::Notion(_) => "notion",
            InnsiktError::ToolNotFound(_) => "tool_not_found",
            InnsiktError::ToolFailed(_) => "tool_failed",
            InnsiktError::Io(_) => "io",
            InnsiktError::Json(_) => "json",
            InnsiktError::TomlParse(_) => "toml_parse",
            InnsiktError::Http(_) => "http",
        }
    }
}

/// Result type alias for Innsikt operations.
pub type Result<T> = std::result::Result<T, InnsiktError>;
