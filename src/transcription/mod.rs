//! Speech-to-text for audio snippets.

mod whisper;

pub use whisper::WhisperTranscriber;

use crate::episode::AudioSnippet;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe a snippet and return its plain text.
    async fn transcribe(&self, snippet: &AudioSnippet) -> Result<String>;
}
