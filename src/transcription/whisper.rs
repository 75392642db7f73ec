//! OpenAI Whisper transcription implementation.

use super::Transcriber;
use crate::episode::AudioSnippet;
use crate::error::{InnsiktError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// OpenAI Whisper-based transcriber.
///
/// Snippets are short (well under a minute), so a single API call suffices
/// and a failure is terminal for the run. No retry.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl WhisperTranscriber {
    pub fn new(model: &str, timeout: Duration) -> Self {
        Self {
            client: create_client_with_timeout(timeout),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self, snippet), fields(path = %snippet.local_path.display()))]
    async fn transcribe(&self, snippet: &AudioSnippet) -> Result<String> {
        debug!("Transcribing {} byte snippet", snippet.byte_size);

        let file_bytes = tokio::fs::read(&snippet.local_path).await?;

        let file_name = snippet
            .local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("snippet.mp3")
            .to_string();

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(file_name, file_bytes))
            .model(&self.model)
            .response_format(AudioResponseFormat::Json)
            .build()
            .map_err(|e| InnsiktError::Transcription(format!("Failed to build request: {e}")))?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| InnsiktError::Transcription(format!("Whisper API error: {e}")))?;

        Ok(response.text.trim().to_string())
    }
}
