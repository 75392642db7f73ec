//! Bullet-takeaway summarization.
//!
//! One chat-completion call per run, followed by a best-effort parse of the
//! model's free-text reply. Formatting drift alone never fails a run: when
//! no bullet markers survive, the whole reply becomes a single bullet.

use crate::config::Prompts;
use crate::error::{InnsiktError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// Maximum bullets kept from a model reply.
pub const MAX_BULLETS: usize = 3;

/// Trait for summarization services.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Condense a transcript excerpt into 1-3 short takeaway bullets.
    async fn summarize(&self, transcript: &str, episode_title: &str) -> Result<Vec<String>>;
}

/// Summarizer backed by an OpenAI chat model.
pub struct GptSummarizer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    prompts: Prompts,
}

impl GptSummarizer {
    pub fn new(model: &str, timeout: Duration, prompts: Prompts) -> Self {
        Self {
            client: create_client_with_timeout(timeout),
            model: model.to_string(),
            prompts,
        }
    }
}

#[async_trait]
impl Summarizer for GptSummarizer {
    #[instrument(skip(self, transcript), fields(title = %episode_title))]
    async fn summarize(&self, transcript: &str, episode_title: &str) -> Result<Vec<String>> {
        let mut vars = HashMap::new();
        vars.insert("title".to_string(), episode_title.to_string());
        vars.insert("transcript".to_string(), transcript.to_string());

        let user_prompt = self
            .prompts
            .render_with_custom(&self.prompts.summary.user, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.summary.system.clone())
                .build()
                .map_err(|e| InnsiktError::Summarization(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| InnsiktError::Summarization(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.4)
            .build()
            .map_err(|e| InnsiktError::Summarization(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| InnsiktError::Summarization(format!("Chat API error: {e}")))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| InnsiktError::Summarization("Empty response from model".to_string()))?;

        let bullets = parse_bullets(content);
        if bullets.is_empty() {
            return Err(InnsiktError::Summarization(
                "Model returned a blank summary".to_string(),
            ));
        }

        debug!("Parsed {} takeaway bullet(s)", bullets.len());
        Ok(bullets)
    }
}

/// Parse takeaway bullets from a model's free-text reply.
///
/// Lines starting with `-`, `•`, `*` or a numbered marker (`1.`) followed by
/// whitespace are kept, stripped of their marker, at most [`MAX_BULLETS`] of
/// them. When no line matches, the entire trimmed reply is returned as a
/// single bullet, so a model that ignored the format still yields something
/// usable.
pub fn parse_bullets(raw: &str) -> Vec<String> {
    let marker = Regex::new(r"^\s*(?:[-•*]|\d+\.)\s+(.*)$").expect("Invalid regex");

    let bullets: Vec<String> = raw
        .lines()
        .filter_map(|line| marker.captures(line))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|b| !b.is_empty())
        .take(MAX_BULLETS)
        .collect();

    if !bullets.is_empty() {
        return bullets;
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Vec::new()
    } else {
        vec![trimmed.to_string()]
    }
}
