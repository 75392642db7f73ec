//! Episode resolution against the podcast search service.
//!
//! Turns the user's free-text title/show pair into a concrete catalog entry,
//! attaching a ready transcript when the service already has one.

use crate::config::SearchSettings;
use crate::episode::{EpisodeMatch, TimedSegment, TranscriptPayload};
use crate::error::{InnsiktError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// One entry from a search response.
#[derive(Debug, Clone)]
pub struct EpisodeCandidate {
    pub id: String,
    pub title: String,
    pub show_name: String,
    pub audio_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub has_transcript: bool,
}

/// Capability interface over the external podcast-search service.
#[async_trait]
pub trait PodcastSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<EpisodeCandidate>>;
    async fn get_transcript(&self, episode_id: &str) -> Result<Option<TranscriptPayload>>;
}

/// Resolves an episode reference to a catalog match.
pub struct EpisodeResolver {
    search: Arc<dyn PodcastSearch>,
}

impl EpisodeResolver {
    pub fn new(search: Arc<dyn PodcastSearch>) -> Self {
        Self { search }
    }

    /// Resolve a title/show pair. `Ok(None)` is the legitimate "not found"
    /// outcome; transport failures propagate since they block the run.
    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        title: &str,
        show_name: Option<&str>,
    ) -> Result<Option<EpisodeMatch>> {
        let query = build_query(title, show_name);
        debug!("Searching catalog for: {}", query);

        let candidates = self.search.search(&query).await?;
        let Some(chosen) = pick_candidate(candidates, show_name) else {
            info!("No catalog match for '{}'", title);
            return Ok(None);
        };

        let embedded_transcript = if chosen.has_transcript {
            match self.search.get_transcript(&chosen.id).await {
                Ok(payload) => payload,
                // A failed transcript fetch is not fatal: the audio path
                // can still serve this run.
                Err(e) => {
                    warn!("Transcript fetch failed, will fall back to audio: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Some(EpisodeMatch {
            id: chosen.id,
            canonical_title: chosen.title,
            canonical_show_name: chosen.show_name,
            audio_url: chosen.audio_url,
            thumbnail_url: chosen.thumbnail_url,
            embedded_transcript,
        }))
    }
}

/// Quote the show name to bias the search toward it.
fn build_query(title: &str, show_name: Option<&str>) -> String {
    match show_name {
        Some(show) => format!("{title} \"{show}\""),
        None => title.to_string(),
    }
}

/// Prefer the candidate whose show name matches the reference show either
/// direction of containment; fall back to the first (most relevant) result.
fn pick_candidate(
    candidates: Vec<EpisodeCandidate>,
    show_name: Option<&str>,
) -> Option<EpisodeCandidate> {
    if let Some(show) = show_name {
        let want = show.to_lowercase();
        let found = candidates.iter().position(|c| {
            let have = c.show_name.to_lowercase();
            !have.is_empty() && (have.contains(&want) || want.contains(&have))
        });
        if let Some(idx) = found {
            return candidates.into_iter().nth(idx);
        }
    }
    candidates.into_iter().next()
}

const SEARCH_QUERY: &str = r#"
query SearchEpisodes($term: String!, $limitPerPage: Int!) {
  searchForTerm(term: $term, filterForTypes: PODCASTEPISODE, limitPerPage: $limitPerPage) {
    podcastEpisodes {
      uuid
      name
      audioUrl
      imageUrl
      taddyTranscribeStatus
      podcastSeries { name imageUrl }
    }
  }
}"#;

const TRANSCRIPT_QUERY: &str = r#"
query EpisodeTranscript($uuid: ID!) {
  getEpisodeTranscript(uuid: $uuid) {
    text
    startTimecode
    endTimecode
  }
}"#;

/// Podcast search client for the Taddy GraphQL API.
///
/// Credentials come from the `TADDY_USER_ID` and `TADDY_API_KEY`
/// environment variables.
pub struct TaddyClient {
    client: reqwest::Client,
    endpoint: String,
    user_id: String,
    api_key: String,
    max_results: u32,
}

impl TaddyClient {
    pub fn from_settings(settings: &SearchSettings) -> Result<Self> {
        let user_id = std::env::var("TADDY_USER_ID")
            .map_err(|_| InnsiktError::Config("TADDY_USER_ID is not set".to_string()))?;
        let api_key = std::env::var("TADDY_API_KEY")
            .map_err(|_| InnsiktError::Config("TADDY_API_KEY is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            user_id,
            api_key,
            max_results: settings.max_results,
        })
    }

    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-USER-ID", &self.user_id)
            .header("X-API-KEY", &self.api_key)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(|e| InnsiktError::ResolverTransport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InnsiktError::ResolverTransport(format!(
                "search service returned {status}: {body}"
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| InnsiktError::ResolverTransport(format!("invalid response body: {e}")))?;

        if let Some(errors) = body.get("errors").and_then(|e| e.as_array()) {
            if !errors.is_empty() {
                return Err(InnsiktError::ResolverTransport(format!(
                    "search service error: {}",
                    errors[0]["message"].as_str().unwrap_or("unknown")
                )));
            }
        }

        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl PodcastSearch for TaddyClient {
    async fn search(&self, query: &str) -> Result<Vec<EpisodeCandidate>> {
        let data = self
            .graphql(
                SEARCH_QUERY,
                json!({ "term": query, "limitPerPage": self.max_results }),
            )
            .await?;

        let episodes = data["searchForTerm"]["podcastEpisodes"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let candidates = episodes
            .iter()
            .filter_map(|episode| {
                Some(EpisodeCandidate {
                    id: episode["uuid"].as_str()?.to_string(),
                    title: episode["name"].as_str().unwrap_or("Unknown Episode").to_string(),
                    show_name: episode["podcastSeries"]["name"]
                        .as_str()
                        .unwrap_or_default()
                        .to_string(),
                    audio_url: episode["audioUrl"].as_str().map(|s| s.to_string()),
                    thumbnail_url: episode["imageUrl"]
                        .as_str()
                        .or_else(|| episode["podcastSeries"]["imageUrl"].as_str())
                        .map(|s| s.to_string()),
                    has_transcript: episode["taddyTranscribeStatus"].as_str()
                        == Some("COMPLETED"),
                })
            })
            .collect();

        Ok(candidates)
    }

    async fn get_transcript(&self, episode_id: &str) -> Result<Option<TranscriptPayload>> {
        let data = self
            .graphql(TRANSCRIPT_QUERY, json!({ "uuid": episode_id }))
            .await?;

        let transcript = &data["getEpisodeTranscript"];

        // Timecoded items are the common case; anything else goes through
        // the generic one-time ingestion.
        if let Some(items) = transcript.as_array() {
            let segments: Vec<TimedSegment> = items
                .iter()
                .filter_map(|item| {
                    let obj = item.as_object()?;
                    Some(TimedSegment {
                        start_seconds: obj.get("startTimecode")?.as_f64()? / 1000.0,
                        end_seconds: obj.get("endTimecode")?.as_f64()? / 1000.0,
                        text: obj.get("text")?.as_str()?.to_string(),
                    })
                })
                .collect();

            if !segments.is_empty() {
                return Ok(Some(TranscriptPayload::TimedSegments(segments)));
            }
        }

        Ok(TranscriptPayload::from_json(transcript))
    }
}
