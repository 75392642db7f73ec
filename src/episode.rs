//! Core data model for insight capture.
//!
//! The types here flow through the pipeline in one direction:
//! `EpisodeReference` (what the user is hearing) is resolved into an
//! `EpisodeMatch` (what the catalog knows), which yields a transcript
//! either embedded or transcribed from an `AudioSnippet`, and everything
//! ends up aggregated into an `InsightResult`.

use crate::error::{InnsiktError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// The user-supplied identification of what is currently playing.
///
/// Built once by [`EpisodeReference::normalize`] at the pipeline entry so
/// downstream stages never re-check for absent fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeReference {
    pub title: String,
    pub show_name: Option<String>,
    pub timestamp_seconds: u32,
    pub source_url: Option<String>,
}

impl EpisodeReference {
    /// Normalize raw request fields into a fully-populated reference.
    ///
    /// The title is required; a missing or blank title fails before any
    /// external call is made. Blank optional fields collapse to `None`.
    pub fn normalize(
        title: Option<String>,
        show_name: Option<String>,
        timestamp_seconds: Option<u32>,
        source_url: Option<String>,
    ) -> Result<Self> {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| InnsiktError::Validation("title is required".to_string()))?;

        Ok(Self {
            title,
            show_name: non_blank(show_name),
            timestamp_seconds: timestamp_seconds.unwrap_or(0),
            source_url: non_blank(source_url),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A search service's candidate resolution of a reference to a catalog entry.
#[derive(Debug, Clone)]
pub struct EpisodeMatch {
    pub id: String,
    pub canonical_title: String,
    pub canonical_show_name: String,
    pub audio_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub embedded_transcript: Option<TranscriptPayload>,
}

/// A single time-coded transcript segment.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedSegment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

/// A transcript as known to the search service.
///
/// External services return transcripts in two shapes: a single flat string,
/// or an ordered list of time-coded segments with inconsistent field names.
/// The shape is decided once here, at ingestion; readers pattern-match on a
/// closed union instead of probing JSON fields.
#[derive(Debug, Clone, PartialEq)]
pub enum TranscriptPayload {
    FlatText(String),
    TimedSegments(Vec<TimedSegment>),
}

impl TranscriptPayload {
    /// Ingest a loose JSON transcript into a normalized payload.
    ///
    /// Accepts a plain string, or an array of objects keyed by
    /// `start`/`start_time`, `end`/`end_time` and `text`/`words`.
    /// Returns `None` for any other shape, which signals the caller to fall
    /// back to the audio path.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => {
                Some(TranscriptPayload::FlatText(s.clone()))
            }
            serde_json::Value::Array(items) => {
                let segments: Vec<TimedSegment> = items
                    .iter()
                    .filter_map(|item| {
                        let obj = item.as_object()?;
                        Some(TimedSegment {
                            start_seconds: number_field(obj, &["start", "start_time"])?,
                            end_seconds: number_field(obj, &["end", "end_time"])?,
                            text: text_field(obj, &["text", "words"])?,
                        })
                    })
                    .collect();

                if segments.is_empty() {
                    None
                } else {
                    Some(TranscriptPayload::TimedSegments(segments))
                }
            }
            _ => None,
        }
    }
}

fn number_field(obj: &serde_json::Map<String, serde_json::Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(|v| v.as_f64()))
}

fn text_field(obj: &serde_json::Map<String, serde_json::Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

/// Where a transcript segment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptOrigin {
    Embedded,
    Transcribed,
}

/// The transcript window backing an insight.
///
/// Invariant: `text` is non-empty after trimming; the pipeline fails a run
/// before constructing a segment from blank text.
#[derive(Debug, Clone)]
pub struct TranscriptSegment {
    pub text: String,
    pub origin: TranscriptOrigin,
}

/// A short, time-bounded audio excerpt cut from a full episode.
///
/// Exclusively owned by the pipeline run that created it. The backing file
/// is removed when the snippet is dropped, so a run can never leak audio to
/// disk regardless of how it terminates.
#[derive(Debug)]
pub struct AudioSnippet {
    pub local_path: PathBuf,
    pub start_offset_seconds: u32,
    pub duration_seconds: u32,
    pub byte_size: u64,
}

impl Drop for AudioSnippet {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.local_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove audio snippet {:?}: {}", self.local_path, e);
            }
        }
    }
}

/// The saved outcome of one capture run.
///
/// `manual_mode = true` means no catalog match was found; transcript and
/// summary are absent and the user supplies their own notes downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResult {
    pub episode_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Vec<String>>,
    pub timestamp_seconds: u32,
    pub manual_mode: bool,
}

impl InsightResult {
    /// Outcome when no catalog match was found.
    pub fn manual(reference: &EpisodeReference) -> Self {
        Self {
            episode_title: reference.title.clone(),
            show_name: reference.show_name.clone(),
            thumbnail_url: None,
            transcript: None,
            summary: None,
            timestamp_seconds: reference.timestamp_seconds,
            manual_mode: true,
        }
    }

    /// Outcome of a completed capture.
    ///
    /// The caller-supplied title and show are authoritative for identity;
    /// the resolved match only contributes the thumbnail.
    pub fn captured(
        reference: &EpisodeReference,
        thumbnail_url: Option<String>,
        transcript: String,
        summary: Vec<String>,
    ) -> Self {
        Self {
            episode_title: reference.title.clone(),
            show_name: reference.show_name.clone(),
            thumbnail_url,
            transcript: Some(transcript),
            summary: Some(summary),
            timestamp_seconds: reference.timestamp_seconds,
            manual_mode: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_requires_title() {
        let err = EpisodeReference::normalize(None, None, None, None);
        assert!(matches!(err, Err(InnsiktError::Validation(_))));

        let err = EpisodeReference::normalize(Some("   ".to_string()), None, None, None);
        assert!(matches!(err, Err(InnsiktError::Validation(_))));
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let reference = EpisodeReference::normalize(
            Some("  The Episode  ".to_string()),
            Some("".to_string()),
            None,
            None,
        )
        .unwrap();

        assert_eq!(reference.title, "The Episode");
        assert_eq!(reference.show_name, None);
        assert_eq!(reference.timestamp_seconds, 0);
        assert_eq!(reference.source_url, None);
    }

    #[test]
    fn test_payload_from_flat_string() {
        let payload = TranscriptPayload::from_json(&json!("hello world")).unwrap();
        assert_eq!(payload, TranscriptPayload::FlatText("hello world".to_string()));
    }

    #[test]
    fn test_payload_from_segments_standard_keys() {
        let payload = TranscriptPayload::from_json(&json!([
            {"start": 0.0, "end": 4.5, "text": "first"},
            {"start": 4.5, "end": 9.0, "text": "second"},
        ]))
        .unwrap();

        match payload {
            TranscriptPayload::TimedSegments(segments) => {
                assert_eq!(segments.len(), 2);
                assert_eq!(segments[0].text, "first");
                assert_eq!(segments[1].start_seconds, 4.5);
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_payload_from_segments_alternate_keys() {
        let payload = TranscriptPayload::from_json(&json!([
            {"start_time": 10, "end_time": 15, "words": "alternate"},
        ]))
        .unwrap();

        match payload {
            TranscriptPayload::TimedSegments(segments) => {
                assert_eq!(segments[0].start_seconds, 10.0);
                assert_eq!(segments[0].end_seconds, 15.0);
                assert_eq!(segments[0].text, "alternate");
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_payload_rejects_unknown_shapes() {
        assert_eq!(TranscriptPayload::from_json(&json!(42)), None);
        assert_eq!(TranscriptPayload::from_json(&json!({})), None);
        assert_eq!(TranscriptPayload::from_json(&json!([])), None);
        assert_eq!(TranscriptPayload::from_json(&json!([{"no": "fields"}])), None);
        assert_eq!(TranscriptPayload::from_json(&json!("   ")), None);
    }

    #[test]
    fn test_snippet_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp3");
        std::fs::write(&path, b"audio").unwrap();

        let snippet = AudioSnippet {
            local_path: path.clone(),
            start_offset_seconds: 0,
            duration_seconds: 40,
            byte_size: 5,
        };
        drop(snippet);

        assert!(!path.exists());
    }
}
