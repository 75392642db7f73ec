//! The insight-acquisition pipeline.
//!
//! Sequences resolution, transcript acquisition and summarization into one
//! run per request: resolve the reference against the catalog, reuse an
//! embedded transcript when one covers the timestamp, otherwise extract and
//! transcribe an audio snippet, then condense the text into takeaways.
//! Owns the temp-resource lifecycle and emits one audit record per run.

use crate::audio::AudioFetcher;
use crate::audit::{AuditEvent, AuditSink, TracingAuditSink, WebhookAuditSink};
use crate::config::{Prompts, Settings};
use crate::episode::{
    EpisodeMatch, EpisodeReference, InsightResult, TranscriptOrigin, TranscriptSegment,
};
use crate::error::{InnsiktError, Result};
use crate::exec::TokioExecutor;
use crate::resolver::{EpisodeResolver, PodcastSearch, TaddyClient};
use crate::segmenter;
use crate::summarizer::{GptSummarizer, Summarizer};
use crate::transcription::{Transcriber, WhisperTranscriber};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// The main pipeline for capturing an insight from a playing episode.
pub struct Pipeline {
    resolver: EpisodeResolver,
    fetcher: AudioFetcher,
    transcriber: Arc<dyn Transcriber>,
    summarizer: Arc<dyn Summarizer>,
    audit: Arc<dyn AuditSink>,
    window_seconds: u32,
}

impl Pipeline {
    /// Build a pipeline with production collaborators from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let search: Arc<dyn PodcastSearch> = Arc::new(TaddyClient::from_settings(&settings.search)?);

        let fetcher = AudioFetcher::new(
            Arc::new(TokioExecutor),
            settings.audio.clone(),
            settings.temp_dir(),
        );

        let transcriber: Arc<dyn Transcriber> = Arc::new(WhisperTranscriber::new(
            &settings.transcription.model,
            Duration::from_secs(settings.transcription.timeout_secs),
        ));

        let summarizer: Arc<dyn Summarizer> = Arc::new(GptSummarizer::new(
            &settings.summary.model,
            Duration::from_secs(settings.summary.timeout_secs),
            prompts,
        ));

        let audit: Arc<dyn AuditSink> = match &settings.audit.webhook_url {
            Some(url) => Arc::new(WebhookAuditSink::new(&settings.audit, url.clone())?),
            None => Arc::new(TracingAuditSink),
        };

        Ok(Self::with_components(
            search,
            fetcher,
            transcriber,
            summarizer,
            audit,
            settings.audio.window_seconds,
        ))
    }

    /// Build a pipeline from explicit collaborators.
    pub fn with_components(
        search: Arc<dyn PodcastSearch>,
        fetcher: AudioFetcher,
        transcriber: Arc<dyn Transcriber>,
        summarizer: Arc<dyn Summarizer>,
        audit: Arc<dyn AuditSink>,
        window_seconds: u32,
    ) -> Self {
        Self {
            resolver: EpisodeResolver::new(search),
            fetcher,
            transcriber,
            summarizer,
            audit,
            window_seconds,
        }
    }

    /// Run one capture. "Not found" is a successful outcome with
    /// `manual_mode = true`; everything else either completes or fails with
    /// a tagged error. Exactly one audit record is emitted per run, right
    /// before returning, and its failure never alters the outcome.
    #[instrument(skip(self, reference), fields(title = %reference.title))]
    pub async fn capture(&self, reference: &EpisodeReference) -> Result<InsightResult> {
        let outcome = self.run(reference).await;
        self.emit_audit(reference, &outcome).await;
        outcome
    }

    async fn run(&self, reference: &EpisodeReference) -> Result<InsightResult> {
        let matched = self
            .resolver
            .resolve(&reference.title, reference.show_name.as_deref())
            .await?;

        let Some(matched) = matched else {
            info!("No catalog match; user will take notes manually");
            return Ok(InsightResult::manual(reference));
        };

        let segment = self.obtain_transcript(reference, &matched).await?;

        let text = segment.text.trim().to_string();
        if text.is_empty() {
            // Don't waste a model call on nothing.
            return Err(InnsiktError::EmptyTranscript);
        }

        let summary = self.summarizer.summarize(&text, &reference.title).await?;

        Ok(InsightResult::captured(
            reference,
            matched.thumbnail_url.clone(),
            text,
            summary,
        ))
    }

    /// Hybrid transcript acquisition: embedded transcript first, audio
    /// extraction and transcription as the fallback.
    async fn obtain_transcript(
        &self,
        reference: &EpisodeReference,
        matched: &EpisodeMatch,
    ) -> Result<TranscriptSegment> {
        if let Some(payload) = &matched.embedded_transcript {
            if let Some(text) =
                segmenter::extract(payload, reference.timestamp_seconds, self.window_seconds)
            {
                if !text.trim().is_empty() {
                    debug!("Using embedded transcript window");
                    return Ok(TranscriptSegment {
                        text,
                        origin: TranscriptOrigin::Embedded,
                    });
                }
            }
            debug!("Embedded transcript unusable at this timestamp, trying audio");
        }

        let audio_url = matched
            .audio_url
            .as_deref()
            .ok_or(InnsiktError::NoAudioAvailable)?;

        let snippet = self
            .fetcher
            .extract_snippet(audio_url, reference.timestamp_seconds, self.window_seconds)
            .await?;

        let transcribed = self.transcriber.transcribe(&snippet).await;
        // The snippet file is released here whether or not transcription
        // succeeded.
        drop(snippet);

        Ok(TranscriptSegment {
            text: transcribed?,
            origin: TranscriptOrigin::Transcribed,
        })
    }

    async fn emit_audit(&self, reference: &EpisodeReference, outcome: &Result<InsightResult>) {
        let outcome_name = match outcome {
            Ok(result) if result.manual_mode => "manual".to_string(),
            Ok(_) => "captured".to_string(),
            Err(e) => e.kind().to_string(),
        };

        let event = AuditEvent {
            occurred_at: chrono::Utc::now(),
            episode_title: reference.title.clone(),
            show_name: reference.show_name.clone(),
            timestamp_seconds: reference.timestamp_seconds,
            outcome: outcome_name,
        };

        if let Err(e) = self.audit.record(&event).await {
            warn!("Audit record dropped: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AudioSettings, FetchStrategy};
    use crate::episode::{AudioSnippet, TranscriptPayload};
    use crate::exec::{CommandExecutor, CommandOutput};
    use crate::resolver::EpisodeCandidate;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeSearch {
        candidates: Vec<EpisodeCandidate>,
        transcript: Option<TranscriptPayload>,
    }

    #[async_trait]
    impl PodcastSearch for FakeSearch {
        async fn search(&self, _query: &str) -> Result<Vec<EpisodeCandidate>> {
            Ok(self.candidates.clone())
        }

        async fn get_transcript(&self, _episode_id: &str) -> Result<Option<TranscriptPayload>> {
            Ok(self.transcript.clone())
        }
    }

    /// Executor that simulates both audio tools by writing plausible files.
    struct WritingExecutor;

    #[async_trait]
    impl CommandExecutor for WritingExecutor {
        async fn run(
            &self,
            program: &str,
            args: &[String],
            _timeout: Duration,
        ) -> Result<CommandOutput> {
            match program {
                "yt-dlp" => {
                    let template = args
                        .iter()
                        .position(|a| a == "--output")
                        .map(|i| args[i + 1].clone())
                        .unwrap();
                    std::fs::write(template.replace("%(ext)s", "mp3"), vec![0u8; 50_000]).unwrap();
                }
                "ffmpeg" => {
                    std::fs::write(args.last().unwrap(), vec![0u8; 4_000]).unwrap();
                }
                other => panic!("unexpected program: {other}"),
            }
            Ok(CommandOutput {
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    /// Executor that fails the run if any subprocess is ever launched.
    struct RefusingExecutor {
        invoked: Arc<AtomicBool>,
    }

    #[async_trait]
    impl CommandExecutor for RefusingExecutor {
        async fn run(&self, _: &str, _: &[String], _: Duration) -> Result<CommandOutput> {
            self.invoked.store(true, Ordering::SeqCst);
            Err(InnsiktError::ToolFailed("should not run".into()))
        }
    }

    struct FakeTranscriber {
        text: String,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, _snippet: &AudioSnippet) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    struct FakeSummarizer;

    #[async_trait]
    impl Summarizer for FakeSummarizer {
        async fn summarize(&self, _transcript: &str, _title: &str) -> Result<Vec<String>> {
            Ok(vec!["bullet one".into(), "bullet two".into()])
        }
    }

    struct RecordingAudit {
        outcomes: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AuditSink for RecordingAudit {
        async fn record(&self, event: &AuditEvent) -> Result<()> {
            self.outcomes.lock().unwrap().push(event.outcome.clone());
            Ok(())
        }
    }

    fn reference(title: &str) -> EpisodeReference {
        EpisodeReference {
            title: title.to_string(),
            show_name: Some("The Show".to_string()),
            timestamp_seconds: 12,
            source_url: None,
        }
    }

    fn candidate(audio_url: Option<&str>, has_transcript: bool) -> EpisodeCandidate {
        EpisodeCandidate {
            id: "ep-1".to_string(),
            title: "Canonical Episode Title".to_string(),
            show_name: "The Show".to_string(),
            audio_url: audio_url.map(|s| s.to_string()),
            thumbnail_url: Some("https://example.com/cover.jpg".to_string()),
            has_transcript,
        }
    }

    struct Harness {
        pipeline: Pipeline,
        temp_dir: tempfile::TempDir,
        audit_outcomes: Arc<RecordingAudit>,
        transcriber_calls: Arc<AtomicUsize>,
        executor_invoked: Arc<AtomicBool>,
    }

    fn harness(
        search: FakeSearch,
        executor_writes_files: bool,
        transcribed_text: &str,
    ) -> Harness {
        let temp_dir = tempfile::tempdir().unwrap();
        let executor_invoked = Arc::new(AtomicBool::new(false));
        let executor: Arc<dyn CommandExecutor> = if executor_writes_files {
            Arc::new(WritingExecutor)
        } else {
            Arc::new(RefusingExecutor {
                invoked: executor_invoked.clone(),
            })
        };

        let fetcher = AudioFetcher::new(
            executor,
            AudioSettings {
                strategy: FetchStrategy::Download,
                window_seconds: 30,
                min_download_bytes: 10_000,
                min_snippet_bytes: 1_000,
                download_timeout_secs: 300,
                trim_timeout_secs: 60,
            },
            temp_dir.path().to_path_buf(),
        );

        let transcriber_calls = Arc::new(AtomicUsize::new(0));
        let audit = Arc::new(RecordingAudit {
            outcomes: Mutex::new(Vec::new()),
        });

        let pipeline = Pipeline::with_components(
            Arc::new(search),
            fetcher,
            Arc::new(FakeTranscriber {
                text: transcribed_text.to_string(),
                calls: transcriber_calls.clone(),
            }),
            Arc::new(FakeSummarizer),
            audit.clone(),
            30,
        );

        Harness {
            pipeline,
            temp_dir,
            audit_outcomes: audit,
            transcriber_calls,
            executor_invoked,
        }
    }

    fn leftover_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().flatten().count()
    }

    #[tokio::test]
    async fn test_embedded_transcript_skips_audio_entirely() {
        let search = FakeSearch {
            candidates: vec![candidate(Some("https://example.com/ep.mp3"), true)],
            transcript: Some(TranscriptPayload::TimedSegments(vec![
                crate::episode::TimedSegment {
                    start_seconds: 10.0,
                    end_seconds: 15.0,
                    text: "embedded words".to_string(),
                },
            ])),
        };
        let h = harness(search, false, "unused");

        let result = h.pipeline.capture(&reference("My Episode")).await.unwrap();

        assert!(!result.manual_mode);
        assert_eq!(result.transcript.as_deref(), Some("embedded words"));
        assert_eq!(h.transcriber_calls.load(Ordering::SeqCst), 0);
        assert!(!h.executor_invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_audio_fallback_transcribes_and_cleans_up() {
        let search = FakeSearch {
            candidates: vec![candidate(Some("https://example.com/ep.mp3"), false)],
            transcript: None,
        };
        let h = harness(search, true, "spoken words from audio");

        let result = h.pipeline.capture(&reference("My Episode")).await.unwrap();

        assert_eq!(result.transcript.as_deref(), Some("spoken words from audio"));
        assert_eq!(result.summary.as_ref().unwrap().len(), 2);
        assert_eq!(h.transcriber_calls.load(Ordering::SeqCst), 1);
        assert_eq!(leftover_files(h.temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_no_match_is_manual_mode_not_an_error() {
        let search = FakeSearch {
            candidates: vec![],
            transcript: None,
        };
        let h = harness(search, false, "unused");

        let result = h.pipeline.capture(&reference("Unknown Episode")).await.unwrap();

        assert!(result.manual_mode);
        assert!(result.transcript.is_none());
        assert!(result.summary.is_none());
        assert_eq!(
            h.audit_outcomes.outcomes.lock().unwrap().as_slice(),
            ["manual"]
        );
    }

    #[tokio::test]
    async fn test_no_transcript_and_no_audio_fails() {
        let search = FakeSearch {
            candidates: vec![candidate(None, false)],
            transcript: None,
        };
        let h = harness(search, false, "unused");

        let err = h.pipeline.capture(&reference("My Episode")).await.unwrap_err();
        assert!(matches!(err, InnsiktError::NoAudioAvailable));
        assert_eq!(
            h.audit_outcomes.outcomes.lock().unwrap().as_slice(),
            ["no_audio_available"]
        );
    }

    #[tokio::test]
    async fn test_blank_transcription_fails_before_summarizing() {
        let search = FakeSearch {
            candidates: vec![candidate(Some("https://example.com/ep.mp3"), false)],
            transcript: None,
        };
        let h = harness(search, true, "   ");

        let err = h.pipeline.capture(&reference("My Episode")).await.unwrap_err();
        assert!(matches!(err, InnsiktError::EmptyTranscript));
        // Snippet removed even though the run failed downstream of it.
        assert_eq!(leftover_files(h.temp_dir.path()), 0);
    }

    #[tokio::test]
    async fn test_result_keeps_the_callers_identity() {
        let search = FakeSearch {
            candidates: vec![candidate(Some("https://example.com/ep.mp3"), false)],
            transcript: None,
        };
        let h = harness(search, true, "words");

        let result = h.pipeline.capture(&reference("What The User Saw")).await.unwrap();

        // The catalog's canonical title is only a lookup aid.
        assert_eq!(result.episode_title, "What The User Saw");
        assert_eq!(result.show_name.as_deref(), Some("The Show"));
        assert_eq!(
            result.thumbnail_url.as_deref(),
            Some("https://example.com/cover.jpg")
        );
    }

    #[tokio::test]
    async fn test_every_outcome_emits_one_audit_record() {
        let search = FakeSearch {
            candidates: vec![candidate(Some("https://example.com/ep.mp3"), false)],
            transcript: None,
        };
        let h = harness(search, true, "words");

        h.pipeline.capture(&reference("My Episode")).await.unwrap();
        h.pipeline.capture(&reference("My Episode")).await.unwrap();

        assert_eq!(
            h.audit_outcomes.outcomes.lock().unwrap().as_slice(),
            ["captured", "captured"]
        );
    }
}
