//! Audio snippet extraction.
//!
//! Obtains a short, time-bounded clip of a remote episode for transcription.
//! Two strategies are supported: download the whole file with yt-dlp and cut
//! the window out with ffmpeg (default, correctness-first), or let ffmpeg
//! seek directly into the remote URL when the host honors range requests.
//!
//! Every file this module creates carries a per-run unique name, and every
//! exit path removes whatever was created, so concurrent runs never collide
//! and failed runs never leave audio behind.

use crate::config::{AudioSettings, FetchStrategy};
use crate::episode::AudioSnippet;
use crate::error::{InnsiktError, Result};
use crate::exec::CommandExecutor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Some podcast hosts reject unidentified clients, so both tools present a
/// browser-like request signature.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Seconds of context kept before the requested timestamp.
const LEAD_IN_SECONDS: u32 = 5;

/// Extracts trimmed audio clips from remote episode URLs.
pub struct AudioFetcher {
    executor: Arc<dyn CommandExecutor>,
    settings: AudioSettings,
    temp_dir: PathBuf,
}

impl AudioFetcher {
    pub fn new(
        executor: Arc<dyn CommandExecutor>,
        settings: AudioSettings,
        temp_dir: PathBuf,
    ) -> Self {
        Self {
            executor,
            settings,
            temp_dir,
        }
    }

    /// Obtain a local clip covering `[timestamp - 5, timestamp + window + 5]`.
    #[instrument(skip(self), fields(timestamp = timestamp_seconds))]
    pub async fn extract_snippet(
        &self,
        audio_url: &str,
        timestamp_seconds: u32,
        window_seconds: u32,
    ) -> Result<AudioSnippet> {
        let parsed = url::Url::parse(audio_url)
            .map_err(|e| InnsiktError::AudioExtraction(format!("invalid audio URL: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(InnsiktError::AudioExtraction(format!(
                "unsupported audio URL scheme: {}",
                parsed.scheme()
            )));
        }

        std::fs::create_dir_all(&self.temp_dir)?;

        let start_time = timestamp_seconds.saturating_sub(LEAD_IN_SECONDS);
        let total_duration = window_seconds + 2 * LEAD_IN_SECONDS;
        let run_tag = format!(
            "{}_{}",
            chrono::Utc::now().timestamp_millis(),
            uuid::Uuid::new_v4().simple()
        );

        match self.settings.strategy {
            FetchStrategy::Download => {
                self.download_then_trim(audio_url, start_time, total_duration, &run_tag)
                    .await
            }
            FetchStrategy::Ranged => {
                self.ranged_fetch(audio_url, start_time, total_duration, &run_tag)
                    .await
            }
        }
    }

    /// Download the full episode, then cut the window out of the local file.
    async fn download_then_trim(
        &self,
        audio_url: &str,
        start_time: u32,
        total_duration: u32,
        run_tag: &str,
    ) -> Result<AudioSnippet> {
        let template = self.temp_dir.join(format!("episode_{run_tag}.%(ext)s"));
        let full_path = self.temp_dir.join(format!("episode_{run_tag}.mp3"));
        let snippet_path = self.temp_dir.join(format!("snippet_{run_tag}.mp3"));

        info!("Downloading episode audio");

        let download_args = vec![
            "--extract-audio".to_string(),
            "--audio-format".to_string(),
            "mp3".to_string(),
            "--output".to_string(),
            template.to_string_lossy().into_owned(),
            "--no-playlist".to_string(),
            "--quiet".to_string(),
            "--no-warnings".to_string(),
            "--user-agent".to_string(),
            BROWSER_USER_AGENT.to_string(),
            audio_url.to_string(),
        ];

        let download = self
            .executor
            .run(
                "yt-dlp",
                &download_args,
                Duration::from_secs(self.settings.download_timeout_secs),
            )
            .await;

        if let Err(e) = download {
            remove_if_exists(&full_path);
            return Err(stage_error("download", e));
        }

        if !full_path.exists() {
            return Err(InnsiktError::AudioExtraction(
                "downloaded audio file not found".to_string(),
            ));
        }

        // Hosts sometimes return an error page as a 200 response; a
        // successful exit code alone does not prove we got audio.
        let full_size = file_size(&full_path)?;
        if full_size < self.settings.min_download_bytes {
            remove_if_exists(&full_path);
            return Err(InnsiktError::AudioExtraction(format!(
                "downloaded file is implausibly small ({full_size} bytes)"
            )));
        }

        debug!("Downloaded {} bytes, trimming window", full_size);

        let trim = self
            .trim_local(&full_path, &snippet_path, start_time, total_duration)
            .await;

        if let Err(e) = trim {
            remove_if_exists(&full_path);
            remove_if_exists(&snippet_path);
            return Err(stage_error("trim", e));
        }

        let snippet = self.verify_snippet(&snippet_path, start_time, total_duration);
        if snippet.is_err() {
            remove_if_exists(&full_path);
            remove_if_exists(&snippet_path);
        } else {
            // The full-length file is never needed again.
            remove_if_exists(&full_path);
        }
        snippet
    }

    /// Cut the window directly out of the remote URL in a single ffmpeg
    /// invocation. Only works when the host supports seek semantics, but
    /// avoids downloading whole episodes.
    async fn ranged_fetch(
        &self,
        audio_url: &str,
        start_time: u32,
        total_duration: u32,
        run_tag: &str,
    ) -> Result<AudioSnippet> {
        let snippet_path = self.temp_dir.join(format!("snippet_{run_tag}.mp3"));

        info!("Fetching snippet via remote seek");

        let args = vec![
            "-user_agent".to_string(),
            BROWSER_USER_AGENT.to_string(),
            "-ss".to_string(),
            start_time.to_string(),
            "-i".to_string(),
            audio_url.to_string(),
            "-t".to_string(),
            total_duration.to_string(),
            "-vn".to_string(),
            "-codec:a".to_string(),
            "libmp3lame".to_string(),
            "-qscale:a".to_string(),
            "5".to_string(),
            "-y".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            snippet_path.to_string_lossy().into_owned(),
        ];

        let result = self
            .executor
            .run(
                "ffmpeg",
                &args,
                Duration::from_secs(self.settings.download_timeout_secs),
            )
            .await;

        if let Err(e) = result {
            remove_if_exists(&snippet_path);
            return Err(stage_error("ranged fetch", e));
        }

        let snippet = self.verify_snippet(&snippet_path, start_time, total_duration);
        if snippet.is_err() {
            remove_if_exists(&snippet_path);
        }
        snippet
    }

    async fn trim_local(
        &self,
        source: &Path,
        dest: &Path,
        start_time: u32,
        total_duration: u32,
    ) -> Result<()> {
        let args = vec![
            "-ss".to_string(),
            start_time.to_string(),
            "-i".to_string(),
            source.to_string_lossy().into_owned(),
            "-t".to_string(),
            total_duration.to_string(),
            "-vn".to_string(),
            "-codec:a".to_string(),
            "libmp3lame".to_string(),
            "-qscale:a".to_string(),
            "5".to_string(),
            "-y".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            dest.to_string_lossy().into_owned(),
        ];

        self.executor
            .run(
                "ffmpeg",
                &args,
                Duration::from_secs(self.settings.trim_timeout_secs),
            )
            .await?;
        Ok(())
    }

    /// Gate the finished snippet on a minimum byte size. A silently empty or
    /// corrupt clip must not propagate as success.
    fn verify_snippet(
        &self,
        snippet_path: &Path,
        start_time: u32,
        total_duration: u32,
    ) -> Result<AudioSnippet> {
        if !snippet_path.exists() {
            return Err(InnsiktError::AudioExtraction(
                "snippet file not found after trim".to_string(),
            ));
        }

        let byte_size = file_size(snippet_path)?;
        if byte_size < self.settings.min_snippet_bytes {
            return Err(InnsiktError::AudioExtraction(format!(
                "snippet is implausibly small ({byte_size} bytes)"
            )));
        }

        Ok(AudioSnippet {
            local_path: snippet_path.to_path_buf(),
            start_offset_seconds: start_time,
            duration_seconds: total_duration,
            byte_size,
        })
    }
}

fn stage_error(stage: &str, err: InnsiktError) -> InnsiktError {
    match err {
        // A missing tool is an installation problem, not an extraction one.
        InnsiktError::ToolNotFound(_) => err,
        other => InnsiktError::AudioExtraction(format!("{stage} failed: {other}")),
    }
}

fn file_size(path: &Path) -> Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}

fn remove_if_exists(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove temp file {:?}: {}", path, e);
        }
    }
}
