//! Configuration settings for Innsikt.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub search: SearchSettings,
    pub audio: AudioSettings,
    pub transcription: TranscriptionSettings,
    pub summary: SummarySettings,
    pub notion: NotionSettings,
    pub audit: AuditSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary audio files.
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/innsikt".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Podcast search service settings.
///
/// Credentials come from the `TADDY_USER_ID` and `TADDY_API_KEY`
/// environment variables, never from this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// GraphQL endpoint of the search service.
    pub endpoint: String,
    /// Maximum candidates requested per search.
    pub max_results: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.taddy.org".to_string(),
            max_results: 10,
            timeout_secs: 10,
        }
    }
}

/// How audio snippets are obtained.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// Download the full episode, then trim locally.
    #[default]
    Download,
    /// Seek directly into the remote URL (requires host range support).
    Ranged,
}

impl std::str::FromStr for FetchStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "download" => Ok(FetchStrategy::Download),
            "ranged" => Ok(FetchStrategy::Ranged),
            _ => Err(format!("Unknown fetch strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::Download => write!(f, "download"),
            FetchStrategy::Ranged => write!(f, "ranged"),
        }
    }
}

/// Audio snippet extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Snippet acquisition strategy.
    pub strategy: FetchStrategy,
    /// Transcript/audio window length in seconds.
    pub window_seconds: u32,
    /// Downloads below this size are treated as host error pages.
    pub min_download_bytes: u64,
    /// Snippets below this size are treated as corrupt.
    pub min_snippet_bytes: u64,
    /// Timeout for the download stage (podcast files can be large).
    pub download_timeout_secs: u64,
    /// Timeout for the local trim stage.
    pub trim_timeout_secs: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            strategy: FetchStrategy::Download,
            window_seconds: 30,
            min_download_bytes: 10_000,
            min_snippet_bytes: 1_000,
            download_timeout_secs: 300,
            trim_timeout_secs: 60,
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Takeaway summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Chat model for bullet generation.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Notion destination settings.
///
/// The integration token comes from the `NOTION_API_KEY` environment
/// variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct NotionSettings {
    /// Database the insight pages are created in.
    pub database_id: Option<String>,
}


/// Audit sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// Webhook to post audit records to. When unset, records go to the
    /// process log.
    pub webhook_url: Option<String>,
    /// Webhook request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            timeout_secs: 5,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Capacity of the recent-captures list; oldest entries are evicted.
    pub recent_capacity: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            recent_capacity: 20,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::InnsiktError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("innsikt")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}
