//! Innsikt - Podcast Insight Capture
//!
//! A service for capturing key takeaways from the podcast you are listening
//! to right now.
//!
//! The name "Innsikt" comes from the Norwegian word for "insight."
//!
//! # Overview
//!
//! Innsikt turns a "I'm listening to this episode at this timestamp" moment
//! into saved notes:
//! - Resolve the episode against a podcast catalog
//! - Reuse the catalog's transcript when one exists, otherwise extract and
//!   transcribe a short audio snippet around the timestamp
//! - Condense the transcript window into up to three takeaway bullets
//! - Hand the result to the browser extension, or save it to Notion
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt management
//! - `episode` - Core data model
//! - `resolver` - Episode resolution against the podcast search service
//! - `segmenter` - Transcript window extraction
//! - `audio` - Audio snippet download and trimming
//! - `transcription` - Speech-to-text transcription
//! - `summarizer` - Takeaway bullet generation
//! - `pipeline` - The insight-acquisition pipeline
//! - `audit` - Per-run audit records
//! - `notion` - Notion destination writer
//!
//! # Example
//!
//! ```rust,no_run
//! use innsikt::config::Settings;
//! use innsikt::episode::EpisodeReference;
//! use innsikt::pipeline::Pipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::from_settings(&settings)?;
//!
//!     let reference = EpisodeReference::normalize(
//!         Some("Deep Work, Deliberately".to_string()),
//!         Some("The Focus Show".to_string()),
//!         Some(754),
//!         None,
//!     )?;
//!
//!     let insight = pipeline.capture(&reference).await?;
//!     for bullet in insight.summary.unwrap_or_default() {
//!         println!("- {}", bullet);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod audit;
pub mod cli;
pub mod config;
pub mod episode;
pub mod error;
pub mod exec;
pub mod notion;
pub mod openai;
pub mod pipeline;
pub mod resolver;
pub mod segmenter;
pub mod summarizer;
pub mod transcription;

pub use error::{InnsiktError, Result};
