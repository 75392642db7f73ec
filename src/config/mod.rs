//! Configuration module for Innsikt.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, SummaryPrompts};
pub use settings::{
    AudioSettings, AuditSettings, FetchStrategy, GeneralSettings, NotionSettings,
    PromptSettings, SearchSettings, ServerSettings, Settings, SummarySettings,
    TranscriptionSettings,
};
