//! Audit logging for capture runs.
//!
//! One record per run, emitted right before the pipeline hands back its
//! result. The sink is fire-and-forget: a failed record is logged and
//! dropped, and never changes the run's outcome.

use crate::config::AuditSettings;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// What happened during one capture run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub occurred_at: DateTime<Utc>,
    pub episode_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_name: Option<String>,
    pub timestamp_seconds: u32,
    /// `captured`, `manual`, or the failure kind.
    pub outcome: String,
}

/// Sink for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: &AuditEvent) -> Result<()>;
}

/// Sink that writes records to the process log.
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<()> {
        info!(
            outcome = %event.outcome,
            title = %event.episode_title,
            timestamp = event.timestamp_seconds,
            "capture run finished"
        );
        Ok(())
    }
}

/// Sink that posts records to an external webhook.
pub struct WebhookAuditSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookAuditSink {
    pub fn new(settings: &AuditSettings, url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl AuditSink for WebhookAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<()> {
        self.client
            .post(&self.url)
            .json(event)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tracing_sink_accepts_events() {
        let sink = TracingAuditSink;
        let event = AuditEvent {
            occurred_at: Utc::now(),
            episode_title: "Episode".to_string(),
            show_name: None,
            timestamp_seconds: 42,
            outcome: "captured".to_string(),
        };
        assert!(sink.record(&event).await.is_ok());
    }
}
