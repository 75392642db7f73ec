//! Notion destination writer.
//!
//! Renders a captured insight into a page in the user's Notion database:
//! title, takeaway bullets, then the supporting transcript. Thin collaborator
//! consuming an `InsightResult`; the pipeline never depends on it.

use crate::config::NotionSettings;
use crate::error::{InnsiktError, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, instrument};

const NOTION_API_URL: &str = "https://api.notion.com/v1/pages";
const NOTION_VERSION: &str = "2022-06-28";

/// Notion caps a rich-text item at 2000 characters; transcripts are split
/// into paragraphs below that.
const PARAGRAPH_CHARS: usize = 1800;

/// Fields the browser extension sends when saving an insight.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveInsightRequest {
    pub episode_title: String,
    #[serde(default)]
    pub show_name: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub summary: Option<Vec<String>>,
    #[serde(default)]
    pub timestamp_seconds: u32,
    #[serde(default)]
    pub manual_mode: bool,
    /// Free-form notes, used in manual mode.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Client for creating insight pages.
///
/// The integration token comes from the `NOTION_API_KEY` environment
/// variable.
pub struct NotionClient {
    client: reqwest::Client,
    api_key: String,
    database_id: String,
}

impl NotionClient {
    pub fn from_settings(settings: &NotionSettings) -> Result<Self> {
        let api_key = std::env::var("NOTION_API_KEY")
            .map_err(|_| InnsiktError::Config("NOTION_API_KEY is not set".to_string()))?;
        let database_id = settings
            .database_id
            .clone()
            .ok_or_else(|| InnsiktError::Config("notion.database_id is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            api_key,
            database_id,
        })
    }

    /// Create the insight page; returns its Notion page ID.
    #[instrument(skip(self, request), fields(title = %request.episode_title))]
    pub async fn save(&self, request: &SaveInsightRequest) -> Result<String> {
        let body = build_page_body(&self.database_id, request);

        let response = self
            .client
            .post(NOTION_API_URL)
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| InnsiktError::Notion(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(InnsiktError::Notion(format!(
                "page creation returned {status}: {detail}"
            )));
        }

        let created: Value = response
            .json()
            .await
            .map_err(|e| InnsiktError::Notion(format!("invalid response body: {e}")))?;

        let page_id = created["id"].as_str().unwrap_or_default().to_string();
        info!("Saved insight page {}", page_id);
        Ok(page_id)
    }
}

fn build_page_body(database_id: &str, request: &SaveInsightRequest) -> Value {
    let page_title = match &request.show_name {
        Some(show) => format!(
            "{} — {} @ {}",
            request.episode_title,
            show,
            format_timestamp(request.timestamp_seconds)
        ),
        None => format!(
            "{} @ {}",
            request.episode_title,
            format_timestamp(request.timestamp_seconds)
        ),
    };

    let mut children = Vec::new();

    if let Some(summary) = &request.summary {
        children.push(heading("Key takeaways"));
        for bullet in summary {
            children.push(json!({
                "object": "block",
                "type": "bulleted_list_item",
                "bulleted_list_item": { "rich_text": [text_item(bullet)] }
            }));
        }
    }

    if let Some(notes) = &request.notes {
        if !notes.trim().is_empty() {
            children.push(heading("Notes"));
            children.push(paragraph(notes));
        }
    }

    if let Some(transcript) = &request.transcript {
        children.push(heading("Transcript"));
        for chunk in split_paragraphs(transcript) {
            children.push(paragraph(&chunk));
        }
    }

    let mut body = json!({
        "parent": { "database_id": database_id },
        "properties": {
            "Name": { "title": [text_item(&page_title)] }
        },
        "children": children,
    });

    if let Some(thumbnail) = &request.thumbnail_url {
        body["cover"] = json!({ "type": "external", "external": { "url": thumbnail } });
    }

    body
}

fn heading(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "heading_2",
        "heading_2": { "rich_text": [text_item(text)] }
    })
}

fn paragraph(text: &str) -> Value {
    json!({
        "object": "block",
        "type": "paragraph",
        "paragraph": { "rich_text": [text_item(text)] }
    })
}

fn text_item(content: &str) -> Value {
    json!({ "type": "text", "text": { "content": content } })
}

/// Split long text on whitespace into chunks under the Notion limit.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + word.len() + 1 > PARAGRAPH_CHARS {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Format seconds as MM:SS (or H:MM:SS past an hour).
pub fn format_timestamp(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SaveInsightRequest {
        SaveInsightRequest {
            episode_title: "Deep Work".to_string(),
            show_name: Some("The Focus Show".to_string()),
            thumbnail_url: None,
            transcript: Some("some supporting text".to_string()),
            summary: Some(vec!["bullet".to_string()]),
            timestamp_seconds: 754,
            manual_mode: false,
            notes: None,
        }
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "00:00");
        assert_eq!(format_timestamp(754), "12:34");
        assert_eq!(format_timestamp(3725), "1:02:05");
    }

    #[test]
    fn test_page_title_carries_show_and_position() {
        let body = build_page_body("db-1", &request());
        let title = body["properties"]["Name"]["title"][0]["text"]["content"]
            .as_str()
            .unwrap();
        assert_eq!(title, "Deep Work — The Focus Show @ 12:34");
    }

    #[test]
    fn test_children_order_takeaways_then_transcript() {
        let body = build_page_body("db-1", &request());
        let children = body["children"].as_array().unwrap();
        assert_eq!(children[0]["type"], "heading_2");
        assert_eq!(children[1]["type"], "bulleted_list_item");
        assert_eq!(children[2]["type"], "heading_2");
        assert_eq!(children[3]["type"], "paragraph");
    }

    #[test]
    fn test_long_transcripts_split_under_the_limit() {
        let long = "word ".repeat(2000);
        let chunks = split_paragraphs(&long);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= PARAGRAPH_CHARS));
        assert_eq!(
            chunks.join(" ").split_whitespace().count(),
            long.split_whitespace().count()
        );
    }
}
