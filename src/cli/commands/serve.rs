//! HTTP API server the browser extension talks to.
//!
//! Request-scoped and stateless between calls, except for a bounded list of
//! recent captures owned by the server state (not by the pipeline).

use crate::cli::Output;
use crate::config::Settings;
use crate::episode::{EpisodeReference, InsightResult};
use crate::error::InnsiktError;
use crate::notion::{NotionClient, SaveInsightRequest};
use crate::pipeline::Pipeline;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    pipeline: Pipeline,
    notion: Option<NotionClient>,
    recent: tokio::sync::Mutex<RecentInsights>,
}

/// Fixed-capacity list of recent captures; the oldest entry is evicted.
struct RecentInsights {
    capacity: usize,
    entries: VecDeque<InsightResult>,
}

impl RecentInsights {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    fn push(&mut self, insight: InsightResult) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(insight);
    }

    fn snapshot(&self) -> Vec<InsightResult> {
        self.entries.iter().cloned().collect()
    }
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let pipeline = Pipeline::from_settings(&settings)?;

    // The Notion destination is optional; without it the save endpoint
    // reports its missing configuration instead of the server refusing to
    // start.
    let notion = match NotionClient::from_settings(&settings.notion) {
        Ok(client) => Some(client),
        Err(e) => {
            Output::warning(&format!("Notion saving disabled: {e}"));
            None
        }
    };

    let state = Arc::new(AppState {
        pipeline,
        notion,
        recent: tokio::sync::Mutex::new(RecentInsights::new(settings.server.recent_capacity)),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/process-insight", post(process_insight))
        .route("/save-to-notion", post(save_to_notion))
        .route("/recent", get(recent))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Innsikt API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET  /health");
    Output::kv("Capture", "POST /process-insight");
    Output::kv("Save", "POST /save-to-notion");
    Output::kv("Recent", "GET  /recent");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProcessInsightRequest {
    title: Option<String>,
    #[serde(default)]
    show_name: Option<String>,
    #[serde(default)]
    timestamp: Option<u32>,
    #[serde(default)]
    spotify_url: Option<String>,
}

#[derive(Serialize)]
struct ProcessInsightResponse {
    success: bool,
    data: InsightResult,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveResponse {
    success: bool,
    page_id: String,
}

#[derive(Serialize)]
struct RecentResponse {
    insights: Vec<InsightResult>,
    total: usize,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    message: String,
}

/// Map a pipeline failure to its outward-facing status code.
fn error_status(err: &InnsiktError) -> StatusCode {
    match err {
        InnsiktError::Validation(_) => StatusCode::BAD_REQUEST,
        InnsiktError::NoAudioAvailable => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &InnsiktError) -> Response {
    (
        error_status(err),
        Json(ErrorResponse {
            success: false,
            message: err.to_string(),
        }),
    )
        .into_response()
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn process_insight(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessInsightRequest>,
) -> Response {
    let reference = match EpisodeReference::normalize(
        req.title,
        req.show_name,
        req.timestamp,
        req.spotify_url,
    ) {
        Ok(reference) => reference,
        Err(e) => return error_response(&e),
    };

    match state.pipeline.capture(&reference).await {
        Ok(insight) => {
            state.recent.lock().await.push(insight.clone());
            Json(ProcessInsightResponse {
                success: true,
                data: insight,
            })
            .into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn save_to_notion(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveInsightRequest>,
) -> Response {
    let Some(notion) = &state.notion else {
        return error_response(&InnsiktError::Config(
            "Notion is not configured (set NOTION_API_KEY and notion.database_id)".to_string(),
        ));
    };

    match notion.save(&req).await {
        Ok(page_id) => Json(SaveResponse {
            success: true,
            page_id,
        })
        .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn recent(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let insights = state.recent.lock().await.snapshot();
    Json(RecentResponse {
        total: insights.len(),
        insights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insight(title: &str) -> InsightResult {
        InsightResult {
            episode_title: title.to_string(),
            show_name: None,
            thumbnail_url: None,
            transcript: None,
            summary: None,
            timestamp_seconds: 0,
            manual_mode: true,
        }
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&InnsiktError::Validation("title is required".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&InnsiktError::NoAudioAvailable),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&InnsiktError::Transcription("upstream".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            error_status(&InnsiktError::ResolverTransport("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_recent_evicts_oldest_first() {
        let mut recent = RecentInsights::new(2);
        recent.push(insight("one"));
        recent.push(insight("two"));
        recent.push(insight("three"));

        let titles: Vec<String> = recent
            .snapshot()
            .into_iter()
            .map(|i| i.episode_title)
            .collect();
        assert_eq!(titles, vec!["two", "three"]);
    }

    #[test]
    fn test_recent_with_zero_capacity_stores_nothing() {
        let mut recent = RecentInsights::new(0);
        recent.push(insight("one"));
        assert!(recent.snapshot().is_empty());
    }
}
