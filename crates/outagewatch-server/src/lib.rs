//! HTTP health check for the outage feed.
//!
//! Polls the feed on every request and reports three checks, in order,
//! stopping at the first failure:
//! 1. `api_reachable`: the feed answered with 200
//! 2. `json_parseable`: the body is a JSON array of events
//! 3. `status_fields_present`: every event has a non-empty `status`
//!
//! Shares no state with the history store.

use std::sync::Arc;

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use outagewatch_core::{FeedClient, FetchError, OutageEvent};

/// Shared server state.
struct AppState {
    client: FeedClient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Health {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Check {
    fn pass(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Pass,
            error: None,
        }
    }

    fn fail(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Fail,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: Health,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_count: Option<usize>,
    pub checks: Vec<Check>,
    pub timestamp: String,
}

impl HealthResponse {
    fn fail(mut self, check: Check, message: String) -> Self {
        self.checks.push(check);
        self.status = Health::Unhealthy;
        self.message = Some(message);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        match self.status {
            Health::Healthy => StatusCode::OK,
            Health::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Every event must carry a non-empty status. An empty feed is valid.
fn validate_status_fields(events: &[OutageEvent]) -> Result<(), String> {
    match events.iter().find(|e| e.status.is_empty()) {
        Some(event) => Err(format!("event {} has empty status field", event.id)),
        None => Ok(()),
    }
}

/// Fetch the feed once and run the checks.
pub async fn check_feed(client: &FeedClient) -> HealthResponse {
    let response = HealthResponse {
        status: Health::Healthy,
        message: None,
        event_count: None,
        checks: Vec::new(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    };

    let events = match client.fetch_events().await {
        Ok(events) => events,
        Err(e @ FetchError::Transport(_)) => {
            return response.fail(
                Check::fail("api_reachable", format!("failed to reach API: {e}")),
                "Cannot reach outage API".to_string(),
            );
        }
        Err(FetchError::Status(code)) => {
            return response.fail(
                Check::fail("api_reachable", format!("API returned status {code}")),
                format!("API returned non-200 status: {code}"),
            );
        }
        Err(e @ FetchError::Decode(_)) => {
            let mut response = response;
            response.checks.push(Check::pass("api_reachable"));
            return response.fail(
                Check::fail("json_parseable", e.to_string()),
                "Failed to parse API response as JSON".to_string(),
            );
        }
    };

    let mut response = response;
    response.checks.push(Check::pass("api_reachable"));
    response.checks.push(Check::pass("json_parseable"));
    response.event_count = Some(events.len());

    if let Err(e) = validate_status_fields(&events) {
        return response.fail(
            Check::fail("status_fields_present", e),
            "Status fields validation failed".to_string(),
        );
    }

    response.checks.push(Check::pass("status_fields_present"));
    response.message = Some(format!(
        "All checks passed. Found {} outage events.",
        events.len()
    ));
    response
}

async fn handle_health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let report = check_feed(&state.client).await;
    if report.status == Health::Unhealthy {
        log::warn!(
            "health check failed: {}",
            report.message.as_deref().unwrap_or("unknown")
        );
    }
    (report.status_code(), Json(report))
}

async fn handle_index(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "outagewatch health",
        "version": outagewatch_core::VERSION,
        "feed": state.client.url(),
        "endpoints": {
            "/": "This API index",
            "/health": "Feed checks (200 healthy, 503 unhealthy)",
        },
    }))
}

/// Build the axum router.
pub fn build_router(client: FeedClient) -> Router {
    let state = Arc::new(AppState { client });

    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Run the health server until the listener fails.
pub async fn run_server(client: FeedClient, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(client);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("health server listening on {addr}");
    axum::serve(listener, app).await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
