//! Upstream outage feed: event schema, HTTP client, and summary aggregation.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FetchError;
use crate::store::RawSample;

/// Status string the feed uses for outages with no crew assigned yet.
pub const UNASSIGNED_STATUS: &str = "Unassigned";

const USER_AGENT: &str = concat!("outagewatch/", env!("CARGO_PKG_VERSION"));

/// One outage as published by the feed. Every field is optional upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutageEvent {
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub start_time: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub last_updated_time: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub num_people: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub cause: String,
    #[serde(deserialize_with = "null_as_default")]
    pub identifier: String,
    #[serde(deserialize_with = "null_as_default")]
    pub latitude: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub longitude: f64,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl OutageEvent {
    pub fn is_assigned(&self) -> bool {
        self.status != UNASSIGNED_STATUS
    }
}

/// Aggregate view of one feed response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSummary {
    pub total_affected: i64,
    pub event_count: usize,
    pub active_crews: usize,
    pub waiting_for_crew: usize,
    pub customers_being_restored: i64,
}

impl FeedSummary {
    /// Sums saturate at `i64::MAX`/`i64::MIN` on out-of-range feed data.
    pub fn from_events(events: &[OutageEvent]) -> Self {
        let mut summary = Self {
            event_count: events.len(),
            ..Self::default()
        };
        for event in events {
            summary.total_affected = summary.total_affected.saturating_add(event.num_people);
            if event.is_assigned() {
                summary.active_crews += 1;
                summary.customers_being_restored = summary
                    .customers_being_restored
                    .saturating_add(event.num_people);
            } else {
                summary.waiting_for_crew += 1;
            }
        }
        summary
    }

    /// The sample recorded into history for this summary.
    pub fn sample_at(&self, fetched_at: DateTime<Utc>) -> RawSample {
        RawSample::new(fetched_at, self.total_affected)
    }
}

/// Thin HTTP client for the outage feed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    url: String,
}

impl FeedClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::Transport)?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the raw event list. Non-200 responses are errors.
    pub async fn fetch_events(&self) -> Result<Vec<OutageEvent>, FetchError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<Vec<OutageEvent>>()
            .await
            .map_err(FetchError::Decode)
    }

    pub async fn fetch_summary(&self) -> Result<FeedSummary, FetchError> {
        let events = self.fetch_events().await?;
        Ok(FeedSummary::from_events(&events))
    }
}
