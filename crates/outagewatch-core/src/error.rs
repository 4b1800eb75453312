//! Error types for the history store and the feed client.

use thiserror::Error;

/// Failure while writing the history file.
///
/// Reading never produces one of these: a missing or malformed history file
/// loads as an empty store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode history: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to move history into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// A fetch that did not produce a usable list of outage events.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("feed returned status {0}")]
    Status(u16),

    #[error("failed to parse JSON: {0}")]
    Decode(#[source] reqwest::Error),
}

impl FetchError {
    /// Short machine-friendly label, used by the health checks.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status(_) => "status",
            FetchError::Decode(_) => "decode",
        }
    }
}
