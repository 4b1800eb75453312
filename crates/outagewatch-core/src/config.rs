//! Runtime settings shared by every front-end.

use std::path::PathBuf;
use std::time::Duration;

use chrono::TimeDelta;

use crate::bucket::BucketInterval;
use crate::store::RetentionPolicy;

/// Public NES outage map feed.
pub const DEFAULT_FEED_URL: &str = "https://utilisocial.io/datacapable/v2/p/NES/map/events";

/// History file name, placed in the home directory.
pub const HISTORY_FILE_NAME: &str = ".nes-outage-history.json";

pub const DEFAULT_INTERVAL_MINUTES: u32 = 10;
pub const DEFAULT_RETENTION_DAYS: u32 = 10;
pub const DEFAULT_POLL_SECS: u64 = 30;
pub const DEFAULT_BLINK_MILLIS: u64 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// `~/.nes-outage-history.json`, or the bare file name in the working
/// directory when there is no home directory.
pub fn default_history_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(HISTORY_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(HISTORY_FILE_NAME))
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub feed_url: String,
    pub history_path: PathBuf,
    pub policy: RetentionPolicy,
    pub poll_period: Duration,
    pub blink_period: Duration,
    pub request_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            history_path: default_history_path(),
            policy: RetentionPolicy {
                interval: BucketInterval::from_minutes(DEFAULT_INTERVAL_MINUTES),
                retention: TimeDelta::days(i64::from(DEFAULT_RETENTION_DAYS)),
            },
            poll_period: Duration::from_secs(DEFAULT_POLL_SECS),
            blink_period: Duration::from_millis(DEFAULT_BLINK_MILLIS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl MonitorConfig {
    /// Log file used while a full-screen front-end owns the terminal:
    /// the history path with `.log` appended.
    pub fn log_path(&self) -> PathBuf {
        let mut name = self.history_path.clone().into_os_string();
        name.push(".log");
        PathBuf::from(name)
    }
}
