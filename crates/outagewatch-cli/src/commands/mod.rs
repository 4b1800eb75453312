pub mod chart;
pub mod health;
pub mod monitor;
pub mod status;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::TimeDelta;
use clap::Args;
use log::LevelFilter;
use outagewatch_core::config::{
    DEFAULT_FEED_URL, DEFAULT_INTERVAL_MINUTES, DEFAULT_RETENTION_DAYS, DEFAULT_TIMEOUT_SECS,
};
use outagewatch_core::{BucketInterval, FeedClient, MonitorConfig, RetentionPolicy};

/// Options shared by every subcommand.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Outage events feed URL
    #[arg(long, global = true, env = "OUTAGEWATCH_FEED_URL", default_value = DEFAULT_FEED_URL)]
    pub feed_url: String,

    /// History file [default: ~/.nes-outage-history.json]
    #[arg(long, global = true, env = "OUTAGEWATCH_HISTORY")]
    pub history: Option<PathBuf>,

    /// Bucket width in minutes (1-1440)
    #[arg(long, global = true, default_value_t = DEFAULT_INTERVAL_MINUTES)]
    pub interval_minutes: u32,

    /// Days of history to keep
    #[arg(long, global = true, default_value_t = DEFAULT_RETENTION_DAYS)]
    pub retention_days: u32,

    /// HTTP timeout for feed requests, in seconds
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl ConfigArgs {
    pub fn into_config(self) -> MonitorConfig {
        let mut config = MonitorConfig {
            feed_url: self.feed_url,
            policy: RetentionPolicy {
                interval: BucketInterval::from_minutes(self.interval_minutes),
                retention: TimeDelta::days(i64::from(self.retention_days)),
            },
            request_timeout: Duration::from_secs(self.timeout_secs),
            ..MonitorConfig::default()
        };
        if let Some(path) = self.history {
            config.history_path = path;
        }
        config
    }
}

/// Initialize env_logger (`RUST_LOG`, default `warn`).
///
/// With `log_file`, records are appended there instead of stderr. If the
/// file cannot be opened, logging is switched off rather than written over
/// the terminal UI.
pub fn init_logging(log_file: Option<&Path>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));

    if let Some(path) = log_file {
        let file = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| OpenOptions::new().create(true).append(true).open(path));
        match file {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => {
                eprintln!("Warning: cannot open log file {}: {e}", path.display());
                builder.filter_level(LevelFilter::Off);
            }
        }
    }

    let _ = builder.try_init();
}

/// Build the feed client or exit with an error.
pub fn make_client(config: &MonitorConfig) -> FeedClient {
    match FeedClient::new(config.feed_url.clone(), config.request_timeout) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: cannot create HTTP client: {e}");
            std::process::exit(1);
        }
    }
}

/// Group digits in threes: `1520342` → `1,520,342`.
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ConfigArgs {
        ConfigArgs {
            feed_url: "http://localhost/events".to_string(),
            history: None,
            interval_minutes: 15,
            retention_days: 3,
            timeout_secs: 4,
        }
    }

    #[test]
    fn test_into_config_overrides() {
        let config = args().into_config();
        assert_eq!(config.feed_url, "http://localhost/events");
        assert_eq!(config.policy.interval.minutes(), 15);
        assert_eq!(config.policy.retention, TimeDelta::days(3));
        assert_eq!(config.request_timeout, Duration::from_secs(4));
        assert_eq!(config.history_path, MonitorConfig::default().history_path);
    }

    #[test]
    fn test_into_config_history_path() {
        let config = ConfigArgs {
            history: Some(PathBuf::from("/var/lib/outages.json")),
            ..args()
        }
        .into_config();
        assert_eq!(config.history_path, PathBuf::from("/var/lib/outages.json"));
        assert_eq!(config.log_path(), PathBuf::from("/var/lib/outages.json.log"));
    }

    #[test]
    fn test_into_config_clamps_interval() {
        let config = ConfigArgs {
            interval_minutes: 0,
            ..args()
        }
        .into_config();
        assert_eq!(config.policy.interval.minutes(), 1);
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1520342), "1,520,342");
        assert_eq!(thousands(-45000), "-45,000");
    }
}
