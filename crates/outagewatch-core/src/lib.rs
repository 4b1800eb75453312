//! # outagewatch-core
//!
//! **How many customers are in the dark, and how has that changed?**
//!
//! `outagewatch-core` holds the parts of outagewatch that are not terminal or
//! network plumbing: a time-bucketed history store that survives restarts,
//! an ASCII line chart for that history, and the monitor state machine that
//! ties polling results to both.
//!
//! ## Quick Start
//!
//! ```no_run
//! use chrono::{Local, Utc};
//! use outagewatch_core::{ChartOptions, MonitorConfig, RawSample, SeriesStore, render};
//!
//! let config = MonitorConfig::default();
//! let mut store = SeriesStore::load(&config.history_path, config.policy, Utc::now());
//!
//! if store.accept(RawSample::new(Utc::now(), 1520), Utc::now()).is_some() {
//!     store.persist(&config.history_path).unwrap();
//! }
//!
//! let chart = render(store.snapshot(), 60, 15, &ChartOptions::local(Local::now()));
//! println!("{chart}");
//! ```
//!
//! ## Architecture
//!
//! feed → [`Monitor::update`] → [`SeriesStore::accept`] → persist
//!
//! [`SeriesStore::snapshot`] → [`render`] → text
//!
//! Everything here except [`FeedClient`] and [`SeriesStore::persist`] is
//! free of I/O.

pub mod bucket;
pub mod chart;
pub mod config;
pub mod error;
pub mod feed;
pub mod monitor;
pub mod store;

pub use bucket::{BucketInterval, bucket};
pub use chart::{ChartOptions, Glyphs, PLACEHOLDER, Rendered, render, visible_window};
pub use config::{DEFAULT_FEED_URL, MonitorConfig, default_history_path};
pub use error::{FetchError, StoreError};
pub use feed::{FeedClient, FeedSummary, OutageEvent};
pub use monitor::{Effect, Key, Monitor, Msg};
pub use store::{Bucket, Ingested, RawSample, RetentionPolicy, SeriesStore};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
