use std::time::Duration;

use chrono::Utc;
use outagewatch_core::{MonitorConfig, SeriesStore};

pub fn run(mut config: MonitorConfig, poll_secs: u64) {
    config.poll_period = Duration::from_secs(poll_secs.max(1));
    // The TUI owns stderr's terminal; send log records to a file instead.
    super::init_logging(Some(&config.log_path()));

    let client = super::make_client(&config);
    let store = SeriesStore::load(&config.history_path, config.policy, Utc::now());
    log::info!(
        "monitoring {} with {} stored buckets",
        config.feed_url,
        store.len()
    );

    let mut app = match crate::tui::app::App::new(store, client, &config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: cannot start async runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}
