use chrono::{DateTime, Local, SecondsFormat, Utc};
use outagewatch_core::{FeedSummary, MonitorConfig, SeriesStore};

pub fn run(config: &MonitorConfig, json: bool, record: bool) {
    super::init_logging(None);

    let client = super::make_client(config);
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: cannot start async runtime: {e}");
            std::process::exit(1);
        }
    };

    let summary = match rt.block_on(client.fetch_summary()) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let fetched_at = Utc::now();

    if record {
        let mut store = SeriesStore::load(&config.history_path, config.policy, fetched_at);
        if store.accept(summary.sample_at(fetched_at), fetched_at).is_some()
            && let Err(e) = store.persist(&config.history_path)
        {
            eprintln!("Error: cannot write {}: {e}", config.history_path.display());
            std::process::exit(1);
        }
    }

    if json {
        let doc = serde_json::json!({
            "fetchedAt": fetched_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "summary": summary,
        });
        match serde_json::to_string_pretty(&doc) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    } else {
        for line in summary_lines(&summary, fetched_at) {
            println!("{line}");
        }
    }
}

fn summary_lines(summary: &FeedSummary, fetched_at: DateTime<Utc>) -> Vec<String> {
    vec![
        format!("Outages:            {}", super::thousands(summary.event_count as i64)),
        format!("Customers affected: {}", super::thousands(summary.total_affected)),
        format!("Active crews:       {}", super::thousands(summary.active_crews as i64)),
        format!(
            "Being restored:     {}",
            super::thousands(summary.customers_being_restored)
        ),
        format!(
            "Waiting for crew:   {}",
            super::thousands(summary.waiting_for_crew as i64)
        ),
        format!(
            "Checked at {}",
            fetched_at.with_timezone(&Local).format("%-I:%M:%S %p")
        ),
    ]
}
