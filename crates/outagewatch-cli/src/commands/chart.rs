use chrono::{Local, Utc};
use outagewatch_core::{ChartOptions, Glyphs, MonitorConfig, SeriesStore, render};

pub fn run(config: &MonitorConfig, width: usize, height: usize, ascii: bool) {
    super::init_logging(None);

    let store = SeriesStore::load(&config.history_path, config.policy, Utc::now());
    let mut opts = ChartOptions::local(Local::now());
    if ascii {
        opts = opts.with_glyphs(Glyphs::ASCII);
    }

    println!(
        "Customers affected, {}-minute buckets ({})",
        config.policy.interval.minutes(),
        config.history_path.display()
    );
    if let Some(latest) = store.latest() {
        println!(
            "{} buckets, latest {} at {}",
            store.len(),
            super::thousands(latest.value),
            latest.timestamp.with_timezone(&Local).format("%-m/%-d %-I:%M %p")
        );
    }
    println!();
    println!("{}", render(store.snapshot(), width, height, &opts));
}
