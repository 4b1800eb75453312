//! CLI for outagewatch: live outage counts and their trend in the terminal.

mod commands;
mod tui;

use clap::{Parser, Subcommand};

use commands::ConfigArgs;

#[derive(Parser)]
#[command(name = "outagewatch")]
#[command(about = "outagewatch: how many customers are in the dark, and how has that changed")]
#[command(version = outagewatch_core::VERSION)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Live dashboard: summary box, trend chart (c), refresh (r), quit (q)
    Monitor {
        /// Seconds between feed polls
        #[arg(long, default_value_t = outagewatch_core::config::DEFAULT_POLL_SECS)]
        poll_secs: u64,
    },

    /// Print the stored history as a chart and exit
    Chart {
        /// Chart width in columns, including the label gutter
        #[arg(long, default_value = "80")]
        width: usize,

        /// Chart height in rows, excluding the time labels
        #[arg(long, default_value = "15")]
        height: usize,

        /// Draw with plain ASCII characters
        #[arg(long)]
        ascii: bool,
    },

    /// Fetch the feed once and print the summary
    Status {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Also record the sample into the history file
        #[arg(long)]
        record: bool,
    },

    /// Serve GET /health reporting whether the feed is usable
    Health {
        /// Bind address
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(long, env = "PORT", default_value = "8080")]
        port: u16,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = cli.config.into_config();

    match cli.command {
        Commands::Monitor { poll_secs } => commands::monitor::run(config, poll_secs),
        Commands::Chart {
            width,
            height,
            ascii,
        } => commands::chart::run(&config, width, height, ascii),
        Commands::Status { json, record } => commands::status::run(&config, json, record),
        Commands::Health { host, port } => commands::health::run(&config, &host, port),
    }
}
