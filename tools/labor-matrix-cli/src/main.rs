//! # Labor Matrix CLI
//!
//! Prices durations, prints the rate matrix and chart data, and lists stores
//! declared in a settings file.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = commands::load_settings(&cli)?;

    init_logging(&settings.log_level);

    commands::run(cli, settings)
}

/// `RUST_LOG` wins over the configured level. Logs go to stderr so exports stay clean.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
