use anyhow::Context;
use clap::Parser;
use tracing::info;

mod config;
mod error;
mod ingest;
mod logging;
mod models;
mod pipeline;
mod projections;
mod server;
mod stats;


use config::{AppConfig, Cli, Command};
use server::AppState;

/// Session analytics service for the dashboard.
/// Read-only over the event log; every response is derived from it.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_format);
    let config = cli.to_config()?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::serve(config).await,
        Command::Report => print_report(&config),
    }
}

fn print_report(config: &AppConfig) -> anyhow::Result<()> {
    let report = AppState::from_config(config)
        .analytics()
        .with_context(|| format!("no report for {}", config.events_path.display()))?;
    info!(sessions = report.stats.total_sessions, "report built");

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
