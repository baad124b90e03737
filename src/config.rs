use chrono::FixedOffset;
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{AnalyticsError, Result};

pub const DEFAULT_EVENTS_PATH: &str = "scripts/dataingest/data/sessions.json";

#[derive(Debug, Parser)]
#[command(name = "session-dashboard-api", version, about = "Session analytics for the dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Line-delimited JSON event log
    #[arg(long, env = "SESSIONS_FILE", default_value = DEFAULT_EVENTS_PATH, global = true)]
    pub events_path: PathBuf,

    #[arg(long, env = "DASHBOARD_LISTEN", default_value = "127.0.0.1:8080", global = true)]
    pub listen: SocketAddr,

    /// Hours east of UTC used for the most-active-time buckets
    #[arg(
        long,
        env = "DASHBOARD_HOUR_OFFSET",
        default_value_t = 0,
        allow_negative_numbers = true,
        global = true
    )]
    pub hour_offset: i32,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Serve the analytics API (default)
    Serve,
    /// Run the pipeline once and print the report as JSON
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub events_path: PathBuf,
    pub listen: SocketAddr,
    pub offset: FixedOffset,
}

impl Cli {
    pub fn to_config(&self) -> Result<AppConfig> {
        Ok(AppConfig {
            events_path: self.events_path.clone(),
            listen: self.listen,
            offset: hour_offset(self.hour_offset)?,
        })
    }
}

fn hour_offset(hours: i32) -> Result<FixedOffset> {
    if !(-12..=14).contains(&hours) {
        return Err(AnalyticsError::Config(format!(
            "hour offset {} is outside -12..=14",
            hours
        )));
    }
    FixedOffset::east_opt(hours * 3600)
        .ok_or_else(|| AnalyticsError::Config(format!("invalid hour offset {}", hours)))
}
