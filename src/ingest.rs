use std::path::PathBuf;
use tracing::{debug, error, warn};

use crate::error::{AnalyticsError, Result};
use crate::models::Event;

/// A line that failed to decode and was left out of the parsed log
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedLine {
    /// 1-based line number in the source
    pub line: usize,
    pub reason: String,
}

/// Events decoded from one read of the log, in source order
#[derive(Debug, Default)]
pub struct ParsedLog {
    pub events: Vec<Event>,
    pub rejected: Vec<RejectedLine>,
}

/// Line-delimited JSON event log on disk.
/// Read-only: every call re-reads the file.
#[derive(Debug, Clone)]
pub struct EventSource {
    path: PathBuf,
}

impl EventSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read and decode the whole log.
    /// A missing or unreadable file degrades to an empty log.
    pub fn read_events(&self) -> ParsedLog {
        match self.read_raw() {
            Ok(contents) => parse_events(&contents),
            Err(e) => {
                error!(error = %e, "event log unavailable, continuing with no events");
                ParsedLog::default()
            }
        }
    }

    fn read_raw(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|source| AnalyticsError::Read {
            path: self.path.clone(),
            source,
        })
    }
}

/// Decode every non-blank line. Malformed lines are skipped and reported.
pub fn parse_events(contents: &str) -> ParsedLog {
    let mut parsed = ParsedLog::default();

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match decode_line(idx + 1, line) {
            Ok(event) => parsed.events.push(event),
            Err(e) => {
                warn!(error = %e, "skipping malformed event");
                parsed.rejected.push(RejectedLine {
                    line: idx + 1,
                    reason: e.to_string(),
                });
            }
        }
    }

    debug!(
        events = parsed.events.len(),
        rejected = parsed.rejected.len(),
        "parsed event log"
    );
    parsed
}

pub fn decode_line(line_no: usize, line: &str) -> Result<Event> {
    serde_json::from_str(line).map_err(|source| AnalyticsError::Decode {
        line: line_no,
        source,
    })
}
