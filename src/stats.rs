use chrono::{FixedOffset, Offset, Timelike, Utc};
use std::collections::{BTreeMap, HashSet};

use crate::error::{AnalyticsError, Result};
use crate::models::{Session, SessionStats};

pub const SESSION_DISTRIBUTION: &str = "Multiple sessions per user";

/// Computes cross-session statistics.
/// Hour buckets are read in `offset`; UTC unless configured otherwise.
#[derive(Debug, Clone, Copy)]
pub struct StatsAggregator {
    offset: FixedOffset,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }
}

impl StatsAggregator {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn aggregate(&self, sessions: &[Session]) -> Result<SessionStats> {
        if sessions.is_empty() {
            return Err(AnalyticsError::NoSessions);
        }

        let total_sessions = sessions.len();
        let unique_users = sessions
            .iter()
            .map(|s| s.user_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let total_errors: usize = sessions.iter().map(|s| s.error_count).sum();
        let total_duration: f64 = sessions.iter().map(|s| s.duration).sum();

        Ok(SessionStats {
            total_sessions,
            unique_users,
            total_errors,
            error_rate: total_errors as f64 / total_sessions as f64 * 100.0,
            average_sessions_per_user: total_sessions as f64 / unique_users as f64,
            average_session_duration: total_duration / total_sessions as f64,
            most_active_time: self.most_active_time(sessions),
            session_distribution: SESSION_DISTRIBUTION.to_string(),
        })
    }

    /// Busiest "HH:00" start bucket. Ties go to the earliest hour.
    fn most_active_time(&self, sessions: &[Session]) -> String {
        let mut slots: BTreeMap<String, usize> = BTreeMap::new();
        for session in sessions {
            let hour = session.start_time.with_timezone(&self.offset).hour();
            *slots.entry(format!("{:02}:00", hour)).or_insert(0) += 1;
        }

        let mut best: Option<(&String, usize)> = None;
        for (slot, &count) in &slots {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((slot, count));
            }
        }

        best.map(|(slot, _)| slot.clone()).unwrap_or_default()
    }
}
