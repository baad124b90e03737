use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Element tag of the search input.
pub const SEARCH_BAR_CSS: &str = "#search-bar";
/// Paths under this prefix are product detail pages.
pub const PRODUCT_PATH_PREFIX: &str = "/products/";
/// Element tags containing this marker render an error.
pub const ERROR_CSS_MARKER: &str = "error-message";

/// One recorded user interaction, as written to the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub uuid: String,
    pub user_id: String,
    pub session_id: String,
    pub path: String,
    pub css: String,
    pub text: String,
    // Required key, nullable value
    #[serde(deserialize_with = "Option::deserialize")]
    pub value: Option<String>,
    pub event_time: DateTime<Utc>,
}

impl Event {
    /// Search term typed into the search bar, if any.
    /// Null and empty values are treated the same.
    pub fn search_term(&self) -> Option<&str> {
        if self.css != SEARCH_BAR_CSS {
            return None;
        }
        self.value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn is_product_interaction(&self) -> bool {
        self.path.starts_with(PRODUCT_PATH_PREFIX)
    }

    pub fn is_error_element(&self) -> bool {
        self.css.contains(ERROR_CSS_MARKER)
    }

    /// Label mentions "error" in any casing.
    pub fn has_error_label(&self) -> bool {
        self.text.to_lowercase().contains("error")
    }
}

/// Session reconstructed from all events sharing (user_id, session_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: String,
    pub events: Vec<Event>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Seconds between the first-seen and last-seen event
    pub duration: f64,
    pub error_count: usize,
    pub errors: Vec<String>,
    pub paths: Vec<String>,
    pub unique_paths: Vec<String>,
    pub error_rate: f64,
    pub is_error_session: bool,
}

/// Overlapping relevance buckets built in one pass over the events
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedData {
    pub user_sessions: BTreeMap<String, Vec<Event>>,
    pub page_views: BTreeMap<String, usize>,
    pub search_queries: BTreeMap<String, usize>,
    pub product_interactions: BTreeMap<String, usize>,
    pub errors: BTreeMap<String, usize>,
}

/// Cross-session summary shown on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_sessions: usize,
    pub unique_users: usize,
    pub total_errors: usize,
    /// Percentage, not a fraction
    pub error_rate: f64,
    pub average_sessions_per_user: f64,
    pub average_session_duration: f64,
    /// "HH:00" bucket with the most session starts
    pub most_active_time: String,
    pub session_distribution: String,
}

/// Combined payload consumed by the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    #[serde(flatten)]
    pub grouped: GroupedData,
    pub stats: SessionStats,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<Session>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
