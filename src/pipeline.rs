use tracing::debug;

use crate::error::Result;
use crate::models::{AnalyticsReport, Event};
use crate::projections::{group_by_relevance, reconstruct_sessions};
use crate::stats::StatsAggregator;

/// Grouping, then session reconstruction, then statistics.
/// All working state is local to the call.
pub fn build_report(events: &[Event], aggregator: &StatsAggregator) -> Result<AnalyticsReport> {
    let grouped = group_by_relevance(events);
    let sessions = reconstruct_sessions(events);
    debug!(
        events = events.len(),
        users = grouped.user_sessions.len(),
        sessions = sessions.len(),
        "projected event log"
    );

    let stats = aggregator.aggregate(&sessions)?;
    Ok(AnalyticsReport { grouped, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use crate::ingest::parse_events;
    use chrono::{DateTime, Duration, Utc};
    use proptest::prelude::*;

    const LOG: &str = r##"
    {"uuid":"1","user_id":"user1","session_id":"session1","path":"/home","css":"body","text":"Welcome","value":null,"event_time":"2025-01-01T10:00:00Z"}
    {"uuid":"2","user_id":"user1","session_id":"session1","path":"/products","css":"#search-bar","text":"Search","value":"laptop","event_time":"2025-01-01T10:01:00Z"}
    {"uuid":"3","user_id":"user2","session_id":"session2","path":"/home","css":"body","text":"Welcome","value":null,"event_time":"2025-01-01T11:00:00Z"}
    {"uuid":"4","user_id":"user2","session_id":"session2","path":"/products/1","css":".product","text":"Product A","value":null,"event_time":"2025-01-01T11:01:00Z"}
    {"uuid":"5","user_id":"user1","session_id":"session1","path":"/error","css":"error-message","text":"Error occurred","value":null,"event_time":"2025-01-01T10:02:00Z"}
    "##;

    #[test]
    fn test_full_pipeline() {
        let parsed = parse_events(LOG);
        let report = build_report(&parsed.events, &StatsAggregator::default()).unwrap();

        assert_eq!(report.grouped.user_sessions.len(), 2);
        assert_eq!(report.grouped.page_views["/home"], 2);
        assert_eq!(report.stats.total_sessions, 2);
        assert_eq!(report.stats.unique_users, 2);
        assert_eq!(report.stats.total_errors, 1);
        assert_eq!(report.stats.error_rate, 50.0);
        assert_eq!(report.stats.average_session_duration, 90.0);
        assert_eq!(report.stats.most_active_time, "10:00");
    }

    #[test]
    fn test_report_serialises_dashboard_shape() {
        let parsed = parse_events(LOG);
        let report = build_report(&parsed.events, &StatsAggregator::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        for key in ["userSessions", "pageViews", "searchQueries", "productInteractions", "errors", "stats"] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(json["searchQueries"]["laptop"], 1);
        assert_eq!(json["stats"]["most_active_time"], "10:00");
        assert_eq!(json["userSessions"]["user1"][0]["event_time"], "2025-01-01T10:00:00Z");
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let parsed = parse_events(LOG);
        let first = serde_json::to_string(&build_report(&parsed.events, &StatsAggregator::default()).unwrap()).unwrap();
        let second = serde_json::to_string(&build_report(&parsed.events, &StatsAggregator::default()).unwrap()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_no_events_fails_explicitly() {
        let err = build_report(&[], &StatsAggregator::default()).unwrap_err();
        assert!(matches!(err, AnalyticsError::NoSessions));
    }

    fn base_time() -> DateTime<Utc> {
        "2025-01-01T00:00:00Z".parse().unwrap()
    }

    fn arb_event() -> impl Strategy<Value = Event> {
        (
            "u[0-3]",
            "s[0-2]",
            prop::sample::select(vec!["/home", "/products", "/products/1", "/error"]),
            prop::sample::select(vec!["body", "#search-bar", "div.error-message"]),
            "[A-Za-z ]{0,12}",
            proptest::option::of("[a-z]{0,6}"),
            0i64..86_400,
        )
            .prop_map(|(user, session, path, css, text, value, secs)| Event {
                uuid: format!("{}-{}-{}", user, session, secs),
                user_id: user,
                session_id: session,
                path: path.to_string(),
                css: css.to_string(),
                text,
                value,
                event_time: base_time() + Duration::seconds(secs),
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_every_event_is_one_page_view(events in prop::collection::vec(arb_event(), 1..40)) {
            let grouped = group_by_relevance(&events);
            let views: usize = grouped.page_views.values().sum();
            prop_assert_eq!(views, events.len());
        }

        #[test]
        fn prop_user_sessions_match_user_counts(events in prop::collection::vec(arb_event(), 1..40)) {
            let grouped = group_by_relevance(&events);
            for (user, list) in &grouped.user_sessions {
                let expected = events.iter().filter(|e| &e.user_id == user).count();
                prop_assert_eq!(list.len(), expected);
            }
        }

        #[test]
        fn prop_duration_is_gap_between_events(gap in 0i64..100_000) {
            let first = Event {
                uuid: "a".into(),
                user_id: "u".into(),
                session_id: "s".into(),
                path: "/".into(),
                css: "body".into(),
                text: "a".into(),
                value: None,
                event_time: base_time(),
            };
            let second = Event {
                uuid: "b".into(),
                event_time: base_time() + Duration::seconds(gap),
                ..first.clone()
            };
            let sessions = reconstruct_sessions(&[first, second]);
            prop_assert_eq!(sessions[0].duration, gap as f64);
        }

        #[test]
        fn prop_rates_follow_totals(events in prop::collection::vec(arb_event(), 1..40)) {
            let report = build_report(&events, &StatsAggregator::default()).unwrap();
            let stats = &report.stats;
            prop_assert_eq!(stats.error_rate, stats.total_errors as f64 / stats.total_sessions as f64 * 100.0);
            prop_assert_eq!(
                stats.average_sessions_per_user,
                stats.total_sessions as f64 / stats.unique_users as f64
            );
        }
    }
}
