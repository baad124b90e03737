use std::collections::HashMap;
use crate::models::{Event, GroupedData, Session};


/// Bucket every event into the dashboard's relevance views in one pass.
/// Buckets overlap: one event can feed several counters.
pub fn group_by_relevance(events: &[Event]) -> GroupedData {
    let mut grouped = GroupedData::default();

    for event in events {
        grouped
            .user_sessions
            .entry(event.user_id.clone())
            .or_default()
            .push(event.clone());

        *grouped.page_views.entry(event.path.clone()).or_insert(0) += 1;

        if let Some(term) = event.search_term() {
            *grouped.search_queries.entry(term.to_string()).or_insert(0) += 1;
        }

        // Keyed by label, so distinct products with the same label share a count
        if event.is_product_interaction() {
            *grouped
                .product_interactions
                .entry(event.text.clone())
                .or_insert(0) += 1;
        }

        if event.is_error_element() {
            *grouped.errors.entry(event.text.clone()).or_insert(0) += 1;
        }
    }

    grouped
}

/// Folds events into sessions keyed by (user_id, session_id).
/// Sessions come out in the order their first event was seen.
#[derive(Debug, Default)]
pub struct SessionProjector {
    index: HashMap<(String, String), usize>,
    sessions: Vec<Session>,
}

impl SessionProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold(&mut self, event: &Event) {
        let key = (event.user_id.clone(), event.session_id.clone());
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.sessions.push(Session {
                    session_id: event.session_id.clone(),
                    user_id: event.user_id.clone(),
                    events: Vec::new(),
                    start_time: event.event_time,
                    end_time: event.event_time,
                    duration: 0.0,
                    error_count: 0,
                    errors: Vec::new(),
                    paths: Vec::new(),
                    unique_paths: Vec::new(),
                    error_rate: 0.0,
                    is_error_session: false,
                });
                self.index.insert(key, self.sessions.len() - 1);
                self.sessions.len() - 1
            }
        };

        let session = &mut self.sessions[idx];
        session.events.push(event.clone());
        session.paths.push(event.path.clone());
        if !session.unique_paths.contains(&event.path) {
            session.unique_paths.push(event.path.clone());
        }

        if event.has_error_label() {
            session.error_count += 1;
            session.errors.push(event.text.clone());
        }

        // start_time stays pinned to the first-seen event
        session.end_time = event.event_time;
        session.duration =
            (session.end_time - session.start_time).num_milliseconds() as f64 / 1000.0;
    }

    /// Fill in the derived error fields and hand the sessions over.
    pub fn finish(self) -> Vec<Session> {
        let mut sessions = self.sessions;
        for session in &mut sessions {
            session.error_rate = session.error_count as f64 / session.events.len() as f64;
            session.is_error_session = session.error_count > 0;
        }
        sessions
    }
}

pub fn reconstruct_sessions(events: &[Event]) -> Vec<Session> {
    let mut projector = SessionProjector::new();
    for event in events {
        projector.fold(event);
    }
    projector.finish()
}
