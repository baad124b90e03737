use anyhow::Context;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use tower_http::cors::CorsLayer;
use tracing::{error, info, info_span};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::Result;
use crate::ingest::EventSource;
use crate::models::{AnalyticsReport, ErrorResponse, SessionsResponse};
use crate::pipeline::build_report;
use crate::projections::reconstruct_sessions;
use crate::stats::StatsAggregator;

const LOAD_FAILURE: &str = "Failed to load analytics data";

/// Read-only per-process state. Every request builds its own projections.
#[derive(Clone)]
pub struct AppState {
    source: EventSource,
    aggregator: StatsAggregator,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            source: EventSource::new(config.events_path.clone()),
            aggregator: StatsAggregator::new(config.offset),
        }
    }

    pub fn analytics(&self) -> Result<AnalyticsReport> {
        let parsed = self.source.read_events();
        build_report(&parsed.events, &self.aggregator)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/analytics", get(get_analytics))
        .route("/api/analytics/sessions", get(get_sessions))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let app = router(AppState::from_config(&config));

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!(
        addr = %config.listen,
        events_path = %config.events_path.display(),
        "session dashboard API listening"
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn root() -> &'static str {
    "Session Dashboard API v0.1.0"
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

type ApiResult<T> = std::result::Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn failure() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: LOAD_FAILURE.to_string(),
        }),
    )
}

async fn get_analytics(State(state): State<AppState>) -> ApiResult<AnalyticsReport> {
    let request_id = Uuid::new_v4();
    let outcome = tokio::task::spawn_blocking(move || {
        let _span = info_span!("analytics", %request_id).entered();
        state.analytics()
    })
    .await;

    match outcome {
        Ok(Ok(report)) => Ok(Json(report)),
        Ok(Err(e)) => {
            error!(%request_id, error = %e, "analytics pipeline failed");
            Err(failure())
        }
        Err(e) => {
            error!(%request_id, error = %e, "analytics task panicked");
            Err(failure())
        }
    }
}

async fn get_sessions(State(state): State<AppState>) -> ApiResult<SessionsResponse> {
    let request_id = Uuid::new_v4();
    let outcome = tokio::task::spawn_blocking(move || {
        let _span = info_span!("sessions", %request_id).entered();
        reconstruct_sessions(&state.source.read_events().events)
    })
    .await;

    match outcome {
        Ok(sessions) => Ok(Json(SessionsResponse {
            count: sessions.len(),
            sessions,
        })),
        Err(e) => {
            error!(%request_id, error = %e, "session task panicked");
            Err(failure())
        }
    }
}
