use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::analytics::{self, DashboardResponse, SeverityCount, SourceCount, TimeSeriesPoint};
use crate::errors::ApiError;
use crate::AppState;

/// GET /api/analytics/dashboard.
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, ApiError> {
    let counts = state.db.dashboard_counts().await?;
    Ok(Json(analytics::dashboard(counts, Utc::now())))
}

#[derive(Debug, Deserialize, Default)]
pub struct TimeSeriesQuery {
    pub hours: Option<String>,
}

/// GET /api/analytics/time-series?hours=24. Unparseable input falls back to
/// 24 hours; the window is capped at 7 days.
pub async fn time_series(Query(query): Query<TimeSeriesQuery>) -> Json<Vec<TimeSeriesPoint>> {
    let hours = query
        .hours
        .as_deref()
        .and_then(|raw| raw.parse::<i64>().ok())
        .unwrap_or(24)
        .clamp(0, 168);
    Json(analytics::time_series(hours, Utc::now()))
}

/// GET /api/analytics/severity-distribution.
pub async fn severity_distribution(
    State(state): State<AppState>,
) -> Result<Json<Vec<SeverityCount>>, ApiError> {
    Ok(Json(state.db.severity_distribution().await?))
}

/// GET /api/analytics/source-distribution.
pub async fn source_distribution(
    State(state): State<AppState>,
) -> Result<Json<Vec<SourceCount>>, ApiError> {
    Ok(Json(state.db.source_distribution().await?))
}
