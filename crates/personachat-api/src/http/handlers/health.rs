//! Health check handler.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub environment: String,
    pub services: BTreeMap<&'static str, &'static str>,
    pub version: &'static str,
}

/// GET /health and /api/health
///
/// Returns 503 when the database does not answer.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<HealthReport>>, AppError> {
    if let Err(e) = state.db_pool.ping().await {
        tracing::error!(error = %e, "Health check failed: database unreachable");
        return Err(AppError::Unavailable("Database unavailable".to_string()));
    }

    let services = BTreeMap::from([
        ("api", "healthy"),
        ("chat", "healthy"),
        ("database", "healthy"),
        ("personas", "healthy"),
    ]);

    Ok(Json(ApiResponse::success(HealthReport {
        status: "healthy",
        timestamp: Utc::now(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        environment: state.config.environment.to_string(),
        services,
        version: env!("CARGO_PKG_VERSION"),
    })))
}
