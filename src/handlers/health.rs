// handlers/health.rs - GET /health

use axum::extract::State;
use serde::Serialize;

use crate::api::AppState;
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

/// Liveness plus a database round trip. 503 when the pool cannot reach Postgres.
pub async fn health(State(state): State<AppState>) -> ApiResult<HealthStatus> {
    DatabaseManager::ping(&state.pool).await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::service_unavailable("database unreachable")
    })?;

    Ok(ApiResponse::success(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database: "ok",
    }))
}
