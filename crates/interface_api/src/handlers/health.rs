//! Health check handlers

use axum::{extract::State, Json};
use serde::Serialize;

use core_kernel::{HealthCheckResult, HealthCheckable};

use crate::{error::ApiError, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<HealthCheckResult>,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Vec::new(),
    })
}

/// Readiness check (pings every store)
pub async fn readiness_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let checks = vec![
        state.accounts.health_check().await,
        state.ledger.health_check().await,
        state.expenses.health_check().await,
    ];

    if let Some(failed) = checks.iter().find(|c| !c.is_healthy()) {
        return Err(ApiError::Unavailable(format!(
            "{}: {}",
            failed.adapter_id,
            failed.message.as_deref().unwrap_or("unhealthy")
        )));
    }

    Ok(Json(HealthResponse {
        status: "ready".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks,
    }))
}
