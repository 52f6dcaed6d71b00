//! Health check handlers

use crate::services::AppState;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub storage: CheckResult,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// Readiness probe - checks the upload directory is usable
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    let storage = match tokio::fs::metadata(state.store.dir()).await {
        Ok(meta) if meta.is_dir() => CheckResult {
            status: "up".to_string(),
            error: None,
        },
        Ok(_) => CheckResult {
            status: "down".to_string(),
            error: Some("upload path is not a directory".to_string()),
        },
        Err(e) => CheckResult {
            status: "down".to_string(),
            error: Some(e.to_string()),
        },
    };

    let all_healthy = storage.status == "up";

    Json(ReadyResponse {
        status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
        checks: HealthChecks { storage },
    })
}
