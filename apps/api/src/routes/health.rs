//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}

/// GET /health - the process answers; `database` reports a probe query. No auth.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.db.health_check().await;
    if !database {
        tracing::warn!("Health check: database unreachable");
    }

    Json(HealthResponse {
        status: "ok",
        database,
    })
}
