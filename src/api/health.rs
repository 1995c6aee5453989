//! Liveness and readiness probes.

use super::AppState;
use crate::error::AppResult;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Ready only when the database answers.
pub async fn ready(State(state): State<AppState>) -> AppResult<Json<Value>> {
    sqlx::query("SELECT 1").execute(state.repo.pool()).await?;
    Ok(Json(json!({ "status": "ready" })))
}
