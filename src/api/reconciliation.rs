//! Reconciliation report endpoint.

use super::AppState;
use crate::error::AppResult;
use crate::workflow::ReconciliationReport;
use axum::extract::State;
use axum::Json;

pub async fn get_reconciliation(
    State(state): State<AppState>,
) -> AppResult<Json<ReconciliationReport>> {
    let report = state.reconciliation.run().await?;
    Ok(Json(report))
}
