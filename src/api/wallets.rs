//! Wallet balance endpoint.

use super::AppState;
use crate::domain::{Money, OwnerId, OwnerType};
use crate::error::{AppError, AppResult};
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResponse {
    pub owner_id: OwnerId,
    pub owner_type: OwnerType,
    /// Spendable balance (holds already subtracted).
    pub balance: Money,
    /// Amount locked by REQUESTED and PROCESSING withdrawals.
    pub held: Money,
}

pub async fn get_wallet(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> AppResult<Json<WalletResponse>> {
    let owner_id = OwnerId::new(owner_id);
    let (owner_type, balance) = state
        .repo
        .get_wallet(&owner_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("wallet for {}", owner_id)))?;
    let held = state.repo.held_amount(&owner_id).await?;

    Ok(Json(WalletResponse {
        owner_id,
        owner_type,
        balance,
        held,
    }))
}
