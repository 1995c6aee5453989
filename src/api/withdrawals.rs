//! Withdrawal queue endpoints.

use super::AppState;
use crate::domain::{BankDetails, Money, OwnerId, WithdrawalRequest, WithdrawalStatus};
use crate::error::{AppError, AppResult};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWithdrawalBody {
    pub owner_id: OwnerId,
    pub amount: Money,
    pub bank: BankDetails,
}

pub async fn create_withdrawal(
    State(state): State<AppState>,
    Json(body): Json<CreateWithdrawalBody>,
) -> AppResult<(StatusCode, Json<WithdrawalRequest>)> {
    let request = state
        .payout
        .request_withdrawal(&body.owner_id, body.amount, &body.bank)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

pub async fn list_withdrawals(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<WithdrawalRequest>>> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            WithdrawalStatus::parse(s)
                .ok_or_else(|| AppError::BadRequest(format!("unknown status: {}", s)))
        })
        .transpose()?;

    let requests = state.repo.list_withdrawals(status).await?;
    Ok(Json(requests))
}

pub async fn get_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WithdrawalRequest>> {
    let request = state
        .repo
        .get_withdrawal(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("withdrawal {}", id)))?;
    Ok(Json(request))
}

pub async fn approve_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<WithdrawalRequest>> {
    let request = state.payout.approve_withdrawal(id).await?;
    Ok(Json(request))
}

/// Admin resolution of a request stranded PROCESSING by an unknown
/// disbursement outcome, after checking the provider's records.
#[derive(Debug, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ResolveBody {
    /// The transfer went through: complete it with the provider's reference.
    #[serde(rename_all = "camelCase")]
    Disbursed {
        reference_id: String,
        provider_fee: Option<Money>,
    },
    /// The transfer never happened: requeue with the hold intact.
    Failed,
}

pub async fn resolve_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ResolveBody>,
) -> AppResult<Json<WithdrawalRequest>> {
    let request = match body {
        ResolveBody::Disbursed {
            reference_id,
            provider_fee,
        } => {
            state
                .payout
                .resolve_disbursed(id, &reference_id, provider_fee.unwrap_or_else(Money::zero))
                .await?
        }
        ResolveBody::Failed => state.payout.resolve_failed(id).await?,
    };
    Ok(Json(request))
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
    pub reason: String,
}

pub async fn reject_withdrawal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectBody>,
) -> AppResult<Json<WithdrawalRequest>> {
    if body.reason.trim().is_empty() {
        return Err(AppError::BadRequest(
            "a rejection reason is required".to_string(),
        ));
    }
    let request = state.payout.reject_withdrawal(id, &body.reason).await?;
    Ok(Json(request))
}
