//! Governance bucket allocation endpoint.
//!
//! Allocation is computed on read over the service-fee income in the window,
//! using the config version in effect at the window end, so the same window
//! always produces the same split.

use super::AppState;
use crate::domain::{bucket_account, AllocationBuckets, EntryType, Money, TimeMs};
use crate::engine;
use crate::error::{AppError, AppResult};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationQuery {
    pub from_ms: i64,
    pub to_ms: i64,
}

/// Computed share minus what has already been withdrawn from the bucket.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketAvailability {
    pub csr: Money,
    pub maintenance: Money,
    pub promo: Money,
    pub emergency: Money,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    pub from_ms: TimeMs,
    pub to_ms: TimeMs,
    #[serde(flatten)]
    pub buckets: AllocationBuckets,
    pub available: BucketAvailability,
}

pub async fn get_allocations(
    State(state): State<AppState>,
    Query(query): Query<AllocationQuery>,
) -> AppResult<Json<AllocationResponse>> {
    let from = TimeMs::new(query.from_ms);
    let to = TimeMs::new(query.to_ms);
    if from > to {
        return Err(AppError::BadRequest(
            "fromMs must not exceed toMs".to_string(),
        ));
    }

    let config = state
        .repo
        .get_platform_config_at(to)
        .await?
        .ok_or_else(|| AppError::NotFound("no platform config in effect".to_string()))?;

    let gross = state
        .repo
        .sum_income(EntryType::IncomeServiceFee, from, to)
        .await?;

    let buckets = engine::allocate(gross, &config);

    let available = BucketAvailability {
        csr: buckets.csr
            - state
                .repo
                .sum_bucket_withdrawals(&bucket_account("csr"))
                .await?,
        maintenance: buckets.maintenance
            - state
                .repo
                .sum_bucket_withdrawals(&bucket_account("maintenance"))
                .await?,
        promo: buckets.promo
            - state
                .repo
                .sum_bucket_withdrawals(&bucket_account("promo"))
                .await?,
        emergency: buckets.emergency
            - state
                .repo
                .sum_bucket_withdrawals(&bucket_account("emergency"))
                .await?,
    };

    Ok(Json(AllocationResponse {
        from_ms: from,
        to_ms: to,
        buckets,
        available,
    }))
}
