//! Region fee config endpoints.

use super::AppState;
use crate::domain::{FeeConfig, Money, RegionId, TimeMs};
use crate::error::{AppError, AppResult};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfigBody {
    pub buyer_service_fee: Money,
    pub courier_app_fee: Money,
    pub max_merchants_per_order: i64,
    pub extra_fee_per_merchant: Money,
    pub driver_extra_share: Money,
    pub app_extra_share: Money,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfigResponse {
    pub region_id: RegionId,
    #[serde(flatten)]
    pub body: FeeConfigBody,
    pub updated_at_ms: TimeMs,
}

impl From<FeeConfig> for FeeConfigResponse {
    fn from(c: FeeConfig) -> Self {
        FeeConfigResponse {
            region_id: c.region_id,
            body: FeeConfigBody {
                buyer_service_fee: c.buyer_service_fee,
                courier_app_fee: c.courier_app_fee,
                max_merchants_per_order: c.max_merchants_per_order,
                extra_fee_per_merchant: c.extra_fee_per_merchant,
                driver_extra_share: c.driver_extra_share,
                app_extra_share: c.app_extra_share,
            },
            updated_at_ms: c.updated_at_ms,
        }
    }
}

pub async fn get_fee_config(
    State(state): State<AppState>,
    Path(region_id): Path<String>,
) -> AppResult<Json<FeeConfigResponse>> {
    let region_id = RegionId::new(region_id);
    let config = state
        .repo
        .get_fee_config(&region_id)
        .await?
        .ok_or_else(|| AppError::ConfigNotFound(region_id))?;
    Ok(Json(config.into()))
}

/// Upsert a region's fee config. Applies prospectively only.
pub async fn put_fee_config(
    State(state): State<AppState>,
    Path(region_id): Path<String>,
    Json(body): Json<FeeConfigBody>,
) -> AppResult<Json<FeeConfigResponse>> {
    let config = FeeConfig {
        region_id: RegionId::new(region_id),
        buyer_service_fee: body.buyer_service_fee,
        courier_app_fee: body.courier_app_fee,
        max_merchants_per_order: body.max_merchants_per_order,
        extra_fee_per_merchant: body.extra_fee_per_merchant,
        driver_extra_share: body.driver_extra_share,
        app_extra_share: body.app_extra_share,
        updated_at_ms: TimeMs::now(),
    };
    config.validate()?;

    state.repo.upsert_fee_config(&config).await?;
    info!(region_id = %config.region_id, "Fee config updated");
    Ok(Json(config.into()))
}
