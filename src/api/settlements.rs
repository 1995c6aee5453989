//! Settlement endpoints.

use super::AppState;
use crate::domain::{CompletedOrder, Money, OrderId, Settlement, TimeMs};
use crate::error::{AppError, AppResult};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementResponse {
    pub order_id: OrderId,
    pub region_id: crate::domain::RegionId,
    pub merchant_id: crate::domain::OwnerId,
    pub courier_id: crate::domain::OwnerId,
    pub total_price: Money,
    pub delivery_fee: Money,
    pub merchant_count: i64,
    pub service_fee: Money,
    pub extra_charge: Money,
    pub merchant_earning: Money,
    pub courier_earning_pure: Money,
    pub courier_earning_extra: Money,
    pub courier_earning_total: Money,
    pub app_earning_total: Money,
    pub courier_app_fee: Money,
    pub settled_at_ms: TimeMs,
}

impl From<Settlement> for SettlementResponse {
    fn from(s: Settlement) -> Self {
        let courier_earning_total = s.courier_earning_total();
        SettlementResponse {
            order_id: s.order_id,
            region_id: s.region_id,
            merchant_id: s.merchant_id,
            courier_id: s.courier_id,
            total_price: s.total_price,
            delivery_fee: s.delivery_fee,
            merchant_count: s.merchant_count,
            service_fee: s.service_fee,
            extra_charge: s.extra_charge,
            merchant_earning: s.merchant_earning,
            courier_earning_pure: s.courier_earning_pure,
            courier_earning_extra: s.courier_earning_extra,
            courier_earning_total,
            app_earning_total: s.app_earning_total,
            courier_app_fee: s.courier_app_fee,
            settled_at_ms: s.settled_at_ms,
        }
    }
}

/// Settle a completed order. Write-once per order id.
pub async fn create_settlement(
    State(state): State<AppState>,
    Json(order): Json<CompletedOrder>,
) -> AppResult<(StatusCode, Json<SettlementResponse>)> {
    let settlement = state.settlement.settle_order(&order).await?;
    Ok((StatusCode::CREATED, Json(settlement.into())))
}

pub async fn get_settlement(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> AppResult<Json<SettlementResponse>> {
    let order_id = OrderId::new(order_id);
    let settlement = state
        .repo
        .get_settlement(&order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("settlement for order {}", order_id)))?;
    Ok(Json(settlement.into()))
}
