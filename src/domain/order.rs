//! Completed-order input and the recorded settlement.

use crate::domain::{Money, OrderId, OwnerId, RegionId, TimeMs};
use serde::{Deserialize, Serialize};

/// Completed-order event consumed from the order-placement collaborator.
///
/// Immutable for settlement purposes: these fields describe what the buyer
/// actually paid, never what the current config would charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedOrder {
    pub order_id: OrderId,
    pub region_id: RegionId,
    pub merchant_id: OwnerId,
    pub courier_id: OwnerId,
    /// Everything the buyer paid: goods + delivery + service fee + surcharge.
    pub total_price: Money,
    /// The courier's fixed schedule amount for the trip.
    pub delivery_fee: Money,
    pub merchant_count: i64,
}

/// A recorded settlement. Write-once: the monetary fields are never
/// recomputed after the first write so the ledger stays consistent with what
/// was actually disbursed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub order_id: OrderId,
    pub region_id: RegionId,
    pub merchant_id: OwnerId,
    pub courier_id: OwnerId,
    pub total_price: Money,
    pub delivery_fee: Money,
    pub merchant_count: i64,
    pub service_fee: Money,
    pub extra_charge: Money,
    pub merchant_earning: Money,
    pub courier_earning_pure: Money,
    pub courier_earning_extra: Money,
    pub app_earning_total: Money,
    pub courier_app_fee: Money,
    pub settled_at_ms: TimeMs,
}

impl Settlement {
    /// Total paid out to the courier (schedule amount net of the app fee,
    /// plus the multi-merchant share).
    pub fn courier_earning_total(&self) -> Money {
        self.courier_earning_pure + self.courier_earning_extra
    }
}
