//! Settlement calculator: the per-order monetary split.
//!
//! Pure function over a completed order and the fee config in effect; the
//! caller is responsible for the write-once guard when recording the result.

use crate::domain::{CompletedOrder, FeeConfig, Money};
use thiserror::Error;

/// The computed split of one completed order.
///
/// Invariant (enforced before returning):
/// `merchant_earning + courier_earning_pure + courier_earning_extra +
/// app_earning_total + courier_app_fee == total_price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementSplit {
    pub service_fee: Money,
    pub extra_charge: Money,
    pub merchant_earning: Money,
    pub courier_earning_pure: Money,
    pub courier_earning_extra: Money,
    pub app_earning_total: Money,
    pub courier_app_fee: Money,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettlementInputError {
    #[error("merchantCount must be at least 1, got {0}")]
    InvalidMerchantCount(i64),
    #[error("Delivery fee {delivery_fee} does not cover the courier app fee {courier_app_fee}")]
    DeliveryFeeBelowAppFee {
        delivery_fee: Money,
        courier_app_fee: Money,
    },
    #[error("Order total {total_price} is less than fees and delivery ({charges}); goods subtotal would be negative")]
    TotalBelowCharges {
        total_price: Money,
        charges: Money,
    },
}

/// Compute the split of a completed order under the given region config.
///
/// The multi-merchant surcharge is billed per additional merchant, capped at
/// `max_merchants_per_order`. The courier's surcharge share is the configured
/// fixed amount per extra merchant; the platform's share is the remainder of
/// the surcharge, so any configured share mismatch accrues to the platform.
pub fn settle(
    order: &CompletedOrder,
    config: &FeeConfig,
) -> Result<SettlementSplit, SettlementInputError> {
    if order.merchant_count < 1 {
        return Err(SettlementInputError::InvalidMerchantCount(
            order.merchant_count,
        ));
    }

    // Billable extra merchants beyond the first, capped.
    let extra_merchants = order.merchant_count.min(config.max_merchants_per_order) - 1;

    let service_fee = config.buyer_service_fee;
    let extra_charge = config.extra_fee_per_merchant.times(extra_merchants);
    let courier_earning_extra = config.driver_extra_share.times(extra_merchants);
    // Remainder of the surcharge goes to the platform, never the other way.
    let app_earning_extra = extra_charge - courier_earning_extra;

    let courier_app_fee = config.courier_app_fee;
    if order.delivery_fee < courier_app_fee {
        return Err(SettlementInputError::DeliveryFeeBelowAppFee {
            delivery_fee: order.delivery_fee,
            courier_app_fee,
        });
    }
    let courier_earning_pure = order.delivery_fee - courier_app_fee;

    let charges = order.delivery_fee + service_fee + extra_charge;
    if order.total_price < charges {
        return Err(SettlementInputError::TotalBelowCharges {
            total_price: order.total_price,
            charges,
        });
    }
    let merchant_earning = order.total_price - charges;

    let app_earning_total = service_fee + app_earning_extra;

    let split = SettlementSplit {
        service_fee,
        extra_charge,
        merchant_earning,
        courier_earning_pure,
        courier_earning_extra,
        app_earning_total,
        courier_app_fee,
    };
    debug_assert_eq!(
        split.merchant_earning
            + split.courier_earning_pure
            + split.courier_earning_extra
            + split.app_earning_total
            + split.courier_app_fee,
        order.total_price
    );
    Ok(split)
}
