//! Per-region fee parameters.

use crate::domain::{Money, RegionId, TimeMs};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fee parameters for one administrative region.
///
/// Edits apply prospectively only: orders already settled are never
/// recomputed against a newer config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfig {
    pub region_id: RegionId,
    /// Fixed amount charged to the buyer on every order.
    pub buyer_service_fee: Money,
    /// Fixed deduction from the courier's schedule amount per delivery.
    pub courier_app_fee: Money,
    /// Cap on how many merchants of an order are billable.
    pub max_merchants_per_order: i64,
    /// Surcharge per additional merchant beyond the first.
    pub extra_fee_per_merchant: Money,
    /// Courier's share of the per-merchant surcharge.
    pub driver_extra_share: Money,
    /// Platform's nominal share of the per-merchant surcharge.
    pub app_extra_share: Money,
    pub updated_at_ms: TimeMs,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FeeConfigError {
    #[error("Fee amounts must be non-negative: {0}")]
    NegativeAmount(&'static str),
    #[error("maxMerchantsPerOrder must be at least 1, got {0}")]
    InvalidMerchantCap(i64),
    #[error("driverExtraShare ({driver}) exceeds extraFeePerMerchant ({extra})")]
    DriverShareExceedsSurcharge { driver: Money, extra: Money },
}

impl FeeConfig {
    /// Validate the config before it is written.
    ///
    /// `driver_extra_share + app_extra_share == extra_fee_per_merchant` is not
    /// enforced; the platform share is derived at settlement time so a
    /// mismatch becomes an implicit platform rounding buffer. The courier
    /// share may never exceed the surcharge itself.
    pub fn validate(&self) -> Result<(), FeeConfigError> {
        for (name, amount) in [
            ("buyerServiceFee", self.buyer_service_fee),
            ("courierAppFee", self.courier_app_fee),
            ("extraFeePerMerchant", self.extra_fee_per_merchant),
            ("driverExtraShare", self.driver_extra_share),
            ("appExtraShare", self.app_extra_share),
        ] {
            if amount.is_negative() {
                return Err(FeeConfigError::NegativeAmount(name));
            }
        }

        if self.max_merchants_per_order < 1 {
            return Err(FeeConfigError::InvalidMerchantCap(
                self.max_merchants_per_order,
            ));
        }

        if self.driver_extra_share > self.extra_fee_per_merchant {
            return Err(FeeConfigError::DriverShareExceedsSurcharge {
                driver: self.driver_extra_share,
                extra: self.extra_fee_per_merchant,
            });
        }

        if self.driver_extra_share + self.app_extra_share != self.extra_fee_per_merchant {
            tracing::warn!(
                region_id = %self.region_id,
                driver_extra_share = %self.driver_extra_share,
                app_extra_share = %self.app_extra_share,
                extra_fee_per_merchant = %self.extra_fee_per_merchant,
                "Extra-fee shares do not sum to the surcharge; difference accrues to the platform"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FeeConfig {
        FeeConfig {
            region_id: RegionId::new("jkt-selatan"),
            buyer_service_fee: Money::new(2000),
            courier_app_fee: Money::new(1000),
            max_merchants_per_order: 3,
            extra_fee_per_merchant: Money::new(3000),
            driver_extra_share: Money::new(2000),
            app_extra_share: Money::new(1000),
            updated_at_ms: TimeMs::new(0),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(config().validate(), Ok(()));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut cfg = config();
        cfg.buyer_service_fee = Money::new(-1);
        assert!(matches!(
            cfg.validate(),
            Err(FeeConfigError::NegativeAmount("buyerServiceFee"))
        ));
    }

    #[test]
    fn test_merchant_cap_must_be_positive() {
        let mut cfg = config();
        cfg.max_merchants_per_order = 0;
        assert!(matches!(
            cfg.validate(),
            Err(FeeConfigError::InvalidMerchantCap(0))
        ));
    }

    #[test]
    fn test_driver_share_may_not_exceed_surcharge() {
        let mut cfg = config();
        cfg.driver_extra_share = Money::new(3500);
        assert!(matches!(
            cfg.validate(),
            Err(FeeConfigError::DriverShareExceedsSurcharge { .. })
        ));
    }

    #[test]
    fn test_share_mismatch_allowed() {
        // driver + app != extra is tolerated; the platform absorbs the gap.
        let mut cfg = config();
        cfg.app_extra_share = Money::new(500);
        assert_eq!(cfg.validate(), Ok(()));
    }
}
