//! Platform income allocation: versioned percentages and the derived buckets.

use crate::domain::{Money, TimeMs};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A versioned snapshot of the governance allocation percentages.
///
/// Snapshots are append-only and apply prospectively: every allocation result
/// carries the `effective_from_ms` of the snapshot it was computed with, so a
/// percentage change today cannot silently reinterpret last month's report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    /// Corporate social responsibility share, in whole percent.
    pub p_csr: i64,
    /// System maintenance share, in whole percent.
    pub p_sys: i64,
    /// Marketing / promotion share, in whole percent.
    pub p_mkt: i64,
    /// Emergency reserve share, in whole percent.
    pub p_emg: i64,
    pub effective_from_ms: TimeMs,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlatformConfigError {
    #[error("Percentage {0} out of range 0..=100: {1}")]
    OutOfRange(&'static str, i64),
    #[error("Allocation percentages sum to {0}, exceeding 100")]
    SumExceedsHundred(i64),
}

impl PlatformConfig {
    /// Sum of the explicit bucket percentages; net profit is the remainder.
    pub fn allocated_percent(&self) -> i64 {
        self.p_csr + self.p_sys + self.p_mkt + self.p_emg
    }

    pub fn validate(&self) -> Result<(), PlatformConfigError> {
        for (name, p) in [
            ("pCsr", self.p_csr),
            ("pSys", self.p_sys),
            ("pMkt", self.p_mkt),
            ("pEmg", self.p_emg),
        ] {
            if !(0..=100).contains(&p) {
                return Err(PlatformConfigError::OutOfRange(name, p));
            }
        }
        let sum = self.allocated_percent();
        if sum > 100 {
            return Err(PlatformConfigError::SumExceedsHundred(sum));
        }
        Ok(())
    }
}

/// Derived governance buckets for a gross service-fee income aggregate.
///
/// Computed on read, never persisted per-entry. The bucket amounts always sum
/// to `gross` exactly: `net` is defined as the remainder after the four
/// explicit shares are floored off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationBuckets {
    pub gross: Money,
    /// Tax base: gross with the embedded 11% VAT backed out.
    pub dpp: Money,
    /// 0.5% withholding provision on the tax base.
    pub tax: Money,
    pub csr: Money,
    pub maintenance: Money,
    pub promo: Money,
    pub emergency: Money,
    pub net: Money,
    /// Which config version produced this split.
    pub config_effective_from_ms: TimeMs,
}
