//! Allocation engine: split gross service-fee income into governance buckets.
//!
//! Pure function over an aggregate; recomputed on read, never persisted
//! per-bucket. All math is integer floor division with the remainder
//! accruing to the net-profit bucket.

use crate::domain::{AllocationBuckets, Money, PlatformConfig};

/// Embedded value-added tax backed out of gross income: dpp = gross / 1.11.
const VAT_NUMERATOR: i64 = 100;
const VAT_DENOMINATOR: i64 = 111;

/// Fixed 0.5% withholding rate on the tax base. A business-rule constant,
/// deliberately not a tunable.
const WITHHOLDING_PER_MILLE: i64 = 5;

/// Split gross platform income into governance buckets under the given
/// config snapshot.
///
/// The explicit shares floor; `net` takes the remainder, so the five buckets
/// always sum to `gross` exactly. The tax provision is informational: it is
/// computed on the VAT-exclusive base (dpp) and carved out of `net` when
/// provisioned, not a sixth share of gross.
pub fn allocate(gross: Money, config: &PlatformConfig) -> AllocationBuckets {
    let dpp = gross.ratio(VAT_NUMERATOR, VAT_DENOMINATOR);
    let tax = dpp.ratio(WITHHOLDING_PER_MILLE, 1000);

    let csr = gross.percent(config.p_csr);
    let maintenance = gross.percent(config.p_sys);
    let promo = gross.percent(config.p_mkt);
    let emergency = gross.percent(config.p_emg);
    let net = gross - csr - maintenance - promo - emergency;

    AllocationBuckets {
        gross,
        dpp,
        tax,
        csr,
        maintenance,
        promo,
        emergency,
        net,
        config_effective_from_ms: config.effective_from_ms,
    }
}
