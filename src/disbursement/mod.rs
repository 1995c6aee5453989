//! Disbursement collaborator: the external transfer of money out of the
//! platform to a bank account, triggered on withdrawal approval.

use crate::domain::{BankDetails, Money};
use async_trait::async_trait;
use std::fmt;

pub mod http;
pub mod mock;

pub use http::HttpDisburser;
pub use mock::MockDisburser;

/// Successful disbursement acknowledgment from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisbursementReceipt {
    /// Provider-side reference for manual reconciliation.
    pub reference_id: String,
    /// Fee the provider charged the platform for the transfer.
    pub provider_fee: Money,
}

/// External disbursement provider.
///
/// The call is the only long-latency step in the payout path and must run
/// under a bounded timeout; implementations map a timeout to
/// `DisbursementError::Unknown`, never to `Rejected`, because the money may
/// already have left.
#[async_trait]
pub trait Disburser: Send + Sync + fmt::Debug {
    /// Transfer `amount` to the given bank account.
    async fn disburse(
        &self,
        bank: &BankDetails,
        amount: Money,
    ) -> Result<DisbursementReceipt, DisbursementError>;
}

/// Error type for disbursement operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisbursementError {
    /// The provider definitively rejected the transfer; no money moved.
    Rejected(String),
    /// The outcome is unknown (timeout, connection lost mid-flight).
    /// Callers must not assume failure: an administrator reconciles against
    /// the provider's records before any retry.
    Unknown(String),
    /// Malformed provider response.
    ParseError(String),
}

impl fmt::Display for DisbursementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisbursementError::Rejected(msg) => write!(f, "Disbursement rejected: {}", msg),
            DisbursementError::Unknown(msg) => write!(f, "Disbursement outcome unknown: {}", msg),
            DisbursementError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for DisbursementError {}
