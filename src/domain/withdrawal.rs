//! Withdrawal requests and the payout state machine's states.

use crate::domain::{Money, OwnerId, TimeMs};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a withdrawal request.
///
/// `Requested → Processing → {Completed, Rejected}`; `Requested → Rejected`
/// directly on admin rejection. `Processing` is the server-side guard that
/// makes approval exactly-once: a duplicate approve observes "not REQUESTED"
/// and no-ops. Completed and Rejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WithdrawalStatus {
    Requested,
    Processing,
    Completed,
    Rejected,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Requested => "REQUESTED",
            WithdrawalStatus::Processing => "PROCESSING",
            WithdrawalStatus::Completed => "COMPLETED",
            WithdrawalStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "REQUESTED" => Some(WithdrawalStatus::Requested),
            "PROCESSING" => Some(WithdrawalStatus::Processing),
            "COMPLETED" => Some(WithdrawalStatus::Completed),
            "REJECTED" => Some(WithdrawalStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WithdrawalStatus::Completed | WithdrawalStatus::Rejected
        )
    }
}

impl std::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Destination bank account for a disbursement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub bank_name: String,
    pub account_number: String,
    pub account_name: String,
}

impl BankDetails {
    /// All three fields are required for the disbursement provider.
    pub fn is_complete(&self) -> bool {
        !self.bank_name.trim().is_empty()
            && !self.account_number.trim().is_empty()
            && !self.account_name.trim().is_empty()
    }
}

/// A withdrawal request against a wallet balance.
///
/// The requested amount is held (wallet decremented) at creation time; the
/// hold is released only on rejection, never on an unknown disbursement
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub amount: Money,
    pub bank: BankDetails,
    pub status: WithdrawalStatus,
    pub admin_note: Option<String>,
    /// Provider reference returned by a successful disbursement.
    pub disbursement_ref: Option<String>,
    pub created_at_ms: TimeMs,
    pub processed_at_ms: Option<TimeMs>,
}
