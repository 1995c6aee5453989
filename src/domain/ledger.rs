//! Append-only ledger journal types.
//!
//! Every entry records money moving in (debit) or out (credit) of platform
//! custody; the platform's net liquidity at any time is Σ debit − Σ credit.

use crate::domain::{Money, OwnerId, TimeMs};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Journal entry category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryType {
    /// Platform's own income from the buyer service fee and surcharge share.
    IncomeServiceFee,
    /// Platform income deducted from the courier's schedule amount.
    IncomeCourierAppFee,
    /// Funds received into custody on behalf of a merchant.
    MerchantPayout,
    /// Funds received into custody on behalf of a courier.
    CourierPayout,
    /// Funds disbursed out on an approved withdrawal.
    Withdrawal,
    /// Audit trail for a rejected withdrawal's restored hold.
    WithdrawalReversal,
    /// Fee charged by the external disbursement provider.
    DisbursementFee,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::IncomeServiceFee => "INCOME_SERVICE_FEE",
            EntryType::IncomeCourierAppFee => "INCOME_COURIER_APP_FEE",
            EntryType::MerchantPayout => "MERCHANT_PAYOUT",
            EntryType::CourierPayout => "COURIER_PAYOUT",
            EntryType::Withdrawal => "WITHDRAWAL",
            EntryType::WithdrawalReversal => "WITHDRAWAL_REVERSAL",
            EntryType::DisbursementFee => "DISBURSEMENT_FEE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INCOME_SERVICE_FEE" => Some(EntryType::IncomeServiceFee),
            "INCOME_COURIER_APP_FEE" => Some(EntryType::IncomeCourierAppFee),
            "MERCHANT_PAYOUT" => Some(EntryType::MerchantPayout),
            "COURIER_PAYOUT" => Some(EntryType::CourierPayout),
            "WITHDRAWAL" => Some(EntryType::Withdrawal),
            "WITHDRAWAL_REVERSAL" => Some(EntryType::WithdrawalReversal),
            "DISBURSEMENT_FEE" => Some(EntryType::DisbursementFee),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted ledger entry. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: Uuid,
    pub entry_type: EntryType,
    pub debit: Money,
    pub credit: Money,
    pub account_code: String,
    pub owner_id: Option<OwnerId>,
    pub description: String,
    pub created_at_ms: TimeMs,
}

impl LedgerEntry {
    /// Signed contribution to the platform's net liquidity.
    pub fn net(&self) -> Money {
        self.debit - self.credit
    }
}

/// An entry about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub entry_type: EntryType,
    pub debit: Money,
    pub credit: Money,
    pub account_code: String,
    pub owner_id: Option<OwnerId>,
    pub description: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerEntryError {
    #[error("Exactly one of debit/credit must be non-zero (debit {debit}, credit {credit})")]
    NotOneSided { debit: Money, credit: Money },
    #[error("Ledger amounts must be strictly positive (debit {debit}, credit {credit})")]
    NonPositive { debit: Money, credit: Money },
}

impl NewLedgerEntry {
    /// One-sided debit entry: money entering platform custody.
    pub fn debit(
        entry_type: EntryType,
        amount: Money,
        account_code: impl Into<String>,
        owner_id: Option<OwnerId>,
        description: impl Into<String>,
    ) -> Self {
        NewLedgerEntry {
            entry_type,
            debit: amount,
            credit: Money::zero(),
            account_code: account_code.into(),
            owner_id,
            description: description.into(),
        }
    }

    /// One-sided credit entry: money leaving platform custody.
    pub fn credit(
        entry_type: EntryType,
        amount: Money,
        account_code: impl Into<String>,
        owner_id: Option<OwnerId>,
        description: impl Into<String>,
    ) -> Self {
        NewLedgerEntry {
            entry_type,
            debit: Money::zero(),
            credit: amount,
            account_code: account_code.into(),
            owner_id,
            description: description.into(),
        }
    }

    /// Enforce the journal invariant: exactly one side set, strictly positive.
    pub fn validate(&self) -> Result<(), LedgerEntryError> {
        if self.debit.is_negative() || self.credit.is_negative() {
            return Err(LedgerEntryError::NonPositive {
                debit: self.debit,
                credit: self.credit,
            });
        }
        if self.debit.is_zero() == self.credit.is_zero() {
            return Err(LedgerEntryError::NotOneSided {
                debit: self.debit,
                credit: self.credit,
            });
        }
        Ok(())
    }
}

/// Account code for an owner's wallet, e.g. `wallet:merchant:m-1`.
pub fn wallet_account(owner_type: crate::domain::OwnerType, owner_id: &OwnerId) -> String {
    format!("wallet:{}:{}", owner_type.as_str(), owner_id.as_str())
}

/// Account code for platform income lines.
pub const PLATFORM_INCOME_ACCOUNT: &str = "platform:income";

/// Account code for a governance bucket, e.g. `bucket:csr`.
pub fn bucket_account(bucket: &str) -> String {
    format!("bucket:{}", bucket)
}
