//! Domain types for settlement, ledger, allocation, and payout.

pub mod allocation;
pub mod fee_config;
pub mod ledger;
pub mod money;
pub mod order;
pub mod primitives;
pub mod withdrawal;

pub use allocation::{AllocationBuckets, PlatformConfig, PlatformConfigError};
pub use fee_config::{FeeConfig, FeeConfigError};
pub use ledger::{
    bucket_account, wallet_account, EntryType, LedgerEntry, LedgerEntryError, NewLedgerEntry,
    PLATFORM_INCOME_ACCOUNT,
};
pub use money::Money;
pub use order::{CompletedOrder, Settlement};
pub use primitives::{OrderId, OwnerId, OwnerType, RegionId, TimeMs};
pub use withdrawal::{BankDetails, WithdrawalRequest, WithdrawalStatus};
