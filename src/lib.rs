pub mod api;
pub mod config;
pub mod db;
pub mod disbursement;
pub mod domain;
pub mod engine;
pub mod error;
pub mod workflow;

pub use config::Config;
pub use db::{init_db, Repository};
pub use disbursement::{Disburser, DisbursementError, DisbursementReceipt, HttpDisburser, MockDisburser};
pub use domain::{
    BankDetails, CompletedOrder, EntryType, FeeConfig, LedgerEntry, Money, OrderId, OwnerId,
    OwnerType, PlatformConfig, RegionId, Settlement, TimeMs, WithdrawalRequest, WithdrawalStatus,
};
pub use error::AppError;
pub use workflow::{PayoutService, ReconciliationService, SettlementService};
