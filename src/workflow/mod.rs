//! Service layer: multi-step operations composed from the repository, the
//! pure calculators, and the external disbursement provider.

pub mod payout;
pub mod reconciliation;
pub mod settlement;

pub use payout::PayoutService;
pub use reconciliation::{OwnerReconciliation, ReconciliationReport, ReconciliationService};
pub use settlement::SettlementService;
