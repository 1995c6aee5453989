//! Pure computation engines: settlement split and income allocation.

pub mod allocation;
pub mod settlement;

pub use allocation::allocate;
pub use settlement::{settle, SettlementInputError, SettlementSplit};
