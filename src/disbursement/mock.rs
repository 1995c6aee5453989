//! Scriptable disbursement provider for tests.

use super::{Disburser, DisbursementError, DisbursementReceipt};
use crate::domain::{BankDetails, Money};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// What the mock should do on each call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Succeed { reference_id: String, provider_fee: Money },
    Reject(String),
    Unknown(String),
}

/// In-memory disbursement provider with a scripted outcome and a call
/// counter, so tests can assert the external call happened exactly once.
#[derive(Debug, Clone)]
pub struct MockDisburser {
    outcome: MockOutcome,
    calls: Arc<AtomicUsize>,
}

impl MockDisburser {
    pub fn succeeding(reference_id: &str) -> Self {
        Self {
            outcome: MockOutcome::Succeed {
                reference_id: reference_id.to_string(),
                provider_fee: Money::zero(),
            },
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn succeeding_with_fee(reference_id: &str, provider_fee: Money) -> Self {
        Self {
            outcome: MockOutcome::Succeed {
                reference_id: reference_id.to_string(),
                provider_fee,
            },
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            outcome: MockOutcome::Reject(reason.to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Simulates a timeout or dropped connection after the request was sent.
    pub fn timing_out() -> Self {
        Self {
            outcome: MockOutcome::Unknown("request timed out".to_string()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of disburse calls made so far. Clones share the counter.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Disburser for MockDisburser {
    async fn disburse(
        &self,
        _bank: &BankDetails,
        _amount: Money,
    ) -> Result<DisbursementReceipt, DisbursementError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            MockOutcome::Succeed {
                reference_id,
                provider_fee,
            } => Ok(DisbursementReceipt {
                reference_id: reference_id.clone(),
                provider_fee: *provider_fee,
            }),
            MockOutcome::Reject(reason) => Err(DisbursementError::Rejected(reason.clone())),
            MockOutcome::Unknown(reason) => Err(DisbursementError::Unknown(reason.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank() -> BankDetails {
        BankDetails {
            bank_name: "BCA".to_string(),
            account_number: "1234567890".to_string(),
            account_name: "Test Account".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_counts_calls_across_clones() {
        let mock = MockDisburser::succeeding("ref-1");
        let clone = mock.clone();
        clone.disburse(&bank(), Money::new(1000)).await.unwrap();
        clone.disburse(&bank(), Money::new(2000)).await.unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_mock_rejects() {
        let mock = MockDisburser::rejecting("account closed");
        let err = mock.disburse(&bank(), Money::new(1000)).await.unwrap_err();
        assert_eq!(err, DisbursementError::Rejected("account closed".to_string()));
    }

    #[tokio::test]
    async fn test_mock_unknown_outcome() {
        let mock = MockDisburser::timing_out();
        let err = mock.disburse(&bank(), Money::new(1000)).await.unwrap_err();
        assert!(matches!(err, DisbursementError::Unknown(_)));
    }
}
