//! Reconciliation sweep: verify the materialized wallets against the
//! ledger, which is the source of truth.

use crate::db::Repository;
use crate::domain::{Money, OwnerId, OwnerType};
use crate::error::AppResult;
use futures::future::try_join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// One owner's reconciliation line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerReconciliation {
    pub owner_id: OwnerId,
    pub owner_type: OwnerType,
    /// Σ debit − Σ credit over the owner's journal entries.
    pub ledger_balance: Money,
    /// Spendable wallet balance.
    pub wallet_balance: Money,
    /// Amounts held by non-terminal withdrawal requests.
    pub held: Money,
    /// `ledger_balance − (wallet_balance + held)`. Zero when consistent.
    pub drift: Money,
}

impl OwnerReconciliation {
    pub fn is_consistent(&self) -> bool {
        self.drift.is_zero()
    }
}

/// Full sweep result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    /// Σ debit − Σ credit across the whole journal.
    pub cash_position: Money,
    pub owners: Vec<OwnerReconciliation>,
    pub consistent: bool,
}

pub struct ReconciliationService {
    repo: Arc<Repository>,
}

impl ReconciliationService {
    pub fn new(repo: Arc<Repository>) -> Self {
        ReconciliationService { repo }
    }

    /// Sweep every wallet and compare it against the ledger.
    pub async fn run(&self) -> AppResult<ReconciliationReport> {
        let cash_position = self.repo.ledger_cash_position().await?;

        let wallets = self.repo.list_wallets().await?;
        let owners = try_join_all(wallets.into_iter().map(
            |(owner_id, owner_type, wallet_balance)| {
                let repo = self.repo.clone();
                async move {
                    let ledger_balance = repo.owner_ledger_balance(&owner_id).await?;
                    let held = repo.held_amount(&owner_id).await?;
                    let drift = ledger_balance - (wallet_balance + held);

                    if !drift.is_zero() {
                        error!(
                            owner_id = %owner_id,
                            ledger = %ledger_balance,
                            wallet = %wallet_balance,
                            held = %held,
                            drift = %drift,
                            "Wallet disagrees with ledger"
                        );
                    }

                    Ok::<_, sqlx::Error>(OwnerReconciliation {
                        owner_id,
                        owner_type,
                        ledger_balance,
                        wallet_balance,
                        held,
                        drift,
                    })
                }
            },
        ))
        .await?;

        let consistent = owners.iter().all(OwnerReconciliation::is_consistent);
        info!(
            cash_position = %cash_position,
            owners = owners.len(),
            consistent,
            "Reconciliation sweep finished"
        );

        Ok(ReconciliationReport {
            cash_position,
            owners,
            consistent,
        })
    }
}
