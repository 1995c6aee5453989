//! Payout workflow: request, approve, reject, and resolve withdrawals.
//!
//! Approval is the only path that moves real money out, so it layers three
//! guards: a per-owner reconciliation check, the REQUESTED → PROCESSING
//! claim, and the unknown-outcome rule that keeps the hold when the provider
//! call times out. A request stranded PROCESSING that way is later resolved
//! by an admin against the provider's records, as disbursed or as failed.

use crate::db::Repository;
use crate::disbursement::{Disburser, DisbursementError};
use crate::domain::{
    BankDetails, Money, OwnerId, OwnerType, TimeMs, WithdrawalRequest, WithdrawalStatus,
};
use crate::error::{AppError, AppResult};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub struct PayoutService {
    repo: Arc<Repository>,
    disburser: Arc<dyn Disburser>,
}

impl PayoutService {
    pub fn new(repo: Arc<Repository>, disburser: Arc<dyn Disburser>) -> Self {
        PayoutService { repo, disburser }
    }

    /// Create a withdrawal request, holding the funds immediately.
    ///
    /// The hold (conditional wallet decrement) and the REQUESTED row are one
    /// transaction, so two concurrent requests cannot both spend the same
    /// balance.
    pub async fn request_withdrawal(
        &self,
        owner_id: &OwnerId,
        amount: Money,
        bank: &BankDetails,
    ) -> AppResult<WithdrawalRequest> {
        if !amount.is_positive() {
            return Err(AppError::BadRequest(format!(
                "withdrawal amount must be positive, got {}",
                amount
            )));
        }
        if !bank.is_complete() {
            return Err(AppError::BadRequest(
                "bank name, account number, and account name are all required".to_string(),
            ));
        }

        let request = self
            .repo
            .create_withdrawal_atomic(owner_id, amount, bank, TimeMs::now())
            .await?
            .ok_or_else(|| AppError::InsufficientBalance {
                owner_id: owner_id.clone(),
                requested: amount,
            })?;

        info!(
            withdrawal_id = %request.id,
            owner_id = %owner_id,
            amount = %amount,
            "Withdrawal requested, funds held"
        );
        Ok(request)
    }

    /// Approve a REQUESTED withdrawal and disburse it.
    ///
    /// On a definitive provider rejection the request is returned to
    /// REQUESTED for the admin to retry or reject. On an unknown outcome the
    /// request stays PROCESSING and the hold stays in place: the money may
    /// already have left, and only manual reconciliation against the
    /// provider's records can say.
    pub async fn approve_withdrawal(&self, id: Uuid) -> AppResult<WithdrawalRequest> {
        let request = self
            .repo
            .get_withdrawal(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("withdrawal {}", id)))?;

        let owner_type = self.owner_type(&request.owner_id).await?;
        self.check_owner_reconciled(&request.owner_id).await?;

        // Claim the request. Exactly one concurrent approve wins.
        let claimed = self
            .repo
            .transition_withdrawal(id, WithdrawalStatus::Requested, WithdrawalStatus::Processing)
            .await?;
        if !claimed {
            return Err(self.stale_state_error(id, WithdrawalStatus::Requested).await);
        }

        match self.disburser.disburse(&request.bank, request.amount).await {
            Ok(receipt) => {
                let completed = self
                    .repo
                    .complete_withdrawal_atomic(
                        &request,
                        owner_type,
                        &receipt.reference_id,
                        receipt.provider_fee,
                        TimeMs::now(),
                    )
                    .await?;
                if !completed {
                    // Money left the platform but the journal has no record
                    // of it. Loud failure, never a silent success.
                    error!(
                        withdrawal_id = %id,
                        reference_id = %receipt.reference_id,
                        "Disbursed but the completion transition was lost"
                    );
                    return Err(AppError::Internal(format!(
                        "withdrawal {} disbursed (ref {}) but could not be completed",
                        id, receipt.reference_id
                    )));
                }
                info!(
                    withdrawal_id = %id,
                    reference_id = %receipt.reference_id,
                    amount = %request.amount,
                    "Withdrawal disbursed"
                );
                self.repo
                    .get_withdrawal(id)
                    .await?
                    .ok_or_else(|| AppError::Internal(format!("withdrawal {} vanished", id)))
            }
            Err(DisbursementError::Rejected(reason)) => {
                // No money moved. Hand the request back to the queue.
                warn!(withdrawal_id = %id, reason = %reason, "Provider rejected disbursement");
                self.repo
                    .transition_withdrawal(
                        id,
                        WithdrawalStatus::Processing,
                        WithdrawalStatus::Requested,
                    )
                    .await?;
                Err(AppError::BadRequest(format!(
                    "disbursement rejected: {}",
                    reason
                )))
            }
            Err(DisbursementError::Unknown(reason) | DisbursementError::ParseError(reason)) => {
                // The transfer may have gone through. Keep the hold, keep
                // PROCESSING, require a human.
                error!(
                    withdrawal_id = %id,
                    reason = %reason,
                    "Disbursement outcome unknown, manual reconciliation required"
                );
                Err(AppError::DisbursementUnknown(id))
            }
        }
    }

    /// Reject a REQUESTED withdrawal and restore the held funds.
    pub async fn reject_withdrawal(
        &self,
        id: Uuid,
        reason: &str,
    ) -> AppResult<WithdrawalRequest> {
        let request = self
            .repo
            .get_withdrawal(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("withdrawal {}", id)))?;

        let owner_type = self.owner_type(&request.owner_id).await?;

        let rejected = self
            .repo
            .reject_withdrawal_atomic(&request, owner_type, reason, TimeMs::now())
            .await?;
        if !rejected {
            return Err(self.stale_state_error(id, WithdrawalStatus::Requested).await);
        }

        info!(withdrawal_id = %id, owner_id = %request.owner_id, "Withdrawal rejected, hold restored");
        self.repo
            .get_withdrawal(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("withdrawal {} vanished", id)))
    }

    /// Resolve a PROCESSING request the admin has confirmed, against the
    /// provider's records, as actually disbursed. Performs the same terminal
    /// transition and journal writes as a successful approve.
    pub async fn resolve_disbursed(
        &self,
        id: Uuid,
        reference_id: &str,
        provider_fee: Money,
    ) -> AppResult<WithdrawalRequest> {
        let request = self
            .repo
            .get_withdrawal(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("withdrawal {}", id)))?;
        let owner_type = self.owner_type(&request.owner_id).await?;

        let completed = self
            .repo
            .complete_withdrawal_atomic(&request, owner_type, reference_id, provider_fee, TimeMs::now())
            .await?;
        if !completed {
            return Err(self.stale_state_error(id, WithdrawalStatus::Processing).await);
        }

        info!(
            withdrawal_id = %id,
            reference_id = %reference_id,
            "Withdrawal resolved as disbursed"
        );
        self.repo
            .get_withdrawal(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("withdrawal {} vanished", id)))
    }

    /// Resolve a PROCESSING request the admin has confirmed as never
    /// disbursed: hand it back to the queue. The hold stays in place, so the
    /// request can then be approved again or rejected.
    pub async fn resolve_failed(&self, id: Uuid) -> AppResult<WithdrawalRequest> {
        if self.repo.get_withdrawal(id).await?.is_none() {
            return Err(AppError::NotFound(format!("withdrawal {}", id)));
        }

        let requeued = self
            .repo
            .transition_withdrawal(id, WithdrawalStatus::Processing, WithdrawalStatus::Requested)
            .await?;
        if !requeued {
            return Err(self.stale_state_error(id, WithdrawalStatus::Processing).await);
        }

        info!(withdrawal_id = %id, "Withdrawal resolved as failed, back in queue");
        self.repo
            .get_withdrawal(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("withdrawal {} vanished", id)))
    }

    /// A guarded transition observed zero rows: report the status the row
    /// holds now, not the one fetched before the race.
    async fn stale_state_error(&self, id: Uuid, expected: WithdrawalStatus) -> AppError {
        let current = match self.repo.get_withdrawal(id).await {
            Ok(Some(r)) => r.status.to_string(),
            Ok(None) => "unknown".to_string(),
            Err(e) => return AppError::Database(e),
        };
        AppError::InvalidState {
            id,
            current,
            expected: expected.to_string(),
        }
    }

    async fn owner_type(&self, owner_id: &OwnerId) -> AppResult<OwnerType> {
        let (owner_type, _) = self
            .repo
            .get_wallet(owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("wallet for {}", owner_id)))?;
        Ok(owner_type)
    }

    /// The ledger view of an owner must agree with the materialized wallet
    /// plus outstanding holds before any money leaves. A mismatch means
    /// corruption somewhere, and paying out on corrupt numbers is the one
    /// mistake this service refuses to make.
    async fn check_owner_reconciled(&self, owner_id: &OwnerId) -> AppResult<()> {
        let ledger = self.repo.owner_ledger_balance(owner_id).await?;
        let wallet = self.repo.wallet_balance(owner_id).await?;
        let held = self.repo.held_amount(owner_id).await?;
        let materialized = wallet + held;

        if ledger != materialized {
            error!(
                owner_id = %owner_id,
                ledger = %ledger,
                wallet = %wallet,
                held = %held,
                "Reconciliation mismatch, halting payout"
            );
            return Err(AppError::ReconciliationMismatch {
                owner_id: owner_id.clone(),
                ledger,
                materialized,
            });
        }
        Ok(())
    }
}
