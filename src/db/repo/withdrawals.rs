//! Withdrawal request lifecycle operations.
//!
//! Every status transition is a guarded single-statement UPDATE
//! (`WHERE status = <expected>`); a duplicate invocation observes zero rows
//! affected and no-ops, so correctness never depends on client behavior.

use super::{ledger, RepoError, Repository};
use crate::domain::{
    BankDetails, EntryType, Money, NewLedgerEntry, OwnerId, OwnerType, TimeMs, WithdrawalRequest,
    WithdrawalStatus,
};
use sqlx::Row;
use uuid::Uuid;

fn request_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<WithdrawalRequest> {
    let id_str: String = row.get("id");
    let status_str: String = row.get("status");

    let id = Uuid::parse_str(&id_str).ok()?;
    let status = WithdrawalStatus::parse(&status_str)?;

    Some(WithdrawalRequest {
        id,
        owner_id: OwnerId::new(row.get::<String, _>("owner_id")),
        amount: Money::new(row.get("amount")),
        bank: BankDetails {
            bank_name: row.get("bank_name"),
            account_number: row.get("account_number"),
            account_name: row.get("account_name"),
        },
        status,
        admin_note: row.get("admin_note"),
        disbursement_ref: row.get("disbursement_ref"),
        created_at_ms: TimeMs::new(row.get("created_at_ms")),
        processed_at_ms: row
            .get::<Option<i64>, _>("processed_at_ms")
            .map(TimeMs::new),
    })
}

impl Repository {
    /// Atomically hold the funds and create a REQUESTED record.
    ///
    /// The conditional wallet decrement and the insert share one
    /// transaction; returns None (nothing written) when the balance does not
    /// cover the amount.
    pub async fn create_withdrawal_atomic(
        &self,
        owner_id: &OwnerId,
        amount: Money,
        bank: &BankDetails,
        now: TimeMs,
    ) -> Result<Option<WithdrawalRequest>, sqlx::Error> {
        let mut tx = self.pool().begin().await?;

        if !ledger::try_debit_wallet_tx(&mut tx, owner_id, amount, now).await? {
            tx.rollback().await?;
            return Ok(None);
        }

        let request = WithdrawalRequest {
            id: Uuid::new_v4(),
            owner_id: owner_id.clone(),
            amount,
            bank: bank.clone(),
            status: WithdrawalStatus::Requested,
            admin_note: None,
            disbursement_ref: None,
            created_at_ms: now,
            processed_at_ms: None,
        };

        sqlx::query(
            r#"
            INSERT INTO withdrawal_requests
            (id, owner_id, amount, bank_name, account_number, account_name,
             status, admin_note, disbursement_ref, created_at_ms, processed_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?, NULL, NULL, ?, NULL)
            "#,
        )
        .bind(request.id.to_string())
        .bind(request.owner_id.as_str())
        .bind(request.amount.as_i64())
        .bind(&request.bank.bank_name)
        .bind(&request.bank.account_number)
        .bind(&request.bank.account_name)
        .bind(request.status.as_str())
        .bind(request.created_at_ms.as_i64())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(request))
    }

    /// Fetch a withdrawal request by id.
    pub async fn get_withdrawal(
        &self,
        id: Uuid,
    ) -> Result<Option<WithdrawalRequest>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, amount, bank_name, account_number, account_name,
                   status, admin_note, disbursement_ref, created_at_ms, processed_at_ms
            FROM withdrawal_requests
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(self.pool())
        .await?;

        Ok(row.as_ref().and_then(request_from_row))
    }

    /// List the withdrawal queue, optionally filtered by status, newest
    /// first.
    pub async fn list_withdrawals(
        &self,
        status: Option<WithdrawalStatus>,
    ) -> Result<Vec<WithdrawalRequest>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, amount, bank_name, account_number, account_name,
                   status, admin_note, disbursement_ref, created_at_ms, processed_at_ms
            FROM withdrawal_requests
            WHERE (? IS NULL OR status = ?)
            ORDER BY created_at_ms DESC, id DESC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().filter_map(request_from_row).collect())
    }

    /// Guarded status transition. Returns false when the request was not in
    /// `from` (duplicate or out-of-order action).
    pub async fn transition_withdrawal(
        &self,
        id: Uuid,
        from: WithdrawalStatus,
        to: WithdrawalStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE withdrawal_requests SET status = ? WHERE id = ? AND status = ?",
        )
        .bind(to.as_str())
        .bind(id.to_string())
        .bind(from.as_str())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Finish an approved disbursement: PROCESSING → COMPLETED plus the
    /// terminal WITHDRAWAL credit (and provider fee, if any), atomically.
    pub async fn complete_withdrawal_atomic(
        &self,
        request: &WithdrawalRequest,
        owner_type: OwnerType,
        disbursement_ref: &str,
        provider_fee: Money,
        now: TimeMs,
    ) -> Result<bool, RepoError> {
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE withdrawal_requests
            SET status = ?, disbursement_ref = ?, processed_at_ms = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(WithdrawalStatus::Completed.as_str())
        .bind(disbursement_ref)
        .bind(now.as_i64())
        .bind(request.id.to_string())
        .bind(WithdrawalStatus::Processing.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let account = crate::domain::wallet_account(owner_type, &request.owner_id);
        ledger::insert_entry_tx(
            &mut tx,
            &NewLedgerEntry::credit(
                EntryType::Withdrawal,
                request.amount,
                account,
                Some(request.owner_id.clone()),
                format!("withdrawal {} ref {}", request.id, disbursement_ref),
            ),
            now,
        )
        .await?;

        if provider_fee.is_positive() {
            ledger::insert_entry_tx(
                &mut tx,
                &NewLedgerEntry::credit(
                    EntryType::DisbursementFee,
                    provider_fee,
                    "platform:fees",
                    None,
                    format!("provider fee for withdrawal {}", request.id),
                ),
                now,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Reject a REQUESTED withdrawal: restore the held funds and leave a
    /// zero-net audit pair in the journal, atomically.
    ///
    /// The matched credit/debit pair keeps Σ debit − Σ credit untouched
    /// (no money moved) while preserving an append-only audit trail of the
    /// rejection.
    pub async fn reject_withdrawal_atomic(
        &self,
        request: &WithdrawalRequest,
        owner_type: OwnerType,
        reason: &str,
        now: TimeMs,
    ) -> Result<bool, RepoError> {
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE withdrawal_requests
            SET status = ?, admin_note = ?, processed_at_ms = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(WithdrawalStatus::Rejected.as_str())
        .bind(reason)
        .bind(now.as_i64())
        .bind(request.id.to_string())
        .bind(WithdrawalStatus::Requested.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        ledger::credit_wallet_tx(&mut tx, &request.owner_id, owner_type, request.amount, now)
            .await?;

        let account = crate::domain::wallet_account(owner_type, &request.owner_id);
        ledger::insert_entry_tx(
            &mut tx,
            &NewLedgerEntry::credit(
                EntryType::Withdrawal,
                request.amount,
                account.clone(),
                Some(request.owner_id.clone()),
                format!("rejected withdrawal {}: {}", request.id, reason),
            ),
            now,
        )
        .await?;
        ledger::insert_entry_tx(
            &mut tx,
            &NewLedgerEntry::debit(
                EntryType::WithdrawalReversal,
                request.amount,
                account,
                Some(request.owner_id.clone()),
                format!("reversal of rejected withdrawal {}: {}", request.id, reason),
            ),
            now,
        )
        .await?;

        tx.commit().await?;
        Ok(true)
    }
}
