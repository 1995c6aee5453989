//! Ledger journal and wallet balance operations.

use super::{RepoError, Repository};
use crate::domain::{
    EntryType, LedgerEntry, Money, NewLedgerEntry, OwnerId, OwnerType, TimeMs,
};
use sqlx::sqlite::Sqlite;
use sqlx::{Row, Transaction};
use tracing::warn;
use uuid::Uuid;

/// Filter for ledger queries. All fields optional; unset fields match
/// everything.
#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub entry_type: Option<EntryType>,
    pub from_ms: Option<TimeMs>,
    pub to_ms: Option<TimeMs>,
    pub owner_id: Option<OwnerId>,
    pub account_code: Option<String>,
}

/// Validate and insert an entry inside an open transaction. The one-sided
/// invariant is enforced here, on every write path into the journal.
pub(super) async fn insert_entry_tx(
    tx: &mut Transaction<'_, Sqlite>,
    entry: &NewLedgerEntry,
    created_at_ms: TimeMs,
) -> Result<Uuid, RepoError> {
    entry.validate()?;

    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO ledger_entries
        (id, entry_type, debit, credit, account_code, owner_id, description, created_at_ms)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(entry.entry_type.as_str())
    .bind(entry.debit.as_i64())
    .bind(entry.credit.as_i64())
    .bind(&entry.account_code)
    .bind(entry.owner_id.as_ref().map(|o| o.as_str().to_string()))
    .bind(&entry.description)
    .bind(created_at_ms.as_i64())
    .execute(&mut **tx)
    .await?;

    Ok(id)
}

/// Upsert-and-increment a wallet inside an open transaction.
pub(super) async fn credit_wallet_tx(
    tx: &mut Transaction<'_, Sqlite>,
    owner_id: &OwnerId,
    owner_type: OwnerType,
    amount: Money,
    now: TimeMs,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO wallets (owner_id, owner_type, balance, updated_at_ms)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(owner_id) DO UPDATE SET
            balance = balance + excluded.balance,
            updated_at_ms = excluded.updated_at_ms
        "#,
    )
    .bind(owner_id.as_str())
    .bind(owner_type.as_str())
    .bind(amount.as_i64())
    .bind(now.as_i64())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Conditional decrement inside an open transaction: succeeds only if the
/// balance covers the amount. Returns false (nothing changed) otherwise.
///
/// The balance check and the write are one statement, so two concurrent
/// requests against the same wallet cannot both pass a stale check.
pub(super) async fn try_debit_wallet_tx(
    tx: &mut Transaction<'_, Sqlite>,
    owner_id: &OwnerId,
    amount: Money,
    now: TimeMs,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE wallets
        SET balance = balance - ?, updated_at_ms = ?
        WHERE owner_id = ? AND balance >= ?
        "#,
    )
    .bind(amount.as_i64())
    .bind(now.as_i64())
    .bind(owner_id.as_str())
    .bind(amount.as_i64())
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}

fn entry_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<LedgerEntry> {
    let id_str: String = row.get("id");
    let type_str: String = row.get("entry_type");

    let id = match Uuid::parse_str(&id_str) {
        Ok(id) => id,
        Err(e) => {
            warn!(id = %id_str, error = %e, "Skipping ledger row with unparseable id");
            return None;
        }
    };
    let entry_type = match EntryType::parse(&type_str) {
        Some(t) => t,
        None => {
            warn!(id = %id_str, entry_type = %type_str, "Skipping ledger row with unknown entry type");
            return None;
        }
    };

    Some(LedgerEntry {
        id,
        entry_type,
        debit: Money::new(row.get("debit")),
        credit: Money::new(row.get("credit")),
        account_code: row.get("account_code"),
        owner_id: row
            .get::<Option<String>, _>("owner_id")
            .map(OwnerId::new),
        description: row.get("description"),
        created_at_ms: TimeMs::new(row.get("created_at_ms")),
    })
}

impl Repository {
    // =========================================================================
    // Ledger operations (append-only)
    // =========================================================================

    /// Append a single entry. The only public mutation of the journal.
    pub async fn append_ledger_entry(
        &self,
        entry: &NewLedgerEntry,
        created_at_ms: TimeMs,
    ) -> Result<Uuid, RepoError> {
        let mut tx = self.pool().begin().await?;
        let id = insert_entry_tx(&mut tx, entry, created_at_ms).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Query entries matching the filter, ordered by (created_at_ms, id).
    pub async fn query_ledger(
        &self,
        filter: &LedgerFilter,
    ) -> Result<Vec<LedgerEntry>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, entry_type, debit, credit, account_code, owner_id, description, created_at_ms
            FROM ledger_entries
            WHERE (? IS NULL OR entry_type = ?)
              AND (? IS NULL OR created_at_ms >= ?)
              AND (? IS NULL OR created_at_ms <= ?)
              AND (? IS NULL OR owner_id = ?)
              AND (? IS NULL OR account_code = ?)
            ORDER BY created_at_ms ASC, id ASC
            "#,
        )
        .bind(filter.entry_type.map(|t| t.as_str()))
        .bind(filter.entry_type.map(|t| t.as_str()))
        .bind(filter.from_ms.map(|t| t.as_i64()))
        .bind(filter.from_ms.map(|t| t.as_i64()))
        .bind(filter.to_ms.map(|t| t.as_i64()))
        .bind(filter.to_ms.map(|t| t.as_i64()))
        .bind(filter.owner_id.as_ref().map(|o| o.as_str().to_string()))
        .bind(filter.owner_id.as_ref().map(|o| o.as_str().to_string()))
        .bind(filter.account_code.clone())
        .bind(filter.account_code.clone())
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().filter_map(entry_from_row).collect())
    }

    /// Platform net liquidity: Σ debit − Σ credit across the whole journal.
    ///
    /// SQLite sums INTEGER columns exactly, so no in-Rust accumulation is
    /// needed for correctness here.
    pub async fn ledger_cash_position(&self) -> Result<Money, sqlx::Error> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(debit), 0) - COALESCE(SUM(credit), 0) AS net FROM ledger_entries",
        )
        .fetch_one(self.pool())
        .await?;

        Ok(Money::new(row.get("net")))
    }

    /// Σ debit − Σ credit over entries tagged to one owner.
    pub async fn owner_ledger_balance(&self, owner_id: &OwnerId) -> Result<Money, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(debit), 0) - COALESCE(SUM(credit), 0) AS net
            FROM ledger_entries
            WHERE owner_id = ?
            "#,
        )
        .bind(owner_id.as_str())
        .fetch_one(self.pool())
        .await?;

        Ok(Money::new(row.get("net")))
    }

    /// Gross income of one entry type inside a time window (debit side).
    pub async fn sum_income(
        &self,
        entry_type: EntryType,
        from_ms: TimeMs,
        to_ms: TimeMs,
    ) -> Result<Money, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(debit), 0) AS gross
            FROM ledger_entries
            WHERE entry_type = ? AND created_at_ms >= ? AND created_at_ms <= ?
            "#,
        )
        .bind(entry_type.as_str())
        .bind(from_ms.as_i64())
        .bind(to_ms.as_i64())
        .fetch_one(self.pool())
        .await?;

        Ok(Money::new(row.get("gross")))
    }

    /// Σ credits of WITHDRAWAL entries tagged to a bucket account, for the
    /// bucket's "available to withdraw" computation.
    pub async fn sum_bucket_withdrawals(&self, account_code: &str) -> Result<Money, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(credit), 0) AS withdrawn
            FROM ledger_entries
            WHERE entry_type = ? AND account_code = ?
            "#,
        )
        .bind(EntryType::Withdrawal.as_str())
        .bind(account_code)
        .fetch_one(self.pool())
        .await?;

        Ok(Money::new(row.get("withdrawn")))
    }

    // =========================================================================
    // Wallet operations
    // =========================================================================

    /// Current materialized balance; zero for unknown owners.
    pub async fn wallet_balance(&self, owner_id: &OwnerId) -> Result<Money, sqlx::Error> {
        let row = sqlx::query("SELECT balance FROM wallets WHERE owner_id = ?")
            .bind(owner_id.as_str())
            .fetch_optional(self.pool())
            .await?;

        Ok(row
            .map(|r| Money::new(r.get("balance")))
            .unwrap_or_else(Money::zero))
    }

    /// Wallet lookup including the owner type.
    pub async fn get_wallet(
        &self,
        owner_id: &OwnerId,
    ) -> Result<Option<(OwnerType, Money)>, sqlx::Error> {
        let row = sqlx::query("SELECT owner_type, balance FROM wallets WHERE owner_id = ?")
            .bind(owner_id.as_str())
            .fetch_optional(self.pool())
            .await?;

        Ok(row.and_then(|r| {
            let type_str: String = r.get("owner_type");
            let owner_type = OwnerType::parse(&type_str)?;
            Some((owner_type, Money::new(r.get("balance"))))
        }))
    }

    /// All wallets, for the full reconciliation sweep.
    pub async fn list_wallets(&self) -> Result<Vec<(OwnerId, OwnerType, Money)>, sqlx::Error> {
        let rows = sqlx::query("SELECT owner_id, owner_type, balance FROM wallets ORDER BY owner_id")
            .fetch_all(self.pool())
            .await?;

        Ok(rows
            .iter()
            .filter_map(|r| {
                let type_str: String = r.get("owner_type");
                let owner_type = match OwnerType::parse(&type_str) {
                    Some(t) => t,
                    None => {
                        warn!(owner_type = %type_str, "Skipping wallet row with unknown owner type");
                        return None;
                    }
                };
                Some((
                    OwnerId::new(r.get::<String, _>("owner_id")),
                    owner_type,
                    Money::new(r.get("balance")),
                ))
            })
            .collect())
    }

    /// Sum of amounts held by non-terminal withdrawal requests for an owner.
    pub async fn held_amount(&self, owner_id: &OwnerId) -> Result<Money, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount), 0) AS held
            FROM withdrawal_requests
            WHERE owner_id = ? AND status IN ('REQUESTED', 'PROCESSING')
            "#,
        )
        .bind(owner_id.as_str())
        .fetch_one(self.pool())
        .await?;

        Ok(Money::new(row.get("held")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use crate::domain::PLATFORM_INCOME_ACCOUNT;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    fn income(amount: i64, description: &str) -> NewLedgerEntry {
        NewLedgerEntry::debit(
            EntryType::IncomeServiceFee,
            Money::new(amount),
            PLATFORM_INCOME_ACCOUNT,
            None,
            description,
        )
    }

    #[tokio::test]
    async fn test_append_and_query() {
        let (repo, _temp) = setup_test_db().await;

        repo.append_ledger_entry(&income(2000, "order o-1"), TimeMs::new(1000))
            .await
            .unwrap();
        repo.append_ledger_entry(
            &NewLedgerEntry::credit(
                EntryType::Withdrawal,
                Money::new(500),
                "wallet:merchant:m-1",
                Some(OwnerId::new("m-1")),
                "withdrawal w-1",
            ),
            TimeMs::new(2000),
        )
        .await
        .unwrap();

        let all = repo.query_ledger(&LedgerFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].entry_type, EntryType::IncomeServiceFee);

        let only_income = repo
            .query_ledger(&LedgerFilter {
                entry_type: Some(EntryType::IncomeServiceFee),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(only_income.len(), 1);
        assert_eq!(only_income[0].debit, Money::new(2000));

        let windowed = repo
            .query_ledger(&LedgerFilter {
                from_ms: Some(TimeMs::new(1500)),
                to_ms: Some(TimeMs::new(2500)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].entry_type, EntryType::Withdrawal);
    }

    #[tokio::test]
    async fn test_append_rejects_malformed_entry() {
        let (repo, _temp) = setup_test_db().await;

        // Both sides set.
        let mut both = income(2000, "o-1");
        both.credit = Money::new(2000);
        let err = repo
            .append_ledger_entry(&both, TimeMs::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidEntry(_)));

        // Negative amount.
        let negative = income(-5, "o-2");
        let err = repo
            .append_ledger_entry(&negative, TimeMs::new(2))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidEntry(_)));

        // Nothing was written.
        assert!(repo
            .query_ledger(&LedgerFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_cash_position() {
        let (repo, _temp) = setup_test_db().await;

        repo.append_ledger_entry(&income(10000, "order o-1"), TimeMs::new(1000))
            .await
            .unwrap();
        repo.append_ledger_entry(
            &NewLedgerEntry::credit(
                EntryType::Withdrawal,
                Money::new(4000),
                "wallet:courier:c-1",
                Some(OwnerId::new("c-1")),
                "withdrawal w-1",
            ),
            TimeMs::new(2000),
        )
        .await
        .unwrap();

        assert_eq!(repo.ledger_cash_position().await.unwrap(), Money::new(6000));
    }

    #[tokio::test]
    async fn test_sum_income_windowed() {
        let (repo, _temp) = setup_test_db().await;

        repo.append_ledger_entry(&income(1000, "o-1"), TimeMs::new(1000))
            .await
            .unwrap();
        repo.append_ledger_entry(&income(2000, "o-2"), TimeMs::new(2000))
            .await
            .unwrap();
        repo.append_ledger_entry(&income(4000, "o-3"), TimeMs::new(9000))
            .await
            .unwrap();

        let gross = repo
            .sum_income(EntryType::IncomeServiceFee, TimeMs::new(0), TimeMs::new(5000))
            .await
            .unwrap();
        assert_eq!(gross, Money::new(3000));
    }

    #[tokio::test]
    async fn test_wallet_credit_and_conditional_debit() {
        let (repo, _temp) = setup_test_db().await;
        let owner = OwnerId::new("m-1");

        let mut tx = repo.pool().begin().await.unwrap();
        credit_wallet_tx(&mut tx, &owner, OwnerType::Merchant, Money::new(5000), TimeMs::new(1))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(repo.wallet_balance(&owner).await.unwrap(), Money::new(5000));

        // Covered debit succeeds.
        let mut tx = repo.pool().begin().await.unwrap();
        assert!(
            try_debit_wallet_tx(&mut tx, &owner, Money::new(3000), TimeMs::new(2))
                .await
                .unwrap()
        );
        tx.commit().await.unwrap();
        assert_eq!(repo.wallet_balance(&owner).await.unwrap(), Money::new(2000));

        // Overdraft attempt changes nothing.
        let mut tx = repo.pool().begin().await.unwrap();
        assert!(
            !try_debit_wallet_tx(&mut tx, &owner, Money::new(2001), TimeMs::new(3))
                .await
                .unwrap()
        );
        tx.commit().await.unwrap();
        assert_eq!(repo.wallet_balance(&owner).await.unwrap(), Money::new(2000));
    }

    #[tokio::test]
    async fn test_debit_unknown_wallet_fails() {
        let (repo, _temp) = setup_test_db().await;

        let mut tx = repo.pool().begin().await.unwrap();
        let ok = try_debit_wallet_tx(
            &mut tx,
            &OwnerId::new("ghost"),
            Money::new(1),
            TimeMs::new(1),
        )
        .await
        .unwrap();
        tx.commit().await.unwrap();
        assert!(!ok);
    }
}
