//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `ledger.rs` - Ledger journal and wallet balance operations
//! - `withdrawals.rs` - Withdrawal request lifecycle operations

mod ledger;
mod withdrawals;

pub use ledger::LedgerFilter;

use thiserror::Error;

/// Error from a repository mutation: either the database failed or the
/// entry being appended breaks the journal invariant.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    InvalidEntry(#[from] crate::domain::LedgerEntryError),
}


use crate::domain::{
    FeeConfig, Money, NewLedgerEntry, OrderId, PlatformConfig, RegionId, Settlement, TimeMs,
};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Fee config operations
    // =========================================================================

    /// Insert or replace the fee config for a region.
    ///
    /// Prospective-only: already-settled orders are never recomputed.
    pub async fn upsert_fee_config(&self, config: &FeeConfig) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO fee_configs
            (region_id, buyer_service_fee, courier_app_fee, max_merchants_per_order,
             extra_fee_per_merchant, driver_extra_share, app_extra_share, updated_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(region_id) DO UPDATE SET
                buyer_service_fee = excluded.buyer_service_fee,
                courier_app_fee = excluded.courier_app_fee,
                max_merchants_per_order = excluded.max_merchants_per_order,
                extra_fee_per_merchant = excluded.extra_fee_per_merchant,
                driver_extra_share = excluded.driver_extra_share,
                app_extra_share = excluded.app_extra_share,
                updated_at_ms = excluded.updated_at_ms
            "#,
        )
        .bind(config.region_id.as_str())
        .bind(config.buyer_service_fee.as_i64())
        .bind(config.courier_app_fee.as_i64())
        .bind(config.max_merchants_per_order)
        .bind(config.extra_fee_per_merchant.as_i64())
        .bind(config.driver_extra_share.as_i64())
        .bind(config.app_extra_share.as_i64())
        .bind(config.updated_at_ms.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the fee config for a region, if configured.
    pub async fn get_fee_config(
        &self,
        region_id: &RegionId,
    ) -> Result<Option<FeeConfig>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT region_id, buyer_service_fee, courier_app_fee, max_merchants_per_order,
                   extra_fee_per_merchant, driver_extra_share, app_extra_share, updated_at_ms
            FROM fee_configs
            WHERE region_id = ?
            "#,
        )
        .bind(region_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| FeeConfig {
            region_id: RegionId::new(r.get::<String, _>("region_id")),
            buyer_service_fee: Money::new(r.get("buyer_service_fee")),
            courier_app_fee: Money::new(r.get("courier_app_fee")),
            max_merchants_per_order: r.get("max_merchants_per_order"),
            extra_fee_per_merchant: Money::new(r.get("extra_fee_per_merchant")),
            driver_extra_share: Money::new(r.get("driver_extra_share")),
            app_extra_share: Money::new(r.get("app_extra_share")),
            updated_at_ms: TimeMs::new(r.get("updated_at_ms")),
        }))
    }

    // =========================================================================
    // Platform config operations (append-only versions)
    // =========================================================================

    /// Append a new allocation-percentage version.
    pub async fn insert_platform_config(
        &self,
        config: &PlatformConfig,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO platform_configs (p_csr, p_sys, p_mkt, p_emg, effective_from_ms)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(config.p_csr)
        .bind(config.p_sys)
        .bind(config.p_mkt)
        .bind(config.p_emg)
        .bind(config.effective_from_ms.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get the config version in effect at `at_ms` (latest effective_from at
    /// or before that instant).
    pub async fn get_platform_config_at(
        &self,
        at_ms: TimeMs,
    ) -> Result<Option<PlatformConfig>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT p_csr, p_sys, p_mkt, p_emg, effective_from_ms
            FROM platform_configs
            WHERE effective_from_ms <= ?
            ORDER BY effective_from_ms DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(at_ms.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| PlatformConfig {
            p_csr: r.get("p_csr"),
            p_sys: r.get("p_sys"),
            p_mkt: r.get("p_mkt"),
            p_emg: r.get("p_emg"),
            effective_from_ms: TimeMs::new(r.get("effective_from_ms")),
        }))
    }

    /// Latest config version regardless of effective date.
    pub async fn get_latest_platform_config(&self) -> Result<Option<PlatformConfig>, sqlx::Error> {
        self.get_platform_config_at(TimeMs::new(i64::MAX)).await
    }

    // =========================================================================
    // Settlement operations (write-once)
    // =========================================================================

    /// Record a settlement together with its ledger entries and wallet
    /// credits, atomically.
    ///
    /// The `order_id` primary key is the write-once guard: concurrent
    /// attempts race to exactly one winner. Returns `false` (with nothing
    /// written) when the order is already settled.
    pub async fn record_settlement_atomic(
        &self,
        settlement: &Settlement,
        entries: &[NewLedgerEntry],
        wallet_credits: &[(crate::domain::OwnerId, crate::domain::OwnerType, Money)],
    ) -> Result<bool, RepoError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO settlements
            (order_id, region_id, merchant_id, courier_id, total_price, delivery_fee,
             merchant_count, service_fee, extra_charge, merchant_earning,
             courier_earning_pure, courier_earning_extra, app_earning_total,
             courier_app_fee, settled_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(order_id) DO NOTHING
            "#,
        )
        .bind(settlement.order_id.as_str())
        .bind(settlement.region_id.as_str())
        .bind(settlement.merchant_id.as_str())
        .bind(settlement.courier_id.as_str())
        .bind(settlement.total_price.as_i64())
        .bind(settlement.delivery_fee.as_i64())
        .bind(settlement.merchant_count)
        .bind(settlement.service_fee.as_i64())
        .bind(settlement.extra_charge.as_i64())
        .bind(settlement.merchant_earning.as_i64())
        .bind(settlement.courier_earning_pure.as_i64())
        .bind(settlement.courier_earning_extra.as_i64())
        .bind(settlement.app_earning_total.as_i64())
        .bind(settlement.courier_app_fee.as_i64())
        .bind(settlement.settled_at_ms.as_i64())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let now = settlement.settled_at_ms;
        for entry in entries {
            ledger::insert_entry_tx(&mut tx, entry, now).await?;
        }
        for (owner_id, owner_type, amount) in wallet_credits {
            ledger::credit_wallet_tx(&mut tx, owner_id, *owner_type, *amount, now).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Fetch a recorded settlement by order id.
    pub async fn get_settlement(
        &self,
        order_id: &OrderId,
    ) -> Result<Option<Settlement>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT order_id, region_id, merchant_id, courier_id, total_price, delivery_fee,
                   merchant_count, service_fee, extra_charge, merchant_earning,
                   courier_earning_pure, courier_earning_extra, app_earning_total,
                   courier_app_fee, settled_at_ms
            FROM settlements
            WHERE order_id = ?
            "#,
        )
        .bind(order_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Settlement {
            order_id: OrderId::new(r.get::<String, _>("order_id")),
            region_id: RegionId::new(r.get::<String, _>("region_id")),
            merchant_id: crate::domain::OwnerId::new(r.get::<String, _>("merchant_id")),
            courier_id: crate::domain::OwnerId::new(r.get::<String, _>("courier_id")),
            total_price: Money::new(r.get("total_price")),
            delivery_fee: Money::new(r.get("delivery_fee")),
            merchant_count: r.get("merchant_count"),
            service_fee: Money::new(r.get("service_fee")),
            extra_charge: Money::new(r.get("extra_charge")),
            merchant_earning: Money::new(r.get("merchant_earning")),
            courier_earning_pure: Money::new(r.get("courier_earning_pure")),
            courier_earning_extra: Money::new(r.get("courier_earning_extra")),
            app_earning_total: Money::new(r.get("app_earning_total")),
            courier_app_fee: Money::new(r.get("courier_app_fee")),
            settled_at_ms: TimeMs::new(r.get("settled_at_ms")),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use crate::domain::{EntryType, OwnerId, OwnerType};
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

    fn fee_config(region: &str) -> FeeConfig {
        FeeConfig {
            region_id: RegionId::new(region),
            buyer_service_fee: Money::new(2000),
            courier_app_fee: Money::new(1000),
            max_merchants_per_order: 3,
            extra_fee_per_merchant: Money::new(3000),
            driver_extra_share: Money::new(2000),
            app_extra_share: Money::new(1000),
            updated_at_ms: TimeMs::new(1000),
        }
    }

    fn settlement(order_id: &str) -> Settlement {
        Settlement {
            order_id: OrderId::new(order_id),
            region_id: RegionId::new("jkt-selatan"),
            merchant_id: OwnerId::new("m-1"),
            courier_id: OwnerId::new("c-1"),
            total_price: Money::new(53000),
            delivery_fee: Money::new(8000),
            merchant_count: 2,
            service_fee: Money::new(2000),
            extra_charge: Money::new(3000),
            merchant_earning: Money::new(40000),
            courier_earning_pure: Money::new(7000),
            courier_earning_extra: Money::new(2000),
            app_earning_total: Money::new(3000),
            courier_app_fee: Money::new(1000),
            settled_at_ms: TimeMs::new(5000),
        }
    }

    #[tokio::test]
    async fn test_fee_config_roundtrip_and_upsert() {
        let (repo, _temp) = setup_test_db().await;
        let region = RegionId::new("jkt-selatan");

        assert!(repo.get_fee_config(&region).await.unwrap().is_none());

        let cfg = fee_config("jkt-selatan");
        repo.upsert_fee_config(&cfg).await.unwrap();
        assert_eq!(repo.get_fee_config(&region).await.unwrap(), Some(cfg.clone()));

        let mut edited = cfg;
        edited.buyer_service_fee = Money::new(2500);
        repo.upsert_fee_config(&edited).await.unwrap();
        assert_eq!(
            repo.get_fee_config(&region).await.unwrap().unwrap().buyer_service_fee,
            Money::new(2500)
        );
    }

    #[tokio::test]
    async fn test_platform_config_versioning() {
        let (repo, _temp) = setup_test_db().await;

        let v1 = PlatformConfig {
            p_csr: 10,
            p_sys: 20,
            p_mkt: 15,
            p_emg: 5,
            effective_from_ms: TimeMs::new(1000),
        };
        let v2 = PlatformConfig {
            p_csr: 12,
            ..v1
        };
        let v2 = PlatformConfig {
            effective_from_ms: TimeMs::new(5000),
            ..v2
        };
        repo.insert_platform_config(&v1).await.unwrap();
        repo.insert_platform_config(&v2).await.unwrap();

        // A query inside the first period sees the first version.
        assert_eq!(
            repo.get_platform_config_at(TimeMs::new(3000)).await.unwrap(),
            Some(v1)
        );
        assert_eq!(
            repo.get_platform_config_at(TimeMs::new(9000)).await.unwrap(),
            Some(v2)
        );
        assert_eq!(repo.get_latest_platform_config().await.unwrap(), Some(v2));
        assert_eq!(
            repo.get_platform_config_at(TimeMs::new(500)).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_settlement_write_once() {
        let (repo, _temp) = setup_test_db().await;
        let s = settlement("o-1");

        let entries = vec![NewLedgerEntry::debit(
            EntryType::IncomeServiceFee,
            s.app_earning_total,
            crate::domain::PLATFORM_INCOME_ACCOUNT,
            None,
            "order o-1",
        )];

        assert!(repo
            .record_settlement_atomic(&s, &entries, &[])
            .await
            .unwrap());
        // Second attempt loses the race and writes nothing.
        assert!(!repo
            .record_settlement_atomic(&s, &entries, &[])
            .await
            .unwrap());

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ledger_entries")
            .fetch_one(repo.pool())
            .await
            .unwrap();
        assert_eq!(count.0, 1);

        assert_eq!(repo.get_settlement(&s.order_id).await.unwrap(), Some(s));
    }

    #[tokio::test]
    async fn test_settlement_credits_wallets() {
        let (repo, _temp) = setup_test_db().await;
        let s = settlement("o-2");

        let entries = vec![
            NewLedgerEntry::debit(
                EntryType::MerchantPayout,
                s.merchant_earning,
                crate::domain::wallet_account(OwnerType::Merchant, &s.merchant_id),
                Some(s.merchant_id.clone()),
                "order o-2",
            ),
            NewLedgerEntry::debit(
                EntryType::CourierPayout,
                s.courier_earning_total(),
                crate::domain::wallet_account(OwnerType::Courier, &s.courier_id),
                Some(s.courier_id.clone()),
                "order o-2",
            ),
        ];

        let credits = vec![
            (s.merchant_id.clone(), OwnerType::Merchant, s.merchant_earning),
            (s.courier_id.clone(), OwnerType::Courier, s.courier_earning_total()),
        ];
        assert!(repo
            .record_settlement_atomic(&s, &entries, &credits)
            .await
            .unwrap());
        assert_eq!(
            repo.wallet_balance(&s.merchant_id).await.unwrap(),
            Money::new(40000)
        );
        assert_eq!(
            repo.wallet_balance(&s.courier_id).await.unwrap(),
            Money::new(9000)
        );
    }
}
