//! Settlement workflow: compute the split for a completed order and record
//! it, with its ledger entries and wallet credits, exactly once.

use crate::db::Repository;
use crate::domain::{
    wallet_account, CompletedOrder, EntryType, Money, NewLedgerEntry, OwnerType, Settlement,
    TimeMs, PLATFORM_INCOME_ACCOUNT,
};
use crate::engine;
use crate::error::{AppError, AppResult};
use std::sync::Arc;
use tracing::info;

pub struct SettlementService {
    repo: Arc<Repository>,
}

impl SettlementService {
    pub fn new(repo: Arc<Repository>) -> Self {
        SettlementService { repo }
    }

    /// Settle a completed order against its region's fee config.
    ///
    /// Idempotency rests entirely on the database's write-once guard, not on
    /// any check-then-act here: concurrent calls for the same order race to
    /// exactly one recorded settlement.
    pub async fn settle_order(&self, order: &CompletedOrder) -> AppResult<Settlement> {
        let config = self
            .repo
            .get_fee_config(&order.region_id)
            .await?
            .ok_or_else(|| AppError::ConfigNotFound(order.region_id.clone()))?;

        let split = engine::settle(order, &config)?;
        let now = TimeMs::now();

        let settlement = Settlement {
            order_id: order.order_id.clone(),
            region_id: order.region_id.clone(),
            merchant_id: order.merchant_id.clone(),
            courier_id: order.courier_id.clone(),
            total_price: order.total_price,
            delivery_fee: order.delivery_fee,
            merchant_count: order.merchant_count,
            service_fee: split.service_fee,
            extra_charge: split.extra_charge,
            merchant_earning: split.merchant_earning,
            courier_earning_pure: split.courier_earning_pure,
            courier_earning_extra: split.courier_earning_extra,
            app_earning_total: split.app_earning_total,
            courier_app_fee: split.courier_app_fee,
            settled_at_ms: now,
        };

        let entries = build_entries(&settlement);
        let credits = build_wallet_credits(&settlement);

        let recorded = self
            .repo
            .record_settlement_atomic(&settlement, &entries, &credits)
            .await?;
        if !recorded {
            return Err(AppError::AlreadySettled(order.order_id.clone()));
        }

        info!(
            order_id = %settlement.order_id,
            region_id = %settlement.region_id,
            total_price = %settlement.total_price,
            merchant_earning = %settlement.merchant_earning,
            "Order settled"
        );
        Ok(settlement)
    }
}

/// The journal lines for one settlement. All debits, summing to the order
/// total; zero-amount lines are skipped so the one-sided invariant holds.
fn build_entries(s: &Settlement) -> Vec<NewLedgerEntry> {
    let desc = format!("settlement of order {}", s.order_id);
    let courier_total = s.courier_earning_total();

    let mut entries = Vec::with_capacity(4);
    if s.merchant_earning.is_positive() {
        entries.push(NewLedgerEntry::debit(
            EntryType::MerchantPayout,
            s.merchant_earning,
            wallet_account(OwnerType::Merchant, &s.merchant_id),
            Some(s.merchant_id.clone()),
            desc.clone(),
        ));
    }
    if courier_total.is_positive() {
        entries.push(NewLedgerEntry::debit(
            EntryType::CourierPayout,
            courier_total,
            wallet_account(OwnerType::Courier, &s.courier_id),
            Some(s.courier_id.clone()),
            desc.clone(),
        ));
    }
    if s.app_earning_total.is_positive() {
        entries.push(NewLedgerEntry::debit(
            EntryType::IncomeServiceFee,
            s.app_earning_total,
            PLATFORM_INCOME_ACCOUNT,
            None,
            desc.clone(),
        ));
    }
    if s.courier_app_fee.is_positive() {
        entries.push(NewLedgerEntry::debit(
            EntryType::IncomeCourierAppFee,
            s.courier_app_fee,
            PLATFORM_INCOME_ACCOUNT,
            None,
            desc,
        ));
    }
    entries
}

fn build_wallet_credits(
    s: &Settlement,
) -> Vec<(crate::domain::OwnerId, OwnerType, Money)> {
    let mut credits = Vec::with_capacity(2);
    if s.merchant_earning.is_positive() {
        credits.push((s.merchant_id.clone(), OwnerType::Merchant, s.merchant_earning));
    }
    let courier_total = s.courier_earning_total();
    if courier_total.is_positive() {
        credits.push((s.courier_id.clone(), OwnerType::Courier, courier_total));
    }
    credits
}
