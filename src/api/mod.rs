//! HTTP surface: router assembly and shared state.

pub mod allocations;
pub mod fee_config;
pub mod health;
pub mod ledger;
pub mod platform_config;
pub mod reconciliation;
pub mod settlements;
pub mod wallets;
pub mod withdrawals;

use crate::db::Repository;
use crate::workflow::{PayoutService, ReconciliationService, SettlementService};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared application state across handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub settlement: Arc<SettlementService>,
    pub payout: Arc<PayoutService>,
    pub reconciliation: Arc<ReconciliationService>,
}

/// Build the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/v1/regions/:region_id/fee-config",
            get(fee_config::get_fee_config).put(fee_config::put_fee_config),
        )
        .route("/v1/settlements", post(settlements::create_settlement))
        .route("/v1/settlements/:order_id", get(settlements::get_settlement))
        .route("/v1/ledger", get(ledger::query_ledger))
        .route("/v1/wallets/:owner_id", get(wallets::get_wallet))
        .route(
            "/v1/withdrawals",
            post(withdrawals::create_withdrawal).get(withdrawals::list_withdrawals),
        )
        .route("/v1/withdrawals/:id", get(withdrawals::get_withdrawal))
        .route("/v1/withdrawals/:id/approve", post(withdrawals::approve_withdrawal))
        .route("/v1/withdrawals/:id/reject", post(withdrawals::reject_withdrawal))
        .route("/v1/withdrawals/:id/resolve", post(withdrawals::resolve_withdrawal))
        .route(
            "/v1/platform-config",
            get(platform_config::get_platform_config).put(platform_config::put_platform_config),
        )
        .route("/v1/allocations", get(allocations::get_allocations))
        .route("/v1/reconciliation", get(reconciliation::get_reconciliation))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
