//! Ledger journal query endpoint.

use super::AppState;
use crate::db::LedgerFilter;
use crate::domain::{EntryType, LedgerEntry, Money, OwnerId, TimeMs};
use crate::error::{AppError, AppResult};
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerQuery {
    pub entry_type: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub owner_id: Option<String>,
    pub account_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerResponse {
    pub entries: Vec<LedgerEntry>,
    /// Σ debit − Σ credit over the returned entries.
    pub net: Money,
}

pub async fn query_ledger(
    State(state): State<AppState>,
    Query(query): Query<LedgerQuery>,
) -> AppResult<Json<LedgerResponse>> {
    let entry_type = query
        .entry_type
        .as_deref()
        .map(|s| {
            EntryType::parse(s)
                .ok_or_else(|| AppError::BadRequest(format!("unknown entryType: {}", s)))
        })
        .transpose()?;

    let filter = LedgerFilter {
        entry_type,
        from_ms: query.from_ms.map(TimeMs::new),
        to_ms: query.to_ms.map(TimeMs::new),
        owner_id: query.owner_id.map(OwnerId::new),
        account_code: query.account_code,
    };

    let entries = state.repo.query_ledger(&filter).await?;
    let net = entries.iter().map(LedgerEntry::net).sum();
    Ok(Json(LedgerResponse { entries, net }))
}
