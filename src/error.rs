use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Money, OrderId, OwnerId, RegionId};

/// Top-level error type for the service.
#[derive(Debug, Error)]
pub enum AppError {
    /// The region has no fee config row. A hard stop: settling against a
    /// silent default would silently misallocate real money.
    #[error("No fee config for region {0}")]
    ConfigNotFound(RegionId),

    /// Settlement is write-once; a second attempt for the same order is
    /// rejected without touching the ledger.
    #[error("Order {0} is already settled")]
    AlreadySettled(OrderId),

    /// Expected user-facing condition on withdrawal requests.
    #[error("Insufficient balance for {owner_id}: requested {requested}")]
    InsufficientBalance { owner_id: OwnerId, requested: Money },

    /// A guarded state transition found the request not in the expected
    /// state (duplicate approve/reject, or action on a terminal request).
    #[error("Withdrawal {id} is {current}, expected {expected}")]
    InvalidState {
        id: Uuid,
        current: String,
        expected: String,
    },

    /// The external disbursement call timed out. The outcome is unknown —
    /// not failed — so the hold is kept and an administrator must reconcile
    /// against the provider's records before retrying.
    #[error("Disbursement outcome unknown for withdrawal {0}; manual reconciliation required")]
    DisbursementUnknown(Uuid),

    /// Ledger-derived balance disagrees with the materialized wallet.
    /// Fatal: halts payout approval for the owner until resolved.
    #[error("Reconciliation mismatch for {owner_id}: ledger {ledger}, wallet+held {materialized}")]
    ReconciliationMismatch {
        owner_id: OwnerId,
        ledger: Money,
        materialized: Money,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<crate::domain::LedgerEntryError> for AppError {
    fn from(err: crate::domain::LedgerEntryError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<crate::db::RepoError> for AppError {
    fn from(err: crate::db::RepoError) -> Self {
        match err {
            crate::db::RepoError::Db(e) => AppError::Database(e),
            crate::db::RepoError::InvalidEntry(e) => e.into(),
        }
    }
}

impl From<crate::domain::FeeConfigError> for AppError {
    fn from(err: crate::domain::FeeConfigError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<crate::domain::PlatformConfigError> for AppError {
    fn from(err: crate::domain::PlatformConfigError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<crate::engine::SettlementInputError> for AppError {
    fn from(err: crate::engine::SettlementInputError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            AppError::ConfigNotFound(_) => {
                (StatusCode::NOT_FOUND, "CONFIG_NOT_FOUND", self.to_string())
            }
            AppError::AlreadySettled(_) => {
                (StatusCode::CONFLICT, "ALREADY_SETTLED", self.to_string())
            }
            AppError::InsufficientBalance { .. } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INSUFFICIENT_BALANCE",
                self.to_string(),
            ),
            AppError::InvalidState { .. } => {
                (StatusCode::CONFLICT, "INVALID_STATE", self.to_string())
            }
            AppError::DisbursementUnknown(_) => (
                StatusCode::BAD_GATEWAY,
                "DISBURSEMENT_UNKNOWN",
                self.to_string(),
            ),
            AppError::ReconciliationMismatch { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "RECONCILIATION_MISMATCH",
                self.to_string(),
            ),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", self.to_string()),
            AppError::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", self.to_string())
            }
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message,
            "errorCode": error_code,
        }));

        (status, body).into_response()
    }
}

/// Result type alias for the service.
pub type AppResult<T> = Result<T, AppError>;
