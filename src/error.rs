//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::LedgerError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Ledger errors
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    // Store errors reaching the boundary outside a ledger operation
    // (provisioning, audit reads)
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // Ledger errors map onto the HTTP taxonomy
            AppError::Ledger(ledger_err) => match ledger_err {
                LedgerError::AccountNotFound(number) => (
                    StatusCode::NOT_FOUND,
                    "account_not_found",
                    Some(number.clone()),
                ),
                LedgerError::SourceAccountNotFound(number) => (
                    StatusCode::NOT_FOUND,
                    "source_account_not_found",
                    Some(number.clone()),
                ),
                LedgerError::DestinationAccountNotFound(number) => (
                    StatusCode::NOT_FOUND,
                    "destination_account_not_found",
                    Some(number.clone()),
                ),
                LedgerError::InsufficientBalance { .. } => (
                    StatusCode::BAD_REQUEST,
                    "insufficient_balance",
                    Some(ledger_err.to_string()),
                ),
                LedgerError::SameAccountTransfer => {
                    (StatusCode::BAD_REQUEST, "same_account_transfer", None)
                }
                LedgerError::Amount(e) => {
                    (StatusCode::BAD_REQUEST, "invalid_amount", Some(e.to_string()))
                }
                // Conflicts that survived the retry coordinator
                LedgerError::VersionConflict { .. } => {
                    (StatusCode::CONFLICT, "version_conflict", None)
                }
                LedgerError::ConcurrencyExhausted { .. } => (
                    StatusCode::CONFLICT,
                    "concurrency_exhausted",
                    Some(ledger_err.to_string()),
                ),
                LedgerError::Storage(msg) => {
                    tracing::error!("Storage error: {}", msg);
                    (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
                }
            },

            AppError::Store(store_err) => match store_err {
                StoreError::DuplicateAccountNumber(number) => (
                    StatusCode::CONFLICT,
                    "duplicate_account_number",
                    Some(number.clone()),
                ),
                StoreError::VersionConflict { .. } => {
                    (StatusCode::CONFLICT, "version_conflict", None)
                }
                other => {
                    tracing::error!("Store error: {:?}", other);
                    (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", None)
                }
            },

            // 500 Internal Server Error
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
