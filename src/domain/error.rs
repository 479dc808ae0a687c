//! Ledger error taxonomy
//!
//! Business failures and the concurrency outcomes of a unit of work. These
//! errors are independent of the web/infrastructure layer.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::AmountError;

/// Errors surfaced by ledger operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    /// Referenced account number has no matching record. Never retried.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Transfer source account missing. Never retried.
    #[error("Source account not found: {0}")]
    SourceAccountNotFound(String),

    /// Transfer destination account missing. Never retried.
    #[error("Destination account not found: {0}")]
    DestinationAccountNotFound(String),

    /// Debit exceeds the source balance at read time. Terminal business
    /// failure, never retried.
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },

    /// Transfer where source and destination are the same account.
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    /// A conditional save observed a version mismatch. Retried internally;
    /// only surfaced once retries are exhausted, as `ConcurrencyExhausted`.
    #[error("Version conflict on account {account_id}: expected {expected}, found {actual}")]
    VersionConflict {
        account_id: Uuid,
        expected: i64,
        actual: i64,
    },

    /// Version conflicts persisted past the maximum attempt count.
    #[error("Concurrent updates persisted after {attempts} attempts, giving up")]
    ConcurrencyExhausted { attempts: u32 },

    /// Amount or balance bound violated while computing new balances.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Generic infrastructure failure (storage unavailable, corrupt rows).
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Only version conflicts warrant re-running the unit of work.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::VersionConflict { .. })
    }
}
