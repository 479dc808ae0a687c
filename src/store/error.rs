//! Store errors

use uuid::Uuid;

/// Errors that can occur in the ledger store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Optimistic concurrency conflict: a conditional write was rejected
    /// because the stored version no longer matches.
    #[error("Version conflict for account {account_id}: expected version {expected}, found {actual}")]
    VersionConflict {
        account_id: Uuid,
        expected: i64,
        actual: i64,
    },

    /// A conditional write referenced an account id that does not exist.
    #[error("Account missing from store: {0}")]
    AccountMissing(Uuid),

    /// Provisioning collided with an existing account number.
    #[error("Duplicate account number: {0}")]
    DuplicateAccountNumber(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row violates a domain invariant.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}
