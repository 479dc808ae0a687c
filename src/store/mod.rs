//! Account storage and the append-only transaction log
//!
//! `LedgerStore` is the single collaborator seam the engine writes through.
//! Conditional account saves and transaction-record appends travel together
//! in one `UnitOfWork`, so the two saves of a transfer can never be split:
//! either the whole unit commits or none of it does.

mod error;
pub mod memory;
pub mod postgres;

pub use error::StoreError;
pub use memory::MemoryLedgerStore;
pub use postgres::PgLedgerStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Account, Balance, NewAccount, TransactionRecord};

/// A version-checked balance write.
///
/// The write only applies if the stored version still equals
/// `expected_version`; on success the stored version is incremented by
/// exactly 1.
#[derive(Debug, Clone)]
pub struct ConditionalWrite {
    pub account_id: Uuid,
    /// Version observed when the account was read for this attempt.
    pub expected_version: i64,
    pub new_balance: Balance,
}

/// The writes of one ledger operation: balance updates plus the transaction
/// records documenting them. Everything commits or nothing does.
#[derive(Debug, Clone, Default)]
pub struct UnitOfWork {
    pub writes: Vec<ConditionalWrite>,
    pub records: Vec<TransactionRecord>,
}

impl UnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(mut self, write: ConditionalWrite) -> Self {
        self.writes.push(write);
        self
    }

    pub fn record(mut self, record: TransactionRecord) -> Self {
        self.records.push(record);
        self
    }
}

/// Durable keyed storage for accounts plus the append-only transaction log.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Look up an account by its external key.
    async fn find_by_account_number(
        &self,
        account_number: &str,
    ) -> Result<Option<Account>, StoreError>;

    /// Atomically apply a unit of work.
    ///
    /// Every conditional write is checked against the stored version; on any
    /// mismatch the whole unit fails with `StoreError::VersionConflict` and
    /// nothing is written. On success each touched version is incremented by
    /// 1 and every record is appended, all visible to subsequent reads.
    async fn commit(&self, unit: UnitOfWork) -> Result<(), StoreError>;

    /// Provision a new account at version 0.
    async fn create_account(&self, new: NewAccount) -> Result<Account, StoreError>;

    /// Audit-trail listing for one account, in append order.
    async fn transactions_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, StoreError>;
}
