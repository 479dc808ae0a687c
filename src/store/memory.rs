//! In-memory ledger store
//!
//! Same conditional-write semantics as the Postgres store, backed by a
//! single mutex-guarded state. One lock per call keeps every unit of work
//! atomic. Backs the deterministic test suites and database-less local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::{Account, NewAccount, TransactionRecord};

use super::{LedgerStore, StoreError, UnitOfWork};

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    by_number: HashMap<String, Uuid>,
    log: Vec<TransactionRecord>,
}

/// In-memory implementation of [`LedgerStore`].
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    inner: Mutex<Inner>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn find_by_account_number(
        &self,
        account_number: &str,
    ) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .by_number
            .get(account_number)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }

    async fn commit(&self, unit: UnitOfWork) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;

        // Validate every write before mutating anything, so a conflict on
        // the second write of a transfer leaves the first untouched.
        for write in &unit.writes {
            let account = inner
                .accounts
                .get(&write.account_id)
                .ok_or(StoreError::AccountMissing(write.account_id))?;
            if account.version != write.expected_version {
                return Err(StoreError::VersionConflict {
                    account_id: write.account_id,
                    expected: write.expected_version,
                    actual: account.version,
                });
            }
        }

        for write in &unit.writes {
            if let Some(account) = inner.accounts.get_mut(&write.account_id) {
                account.balance = write.new_balance.clone();
                account.version += 1;
            }
        }
        inner.log.extend(unit.records);

        Ok(())
    }

    async fn create_account(&self, new: NewAccount) -> Result<Account, StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.by_number.contains_key(&new.account_number) {
            return Err(StoreError::DuplicateAccountNumber(new.account_number));
        }

        let account = Account::provision(new);
        inner
            .by_number
            .insert(account.account_number.clone(), account.id);
        inner.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn transactions_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .log
            .iter()
            .filter(|record| record.account_id == account_id)
            .cloned()
            .collect())
    }
}
