//! Shared test helpers

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use banking_ledger::api::AppState;
use banking_ledger::domain::{Account, Balance, NewAccount};
use banking_ledger::store::{LedgerStore, MemoryLedgerStore};
use banking_ledger::{LedgerEngine, RetryPolicy};

/// Policy with short backoff so contended tests stay fast.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        delay: Duration::from_millis(5),
    }
}

pub fn memory_store() -> Arc<MemoryLedgerStore> {
    Arc::new(MemoryLedgerStore::new())
}

pub fn memory_engine(store: Arc<MemoryLedgerStore>) -> Arc<LedgerEngine<MemoryLedgerStore>> {
    Arc::new(LedgerEngine::with_retry_policy(store, fast_retry()))
}

pub fn memory_state() -> AppState<MemoryLedgerStore> {
    AppState::new(memory_store(), fast_retry())
}

pub async fn seed_account(store: &MemoryLedgerStore, number: &str, balance: Decimal) -> Account {
    store
        .create_account(NewAccount {
            owner_id: Uuid::new_v4(),
            account_number: number.to_string(),
            account_type: "CHECKING".to_string(),
            initial_balance: Balance::new(balance).unwrap(),
        })
        .await
        .unwrap()
}

pub async fn account(store: &MemoryLedgerStore, number: &str) -> Account {
    store
        .find_by_account_number(number)
        .await
        .unwrap()
        .unwrap()
}
