//! Ledger engine
//!
//! Deposit, withdraw and transfer as retryable units of work. Each attempt
//! reads the account(s), validates, computes new balances from the reads of
//! that attempt only, and hands the conditional writes plus the transaction
//! records to the store as one atomic commit. On a version conflict the
//! retry coordinator re-runs the whole attempt against fresh snapshots.

pub mod retry;

pub use retry::{run_with_retry, RetryPolicy};

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Amount, Balance, LedgerError, TransactionKind, TransactionRecord};
use crate::store::{ConditionalWrite, LedgerStore, StoreError, UnitOfWork};

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VersionConflict {
                account_id,
                expected,
                actual,
            } => LedgerError::VersionConflict {
                account_id,
                expected,
                actual,
            },
            other => LedgerError::Storage(other.to_string()),
        }
    }
}

/// Result of a committed deposit or withdrawal.
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome {
    pub account_id: Uuid,
    pub account_number: String,
    pub balance: Balance,
    pub transaction: TransactionRecord,
}

/// Result of a committed transfer: two linked records whose balance deltas
/// net to zero.
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    pub from_account_number: String,
    pub to_account_number: String,
    pub from_balance: Balance,
    pub to_balance: Balance,
    pub debit: TransactionRecord,
    pub credit: TransactionRecord,
}

/// Orchestrates balance-mutating operations against a [`LedgerStore`].
pub struct LedgerEngine<S> {
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S: LedgerStore> LedgerEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_retry_policy(store, RetryPolicy::default())
    }

    pub fn with_retry_policy(store: Arc<S>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Credit `amount` to the account and append a DEPOSIT record.
    pub async fn deposit(
        &self,
        account_number: &str,
        amount: Amount,
    ) -> Result<OperationOutcome, LedgerError> {
        run_with_retry(&self.retry, "deposit", || {
            self.deposit_once(account_number, &amount)
        })
        .await
    }

    async fn deposit_once(
        &self,
        account_number: &str,
        amount: &Amount,
    ) -> Result<OperationOutcome, LedgerError> {
        let account = self
            .store
            .find_by_account_number(account_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))?;

        let new_balance = account.balance.credit(amount)?;
        let transaction =
            TransactionRecord::new(account.id, TransactionKind::Deposit, amount.clone(), None);

        let unit = UnitOfWork::new()
            .write(ConditionalWrite {
                account_id: account.id,
                expected_version: account.version,
                new_balance: new_balance.clone(),
            })
            .record(transaction.clone());
        self.store.commit(unit).await?;

        tracing::info!(account_number, amount = %amount, "deposit committed");
        Ok(OperationOutcome {
            account_id: account.id,
            account_number: account.account_number,
            balance: new_balance,
            transaction,
        })
    }

    /// Debit `amount` from the account and append a WITHDRAW record.
    pub async fn withdraw(
        &self,
        account_number: &str,
        amount: Amount,
    ) -> Result<OperationOutcome, LedgerError> {
        run_with_retry(&self.retry, "withdraw", || {
            self.withdraw_once(account_number, &amount)
        })
        .await
    }

    async fn withdraw_once(
        &self,
        account_number: &str,
        amount: &Amount,
    ) -> Result<OperationOutcome, LedgerError> {
        let account = self
            .store
            .find_by_account_number(account_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_number.to_string()))?;

        if !account.balance.is_sufficient_for(amount) {
            return Err(LedgerError::InsufficientBalance {
                required: amount.value(),
                available: account.balance.value(),
            });
        }

        let new_balance = account.balance.debit(amount)?;
        let transaction =
            TransactionRecord::new(account.id, TransactionKind::Withdraw, amount.clone(), None);

        let unit = UnitOfWork::new()
            .write(ConditionalWrite {
                account_id: account.id,
                expected_version: account.version,
                new_balance: new_balance.clone(),
            })
            .record(transaction.clone());
        self.store.commit(unit).await?;

        tracing::info!(account_number, amount = %amount, "withdrawal committed");
        Ok(OperationOutcome {
            account_id: account.id,
            account_number: account.account_number,
            balance: new_balance,
            transaction,
        })
    }

    /// Move `amount` between two accounts, appending a linked debit/credit
    /// pair of TRANSFER records. Both conditional saves and both appends
    /// commit atomically; a conflict on either save aborts the whole unit.
    pub async fn transfer(
        &self,
        from_account_number: &str,
        to_account_number: &str,
        amount: Amount,
    ) -> Result<TransferOutcome, LedgerError> {
        if from_account_number == to_account_number {
            return Err(LedgerError::SameAccountTransfer);
        }

        run_with_retry(&self.retry, "transfer", || {
            self.transfer_once(from_account_number, to_account_number, &amount)
        })
        .await
    }

    async fn transfer_once(
        &self,
        from_account_number: &str,
        to_account_number: &str,
        amount: &Amount,
    ) -> Result<TransferOutcome, LedgerError> {
        let from = self
            .store
            .find_by_account_number(from_account_number)
            .await?
            .ok_or_else(|| LedgerError::SourceAccountNotFound(from_account_number.to_string()))?;
        let to = self
            .store
            .find_by_account_number(to_account_number)
            .await?
            .ok_or_else(|| {
                LedgerError::DestinationAccountNotFound(to_account_number.to_string())
            })?;

        if !from.balance.is_sufficient_for(amount) {
            return Err(LedgerError::InsufficientBalance {
                required: amount.value(),
                available: from.balance.value(),
            });
        }

        let from_balance = from.balance.debit(amount)?;
        let to_balance = to.balance.credit(amount)?;

        let debit = TransactionRecord::new(from.id, TransactionKind::Transfer, amount.clone(), None);
        let credit = TransactionRecord::new(
            to.id,
            TransactionKind::Transfer,
            amount.clone(),
            Some(debit.id),
        );

        let unit = UnitOfWork::new()
            .write(ConditionalWrite {
                account_id: from.id,
                expected_version: from.version,
                new_balance: from_balance.clone(),
            })
            .write(ConditionalWrite {
                account_id: to.id,
                expected_version: to.version,
                new_balance: to_balance.clone(),
            })
            .record(debit.clone())
            .record(credit.clone());
        self.store.commit(unit).await?;

        tracing::info!(
            from_account_number,
            to_account_number,
            amount = %amount,
            "transfer committed"
        );
        Ok(TransferOutcome {
            from_account_number: from.account_number,
            to_account_number: to.account_number,
            from_balance,
            to_balance,
            debit,
            credit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, NewAccount};
    use crate::store::MemoryLedgerStore;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(1),
        }
    }

    async fn seeded_store(accounts: &[(&str, &str)]) -> Arc<MemoryLedgerStore> {
        let store = Arc::new(MemoryLedgerStore::new());
        for (number, balance) in accounts {
            store
                .create_account(NewAccount {
                    owner_id: Uuid::new_v4(),
                    account_number: number.to_string(),
                    account_type: "CHECKING".to_string(),
                    initial_balance: Balance::new(balance.parse().unwrap()).unwrap(),
                })
                .await
                .unwrap();
        }
        store
    }

    async fn account(store: &MemoryLedgerStore, number: &str) -> Account {
        store
            .find_by_account_number(number)
            .await
            .unwrap()
            .unwrap()
    }

    fn amount(s: &str) -> Amount {
        s.parse().unwrap()
    }

    /// Store wrapper that fails the first `remaining` commits with a version
    /// conflict, then delegates. Counts every commit attempt.
    struct ConflictingStore {
        inner: MemoryLedgerStore,
        remaining: AtomicU32,
        commits: AtomicU32,
    }

    impl ConflictingStore {
        fn failing(times: u32, inner: MemoryLedgerStore) -> Self {
            Self {
                inner,
                remaining: AtomicU32::new(times),
                commits: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl LedgerStore for ConflictingStore {
        async fn find_by_account_number(
            &self,
            account_number: &str,
        ) -> Result<Option<Account>, StoreError> {
            self.inner.find_by_account_number(account_number).await
        }

        async fn commit(&self, unit: UnitOfWork) -> Result<(), StoreError> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            let remaining = self.remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                self.remaining.store(remaining - 1, Ordering::SeqCst);
                let write = &unit.writes[0];
                return Err(StoreError::VersionConflict {
                    account_id: write.account_id,
                    expected: write.expected_version,
                    actual: write.expected_version + 1,
                });
            }
            self.inner.commit(unit).await
        }

        async fn create_account(&self, new: NewAccount) -> Result<Account, StoreError> {
            self.inner.create_account(new).await
        }

        async fn transactions_for_account(
            &self,
            account_id: Uuid,
        ) -> Result<Vec<TransactionRecord>, StoreError> {
            self.inner.transactions_for_account(account_id).await
        }
    }

    #[tokio::test]
    async fn test_deposit_credits_and_records() {
        let store = seeded_store(&[("12345", "1000")]).await;
        let engine = LedgerEngine::with_retry_policy(Arc::clone(&store), fast_policy());

        let outcome = engine.deposit("12345", amount("500")).await.unwrap();
        assert_eq!(outcome.balance.value(), dec!(1500));
        assert_eq!(outcome.transaction.kind, TransactionKind::Deposit);
        assert!(outcome.transaction.reference_id.is_none());

        let stored = account(&store, "12345").await;
        assert_eq!(stored.balance.value(), dec!(1500));
        assert_eq!(stored.version, 1);

        let log = store.transactions_for_account(stored.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].amount.value(), dec!(500));
    }

    #[tokio::test]
    async fn test_deposit_unknown_account() {
        let store = seeded_store(&[]).await;
        let engine = LedgerEngine::with_retry_policy(store, fast_policy());

        let err = engine.deposit("99999", amount("10")).await.unwrap_err();
        assert_eq!(err, LedgerError::AccountNotFound("99999".to_string()));
    }

    #[tokio::test]
    async fn test_withdraw_debits_and_records() {
        let store = seeded_store(&[("12345", "1000")]).await;
        let engine = LedgerEngine::with_retry_policy(Arc::clone(&store), fast_policy());

        let outcome = engine.withdraw("12345", amount("300")).await.unwrap();
        assert_eq!(outcome.balance.value(), dec!(700));
        assert_eq!(outcome.transaction.kind, TransactionKind::Withdraw);

        let stored = account(&store, "12345").await;
        assert_eq!(stored.balance.value(), dec!(700));
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_balance_leaves_state_untouched() {
        let store = seeded_store(&[("12345", "1000")]).await;
        let engine = LedgerEngine::with_retry_policy(Arc::clone(&store), fast_policy());

        let err = engine.withdraw("12345", amount("2000")).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                required: dec!(2000),
                available: dec!(1000),
            }
        );

        let stored = account(&store, "12345").await;
        assert_eq!(stored.balance.value(), dec!(1000));
        assert_eq!(stored.version, 0);
        assert!(store
            .transactions_for_account(stored.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_transfer_moves_funds_with_linked_records() {
        let store = seeded_store(&[("11111", "200.00"), ("22222", "50.00")]).await;
        let engine = LedgerEngine::with_retry_policy(Arc::clone(&store), fast_policy());

        let outcome = engine
            .transfer("11111", "22222", amount("100"))
            .await
            .unwrap();
        assert_eq!(outcome.from_balance.value(), dec!(100.00));
        assert_eq!(outcome.to_balance.value(), dec!(150.00));
        assert_eq!(outcome.debit.kind, TransactionKind::Transfer);
        assert_eq!(outcome.credit.kind, TransactionKind::Transfer);
        assert_eq!(outcome.debit.amount, outcome.credit.amount);
        assert!(outcome.debit.reference_id.is_none());
        assert_eq!(outcome.credit.reference_id, Some(outcome.debit.id));

        let from = account(&store, "11111").await;
        let to = account(&store, "22222").await;
        assert_eq!(from.balance.value(), dec!(100.00));
        assert_eq!(to.balance.value(), dec!(150.00));
        assert_eq!(from.version, 1);
        assert_eq!(to.version, 1);
    }

    #[tokio::test]
    async fn test_transfer_distinguishes_missing_accounts() {
        let store = seeded_store(&[("11111", "200")]).await;
        let engine = LedgerEngine::with_retry_policy(store, fast_policy());

        let err = engine
            .transfer("00000", "11111", amount("10"))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::SourceAccountNotFound("00000".to_string()));

        let err = engine
            .transfer("11111", "00000", amount("10"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::DestinationAccountNotFound("00000".to_string())
        );
    }

    #[tokio::test]
    async fn test_transfer_insufficient_balance() {
        let store = seeded_store(&[("11111", "50"), ("22222", "0")]).await;
        let engine = LedgerEngine::with_retry_policy(Arc::clone(&store), fast_policy());

        let err = engine
            .transfer("11111", "22222", amount("100"))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

        let from = account(&store, "11111").await;
        let to = account(&store, "22222").await;
        assert_eq!(from.balance.value(), dec!(50));
        assert_eq!(to.balance.value(), dec!(0));
    }

    #[tokio::test]
    async fn test_transfer_to_same_account_rejected() {
        let store = seeded_store(&[("11111", "200")]).await;
        let engine = LedgerEngine::with_retry_policy(store, fast_policy());

        let err = engine
            .transfer("11111", "11111", amount("10"))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::SameAccountTransfer);
    }

    #[tokio::test]
    async fn test_conflicted_deposit_succeeds_on_third_attempt() {
        let inner = MemoryLedgerStore::new();
        inner
            .create_account(NewAccount {
                owner_id: Uuid::new_v4(),
                account_number: "12345".to_string(),
                account_type: "CHECKING".to_string(),
                initial_balance: Balance::new(dec!(100)).unwrap(),
            })
            .await
            .unwrap();
        let store = Arc::new(ConflictingStore::failing(2, inner));
        let engine = LedgerEngine::with_retry_policy(Arc::clone(&store), fast_policy());

        let outcome = engine.deposit("12345", amount("50")).await.unwrap();
        assert_eq!(outcome.balance.value(), dec!(150));
        assert_eq!(store.commits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_persistent_conflicts_exhaust_after_three_attempts() {
        let inner = MemoryLedgerStore::new();
        let created = inner
            .create_account(NewAccount {
                owner_id: Uuid::new_v4(),
                account_number: "12345".to_string(),
                account_type: "CHECKING".to_string(),
                initial_balance: Balance::new(dec!(100)).unwrap(),
            })
            .await
            .unwrap();
        let store = Arc::new(ConflictingStore::failing(u32::MAX, inner));
        let engine = LedgerEngine::with_retry_policy(Arc::clone(&store), fast_policy());

        let err = engine.deposit("12345", amount("50")).await.unwrap_err();
        assert_eq!(err, LedgerError::ConcurrencyExhausted { attempts: 3 });
        assert_eq!(store.commits.load(Ordering::SeqCst), 3);

        // No write became observable.
        let stored = store
            .find_by_account_number("12345")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.balance.value(), dec!(100));
        assert_eq!(stored.version, 0);
        assert!(store
            .transactions_for_account(created.id)
            .await
            .unwrap()
            .is_empty());
    }
}
