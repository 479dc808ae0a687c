//! Postgres-backed ledger store
//!
//! Conditional saves are compare-and-swap UPDATEs fenced on the version
//! column; a whole unit of work runs inside one SQL transaction, so the two
//! saves of a transfer commit or roll back together.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Account, Amount, Balance, NewAccount, TransactionRecord};

use super::{LedgerStore, StoreError, UnitOfWork};

type AccountRow = (Uuid, String, Uuid, String, Decimal, i64, DateTime<Utc>);
type TransactionRow = (Uuid, Uuid, String, Decimal, Option<Uuid>, DateTime<Utc>);

/// Postgres implementation of [`LedgerStore`].
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn account_from_row(row: AccountRow) -> Result<Account, StoreError> {
    let (id, account_number, owner_id, account_type, balance, version, created_at) = row;
    let balance = Balance::new(balance)
        .map_err(|e| StoreError::Corrupt(format!("account {id} balance: {e}")))?;
    Ok(Account {
        id,
        account_number,
        owner_id,
        account_type,
        balance,
        version,
        created_at,
    })
}

fn transaction_from_row(row: TransactionRow) -> Result<TransactionRecord, StoreError> {
    let (id, account_id, kind, amount, reference_id, created_at) = row;
    let kind = kind
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("transaction {id}: {e}")))?;
    let amount = Amount::new(amount)
        .map_err(|e| StoreError::Corrupt(format!("transaction {id} amount: {e}")))?;
    Ok(TransactionRecord {
        id,
        account_id,
        kind,
        amount,
        reference_id,
        created_at,
    })
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn find_by_account_number(
        &self,
        account_number: &str,
    ) -> Result<Option<Account>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT id, account_number, owner_id, account_type, balance, version, created_at
            FROM accounts
            WHERE account_number = $1
            "#,
        )
        .bind(account_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(account_from_row).transpose()
    }

    async fn commit(&self, unit: UnitOfWork) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for write in &unit.writes {
            let result = sqlx::query(
                r#"
                UPDATE accounts
                SET balance = $1, version = version + 1
                WHERE id = $2 AND version = $3
                "#,
            )
            .bind(write.new_balance.value())
            .bind(write.account_id)
            .bind(write.expected_version)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back anything already done.
                let actual: Option<i64> =
                    sqlx::query_scalar("SELECT version FROM accounts WHERE id = $1")
                        .bind(write.account_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                return match actual {
                    Some(actual) => Err(StoreError::VersionConflict {
                        account_id: write.account_id,
                        expected: write.expected_version,
                        actual,
                    }),
                    None => Err(StoreError::AccountMissing(write.account_id)),
                };
            }
        }

        for record in &unit.records {
            sqlx::query(
                r#"
                INSERT INTO transactions (id, account_id, kind, amount, reference_id, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(record.id)
            .bind(record.account_id)
            .bind(record.kind.as_str())
            .bind(record.amount.value())
            .bind(record.reference_id)
            .bind(record.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn create_account(&self, new: NewAccount) -> Result<Account, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM accounts WHERE account_number = $1)",
        )
        .bind(&new.account_number)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            return Err(StoreError::DuplicateAccountNumber(new.account_number));
        }

        let account = Account::provision(new);
        sqlx::query(
            r#"
            INSERT INTO accounts (id, account_number, owner_id, account_type, balance, version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id)
        .bind(&account.account_number)
        .bind(account.owner_id)
        .bind(&account.account_type)
        .bind(account.balance.value())
        .bind(account.version)
        .bind(account.created_at)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    async fn transactions_for_account(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<TransactionRecord>, StoreError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, account_id, kind, amount, reference_id, created_at
            FROM transactions
            WHERE account_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(transaction_from_row).collect()
    }
}
