//! Transaction records
//!
//! The append-only audit trail. A record is created exactly once per balance
//! mutation and is immutable thereafter; it is never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Amount;

/// Kind of balance mutation a record documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    Deposit,
    Withdraw,
    Transfer,
}

impl TransactionKind {
    /// Stable string form used in the database and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdraw => "WITHDRAW",
            TransactionKind::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized transaction kind string read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown transaction kind: {0}")]
pub struct UnknownTransactionKind(pub String);

impl FromStr for TransactionKind {
    type Err = UnknownTransactionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(TransactionKind::Deposit),
            "WITHDRAW" => Ok(TransactionKind::Withdraw),
            "TRANSFER" => Ok(TransactionKind::Transfer),
            other => Err(UnknownTransactionKind(other.to_string())),
        }
    }
}

/// One appended ledger record.
///
/// For the credit side of a transfer, `reference_id` links to the sibling
/// debit record; deposits and withdrawals carry no reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Amount,
    pub reference_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Build a record with a freshly assigned id.
    pub fn new(
        account_id: Uuid,
        kind: TransactionKind,
        amount: Amount,
        reference_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            kind,
            amount,
            reference_id,
            created_at: Utc::now(),
        }
    }
}
