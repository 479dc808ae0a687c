//! banking_ledger Library
//!
//! Ledger engine for deposit, withdraw and transfer against persisted
//! accounts: optimistic concurrency with bounded retry, atomic units of work
//! and double-entry transaction records. Re-exports modules for the binary,
//! integration testing and external use.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod store;

pub use config::Config;
pub use domain::{
    Account, Amount, AmountError, Balance, LedgerError, NewAccount, TransactionKind,
    TransactionRecord,
};
pub use error::{AppError, AppResult};
pub use ledger::{LedgerEngine, OperationOutcome, RetryPolicy, TransferOutcome};
