//! Domain types
//!
//! Pure ledger domain: accounts, amounts, transaction records and the
//! ledger error taxonomy. Nothing in here touches the web or storage layers.

pub mod account;
pub mod amount;
pub mod error;
pub mod transaction;

pub use account::{Account, NewAccount};
pub use amount::{Amount, AmountError, Balance};
pub use error::LedgerError;
pub use transaction::{TransactionKind, TransactionRecord, UnknownTransactionKind};
