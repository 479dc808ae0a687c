//! API layer
//!
//! Thin HTTP wrappers around the ledger engine.

pub mod routes;

pub use routes::{create_router, AppState};
