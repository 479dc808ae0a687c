//! API Routes
//!
//! HTTP endpoint definitions: request validation and JSON mapping around the
//! ledger engine. Amounts travel as strings to keep decimal precision; they
//! are parsed into validated `Amount`s here, before the engine is invoked.
//! The router is generic over the store so the whole surface can be driven
//! against the in-memory store in tests.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Account, Amount, Balance, LedgerError, NewAccount, TransactionRecord};
use crate::error::AppError;
use crate::ledger::{LedgerEngine, RetryPolicy};
use crate::store::LedgerStore;

// =========================================================================
// Application state
// =========================================================================

/// Shared state: the engine plus direct store access for provisioning and
/// audit reads.
pub struct AppState<S> {
    pub engine: Arc<LedgerEngine<S>>,
    pub store: Arc<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> AppState<S> {
    pub fn new(store: Arc<S>, retry: RetryPolicy) -> Self {
        Self {
            engine: Arc::new(LedgerEngine::with_retry_policy(Arc::clone(&store), retry)),
            store,
        }
    }
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub owner_id: Uuid,
    pub account_number: String,
    pub account_type: String,
    /// Opening balance as a decimal string; defaults to zero.
    #[serde(default)]
    pub initial_balance: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub account_number: String,
    pub owner_id: Uuid,
    pub account_type: String,
    pub balance: Decimal,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DepositRequest {
    pub account_number: String,
    pub amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub account_number: String,
    pub amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferRequest {
    pub from_account_number: String,
    pub to_account_number: String,
    pub amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OperationResponse {
    pub account_number: String,
    pub balance: Decimal,
    pub transaction_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransferResponse {
    pub from_account_number: String,
    pub to_account_number: String,
    pub from_balance: Decimal,
    pub to_balance: Decimal,
    pub debit_transaction_id: Uuid,
    pub credit_transaction_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    pub kind: String,
    pub amount: Decimal,
    pub reference_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionListResponse {
    pub account_number: String,
    pub transactions: Vec<TransactionResponse>,
}

fn account_response(account: Account) -> AccountResponse {
    AccountResponse {
        id: account.id,
        account_number: account.account_number,
        owner_id: account.owner_id,
        account_type: account.account_type,
        balance: account.balance.value(),
        version: account.version,
        created_at: account.created_at,
    }
}

fn transaction_response(record: TransactionRecord) -> TransactionResponse {
    TransactionResponse {
        id: record.id,
        account_id: record.account_id,
        kind: record.kind.as_str().to_string(),
        amount: record.amount.value(),
        reference_id: record.reference_id,
        created_at: record.created_at,
    }
}

fn parse_amount(raw: &str) -> Result<Amount, AppError> {
    raw.parse()
        .map_err(|e| AppError::InvalidRequest(format!("Invalid amount: {e}")))
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router<S: LedgerStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        // Provisioning and reads
        .route("/accounts", post(create_account::<S>))
        .route("/accounts/:account_number", get(get_account::<S>))
        .route(
            "/accounts/:account_number/transactions",
            get(list_transactions::<S>),
        )
        // Ledger operations
        .route("/deposit", post(deposit::<S>))
        .route("/withdraw", post(withdraw::<S>))
        .route("/transfers", post(transfer::<S>))
}

// =========================================================================
// POST /accounts
// =========================================================================

/// Provision a new account
async fn create_account<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    if request.account_number.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Account number must not be empty".to_string(),
        ));
    }

    let initial_balance = match request.initial_balance {
        Some(raw) => {
            let value: Decimal = raw.parse().map_err(|e| {
                AppError::InvalidRequest(format!("Invalid initial balance: {e}"))
            })?;
            Balance::new(value)
                .map_err(|e| AppError::InvalidRequest(format!("Invalid initial balance: {e}")))?
        }
        None => Balance::zero(),
    };

    let account = state
        .store
        .create_account(NewAccount {
            owner_id: request.owner_id,
            account_number: request.account_number,
            account_type: request.account_type,
            initial_balance,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(account_response(account))))
}

// =========================================================================
// GET /accounts/:account_number
// =========================================================================

/// Get account by number
async fn get_account<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(account_number): Path<String>,
) -> Result<Json<AccountResponse>, AppError> {
    let account = state
        .store
        .find_by_account_number(&account_number)
        .await?
        .ok_or(LedgerError::AccountNotFound(account_number))?;

    Ok(Json(account_response(account)))
}

// =========================================================================
// GET /accounts/:account_number/transactions
// =========================================================================

/// Audit trail for one account, in append order
async fn list_transactions<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Path(account_number): Path<String>,
) -> Result<Json<TransactionListResponse>, AppError> {
    let account = state
        .store
        .find_by_account_number(&account_number)
        .await?
        .ok_or(LedgerError::AccountNotFound(account_number))?;

    let transactions = state
        .store
        .transactions_for_account(account.id)
        .await?
        .into_iter()
        .map(transaction_response)
        .collect();

    Ok(Json(TransactionListResponse {
        account_number: account.account_number,
        transactions,
    }))
}

// =========================================================================
// POST /deposit
// =========================================================================

/// Deposit into an account
async fn deposit<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<DepositRequest>,
) -> Result<Json<OperationResponse>, AppError> {
    let amount = parse_amount(&request.amount)?;
    let outcome = state.engine.deposit(&request.account_number, amount).await?;

    Ok(Json(OperationResponse {
        account_number: outcome.account_number,
        balance: outcome.balance.value(),
        transaction_id: outcome.transaction.id,
    }))
}

// =========================================================================
// POST /withdraw
// =========================================================================

/// Withdraw from an account
async fn withdraw<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<WithdrawRequest>,
) -> Result<Json<OperationResponse>, AppError> {
    let amount = parse_amount(&request.amount)?;
    let outcome = state
        .engine
        .withdraw(&request.account_number, amount)
        .await?;

    Ok(Json(OperationResponse {
        account_number: outcome.account_number,
        balance: outcome.balance.value(),
        transaction_id: outcome.transaction.id,
    }))
}

// =========================================================================
// POST /transfers
// =========================================================================

/// Transfer between two accounts
async fn transfer<S: LedgerStore + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, AppError> {
    let amount = parse_amount(&request.amount)?;
    let outcome = state
        .engine
        .transfer(
            &request.from_account_number,
            &request.to_account_number,
            amount,
        )
        .await?;

    Ok(Json(TransferResponse {
        from_account_number: outcome.from_account_number,
        to_account_number: outcome.to_account_number,
        from_balance: outcome.from_balance.value(),
        to_balance: outcome.to_balance.value(),
        debit_transaction_id: outcome.debit.id,
        credit_transaction_id: outcome.credit.id,
    }))
}
