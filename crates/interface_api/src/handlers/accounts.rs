//! Account management handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::AccountId;
use domain_ledger::{Actor, BalanceSnapshot, PoolTotals};

use crate::dto::accounts::{AccountResponse, CreateAccountRequest, UpdateAccountRequest};
use crate::dto::parse_field;
use crate::{error::ApiError, AppState};

/// Lists accounts by name (admin)
pub async fn list_accounts(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<AccountResponse>>, ApiError> {
    let accounts = state.directory.list_accounts(&actor).await?;
    Ok(Json(accounts.into_iter().map(AccountResponse::from).collect()))
}

/// Creates an account (admin)
pub async fn create_account(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    request.validate()?;
    let account = state.directory.create_account(&actor, request.into()).await?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Gets an account (self or admin)
pub async fn get_account(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<AccountResponse>, ApiError> {
    let id: AccountId = parse_field("account id", &id)?;
    let account = state.directory.get_account(&actor, id).await?;
    Ok(Json(account.into()))
}

/// Updates profile fields (admin); balances are never touched here
pub async fn update_account(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    request.validate()?;
    let id: AccountId = parse_field("account id", &id)?;
    let account = state.directory.update_profile(&actor, id, request.into()).await?;
    Ok(Json(account.into()))
}

/// Deletes an account (admin)
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id: AccountId = parse_field("account id", &id)?;
    state.directory.delete_account(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Current balances (self or admin)
pub async fn get_balances(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<BalanceSnapshot>, ApiError> {
    let id: AccountId = parse_field("account id", &id)?;
    let account = state.directory.get_account(&actor, id).await?;
    Ok(Json(BalanceSnapshot::from(&account)))
}

/// Ledger sums per pool (self or admin); display only
pub async fn get_credits(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<PoolTotals>, ApiError> {
    let id: AccountId = parse_field("account id", &id)?;
    state.directory.get_account(&actor, id).await?;
    Ok(Json(state.queries.pool_credit_totals(id).await?))
}
