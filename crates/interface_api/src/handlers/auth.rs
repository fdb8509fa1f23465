//! Sign-in and session handlers

use axum::{extract::State, Extension, Json};
use tracing::info;
use validator::Validate;

use domain_ledger::{Actor, BalanceSnapshot};

use crate::auth::create_token;
use crate::dto::auth::{LoginRequest, LoginResponse};
use crate::{error::ApiError, AppState};

/// Exchanges name and PIN for a bearer token
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let account = state.directory.authenticate(&request.name, &request.pin).await?;
    let token = create_token(&account, &state.config.jwt_secret, state.config.jwt_expiration_secs)?;
    info!(account_id = %account.id, "Signed in");

    Ok(Json(LoginResponse {
        token,
        account: BalanceSnapshot::from(&account),
    }))
}

/// The caller's current balances, read fresh from the store
pub async fn current_session(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<BalanceSnapshot>, ApiError> {
    match state.queries.balance_snapshot(actor.account_id).await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(e) if e.is_not_found() => Err(ApiError::Unauthorized("Account no longer exists".to_string())),
        Err(e) => Err(e.into()),
    }
}
