//! Admin statistics

use axum::{extract::State, Extension, Json};

use domain_ledger::{AccountExpenseTotal, Actor, Dashboard};

use crate::{error::ApiError, AppState};

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Dashboard>, ApiError> {
    actor.require_admin()?;
    Ok(Json(state.queries.dashboard().await?))
}

pub async fn expenses_by_account(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<AccountExpenseTotal>>, ApiError> {
    actor.require_admin()?;
    Ok(Json(state.queries.expense_totals_by_account().await?))
}
