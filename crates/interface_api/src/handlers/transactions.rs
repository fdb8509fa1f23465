//! Fund additions and the transaction history

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::{AccountId, Money};
use domain_ledger::{Actor, AppliedDelta, FundAddition, LedgerEntry, Pool, SalaryPeriod, TransactionSearch};

use crate::dto::ledger::{AddFundsRequest, TransactionListParams};
use crate::dto::{parse_field, parse_optional, PageResponse};
use crate::{error::ApiError, AppState};

/// Credits a pool of any account (admin)
pub async fn add_funds(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<AddFundsRequest>,
) -> Result<(StatusCode, Json<AppliedDelta>), ApiError> {
    actor.require_admin()?;
    request.validate()?;

    let account_id: AccountId = parse_field("account_id", &request.account_id)?;
    let pool: Pool = parse_field("pool", &request.pool)?;
    let period: Option<SalaryPeriod> = parse_optional("salary_month", request.salary_month.as_deref())?;

    let applied = state
        .mutator
        .add_funds(
            &actor,
            FundAddition {
                account_id,
                pool,
                amount: Money::new(request.amount),
                description: request.description,
                period,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(applied)))
}

/// Ledger history, newest first; non-admins only ever see their own
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<TransactionListParams>,
) -> Result<Json<PageResponse<LedgerEntry>>, ApiError> {
    let requested: Option<AccountId> = parse_optional("account_id", params.account_id.as_deref())?;
    let account_id = if actor.is_admin() {
        requested
    } else {
        Some(actor.account_id)
    };

    let filter = state.queries.ledger_filter(TransactionSearch {
        account_id,
        pool: parse_optional("pool", params.pool.as_deref())?,
        date: params.date,
        text: params.q,
    });
    let page = state.config.ledger.page_request(params.page, params.page_size)?;

    let entries = state.queries.list_transactions(&filter, page).await?;
    Ok(Json(entries.into()))
}
