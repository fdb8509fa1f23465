//! Expense handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;
use validator::Validate;

use core_kernel::{AccountId, ExpenseId, Money};
use domain_ledger::{Actor, Expense, ExpenseCategory, ExpenseReceipt, ExpenseSearch, ExpenseSubmission};

use crate::dto::ledger::{CreateExpenseRequest, ExpenseListParams};
use crate::dto::{parse_field, parse_optional, PageResponse};
use crate::{error::ApiError, AppState};

/// Records an expense against the caller's company pool
pub async fn submit_expense(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseReceipt>), ApiError> {
    request.validate()?;
    let category: ExpenseCategory = parse_field("category", &request.category)?;

    let receipt = state
        .mutator
        .submit_expense(
            &actor,
            ExpenseSubmission {
                category,
                description: request.description,
                amount: Money::new(request.amount),
                receipt: request.receipt,
            },
        )
        .await?;

    info!(
        expense_id = %receipt.expense.id,
        account_id = %actor.account_id,
        "Expense submitted"
    );
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Lists expenses; non-admins only ever see their own
pub async fn list_expenses(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ExpenseListParams>,
) -> Result<Json<PageResponse<Expense>>, ApiError> {
    let requested: Option<AccountId> = parse_optional("account_id", params.account_id.as_deref())?;
    let account_id = if actor.is_admin() {
        requested
    } else {
        Some(actor.account_id)
    };

    let filter = state.queries.expense_filter(ExpenseSearch {
        account_id,
        category: parse_optional("category", params.category.as_deref())?,
        date: params.date,
        text: params.q,
    });
    let page = state.config.ledger.page_request(params.page, params.page_size)?;

    let expenses = state.queries.list_expenses(&filter, page).await?;
    Ok(Json(expenses.into()))
}

/// Gets one expense (owner or admin)
pub async fn get_expense(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<Expense>, ApiError> {
    let id: ExpenseId = parse_field("expense id", &id)?;
    Ok(Json(state.queries.get_expense(&actor, id).await?))
}
