//! HTTP API Layer
//!
//! REST API for the expense ledger using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for accounts, expenses, funds and stats
//! - **Middleware**: Bearer-token authentication and audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(accounts, ledger, expenses, config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_ledger::{
    AccountDirectory, AccountStore, BalanceMutator, ExpenseStore, LedgerQueries, LedgerStore,
};

use crate::config::ApiConfig;
use crate::handlers::{accounts, auth as auth_handlers, expenses, health, stats, transactions};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub ledger: Arc<dyn LedgerStore>,
    pub expenses: Arc<dyn ExpenseStore>,
    pub mutator: BalanceMutator,
    pub queries: LedgerQueries,
    pub directory: AccountDirectory,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Wires the domain services over one set of stores
    ///
    /// A single mutator is shared by every request so its per-pool locks
    /// serialize writers within this process.
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        ledger: Arc<dyn LedgerStore>,
        expenses: Arc<dyn ExpenseStore>,
        config: ApiConfig,
    ) -> Self {
        let mutator = BalanceMutator::new(
            accounts.clone(),
            ledger.clone(),
            expenses.clone(),
            &config.ledger,
        );
        let queries = LedgerQueries::new(
            accounts.clone(),
            ledger.clone(),
            expenses.clone(),
            config.ledger.clone(),
        );
        let directory = AccountDirectory::new(accounts.clone());

        Self {
            accounts,
            ledger,
            expenses,
            mutator,
            queries,
            directory,
            config: Arc::new(config),
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/auth/login", post(auth_handlers::login));

    let account_routes = Router::new()
        .route("/", get(accounts::list_accounts).post(accounts::create_account))
        .route(
            "/:id",
            get(accounts::get_account)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route("/:id/balances", get(accounts::get_balances))
        .route("/:id/credits", get(accounts::get_credits));

    let expense_routes = Router::new()
        .route("/", get(expenses::list_expenses).post(expenses::submit_expense))
        .route("/:id", get(expenses::get_expense));

    let stats_routes = Router::new()
        .route("/dashboard", get(stats::dashboard))
        .route("/expenses-by-account", get(stats::expenses_by_account));

    // Protected API routes
    let api_routes = Router::new()
        .route("/session", get(auth_handlers::current_session))
        .nest("/accounts", account_routes)
        .nest("/expenses", expense_routes)
        .route("/funds", post(transactions::add_funds))
        .route("/transactions", get(transactions::list_transactions))
        .nest("/stats", stats_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(cors),
        )
        .with_state(state)
}
