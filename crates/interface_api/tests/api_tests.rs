//! HTTP API tests over the in-memory stores

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};

use domain_ledger::{
    Account, AccountDirectory, MemoryAccountStore, MemoryExpenseStore, MemoryLedgerStore,
    NewAccount, Role,
};
use interface_api::auth::create_token;
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};
use test_utils::{random_name, AccountFixtures};

struct Harness {
    server: TestServer,
    ledger: Arc<MemoryLedgerStore>,
    admin: Account,
    user: Account,
    config: ApiConfig,
}

impl Harness {
    async fn new() -> Self {
        let accounts = Arc::new(MemoryAccountStore::new());
        let ledger = Arc::new(MemoryLedgerStore::new());
        let expenses = Arc::new(MemoryExpenseStore::new());
        let config = ApiConfig {
            jwt_secret: "test-secret".to_string(),
            ..ApiConfig::default()
        };

        let directory = AccountDirectory::new(accounts.clone());
        let admin = directory
            .bootstrap_admin(AccountFixtures::ADMIN_NAME, AccountFixtures::ADMIN_PIN)
            .await
            .unwrap()
            .unwrap();
        let user = directory
            .create_account(
                &admin.actor(),
                NewAccount {
                    name: random_name(),
                    pin: AccountFixtures::USER_PIN.to_string(),
                    role: Role::User,
                    salary: None,
                },
            )
            .await
            .unwrap();

        let state = AppState::new(accounts, ledger.clone(), expenses, config.clone());
        let server = TestServer::new(create_router(state)).unwrap();

        Self {
            server,
            ledger,
            admin,
            user,
            config,
        }
    }

    fn token(&self, account: &Account) -> String {
        create_token(account, &self.config.jwt_secret, 60).unwrap()
    }

    fn as_admin(&self, request: TestRequest) -> TestRequest {
        let token = self.token(&self.admin);
        with_bearer(request, &token)
    }

    fn as_user(&self, request: TestRequest) -> TestRequest {
        let token = self.token(&self.user);
        with_bearer(request, &token)
    }

    async fn fund_company(&self, account: &Account, amount: &str) {
        let response = self
            .as_admin(self.server.post("/api/v1/funds"))
            .json(&json!({
                "account_id": account.id.to_string(),
                "pool": "company",
                "amount": amount,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    async fn submit(&self, category: &str, description: &str, amount: &str) -> axum_test::TestResponse {
        self.as_user(self.server.post("/api/v1/expenses"))
            .json(&json!({
                "category": category,
                "description": description,
                "amount": amount,
            }))
            .await
    }
}

fn with_bearer(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    )
}

#[tokio::test]
async fn test_health_is_public() {
    let h = Harness::new().await;
    h.server.get("/health").await.assert_status_ok();

    let ready = h.server.get("/health/ready").await;
    ready.assert_status_ok();
    assert_eq!(ready.json::<Value>()["status"], "ready");
}

#[tokio::test]
async fn test_login_returns_token_and_snapshot() {
    let h = Harness::new().await;

    let response = h
        .server
        .post("/auth/login")
        .json(&json!({ "name": h.user.name, "pin": AccountFixtures::USER_PIN }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["account"]["name"], h.user.name.as_str());
    assert_eq!(body["account"]["balances"]["company"], "0.00");
    assert!(body["account"].get("pin").is_none());

    let token = body["token"].as_str().unwrap().to_string();
    let session = with_bearer(h.server.get("/api/v1/session"), &token).await;
    session.assert_status_ok();
    assert_eq!(session.json::<Value>()["name"], h.user.name.as_str());
}

#[tokio::test]
async fn test_wrong_pin_is_unauthorized() {
    let h = Harness::new().await;
    let response = h
        .server
        .post("/auth/login")
        .json(&json!({ "name": h.user.name, "pin": "9999" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"], "unauthorized");
}

#[tokio::test]
async fn test_api_requires_bearer_token() {
    let h = Harness::new().await;
    h.server
        .get("/api/v1/transactions")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    with_bearer(h.server.get("/api/v1/transactions"), "not-a-token")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expense_debits_company_pool_and_is_listed() {
    let h = Harness::new().await;
    h.fund_company(&h.user, "100").await;

    let response = h.submit("site_work", "Cement bags", "30.50").await;
    response.assert_status(StatusCode::CREATED);
    let receipt: Value = response.json();
    assert_eq!(receipt["new_balance"], "69.50");
    assert_eq!(receipt["expense"]["category"], "Site Work");
    assert_eq!(receipt["ledger_entry"]["amount"], "-30.50");
    assert_eq!(receipt["expense"]["ledger_entry_id"], receipt["ledger_entry"]["id"]);

    let balances = h
        .as_user(h.server.get(&format!("/api/v1/accounts/{}/balances", h.user.id)))
        .await;
    balances.assert_status_ok();
    assert_eq!(balances.json::<Value>()["balances"]["company"], "69.50");

    let listed = h
        .as_user(h.server.get("/api/v1/expenses"))
        .add_query_param("q", "cement")
        .await;
    listed.assert_status_ok();
    let page: Value = listed.json();
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["description"], "Cement bags");
}

#[tokio::test]
async fn test_expense_without_funds_goes_negative() {
    let h = Harness::new().await;
    let response = h.submit("Travel", "Cab to site", "250").await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["new_balance"], "-250.00");
}

#[tokio::test]
async fn test_invalid_expense_is_rejected_without_side_effects() {
    let h = Harness::new().await;

    h.submit("Travel", "Cab", "0").await.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    h.submit("Groceries", "Milk", "10").await.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let history = h.as_admin(h.server.get("/api/v1/transactions")).await;
    assert_eq!(history.json::<Value>()["total"], 0);
}

#[tokio::test]
async fn test_legacy_receipt_field_is_accepted() {
    let h = Harness::new().await;
    let response = h
        .as_user(h.server.post("/api/v1/expenses"))
        .json(&json!({
            "category": "Meals",
            "description": "Team lunch",
            "amount": "45",
            "photo_url": "receipts/lunch.jpg",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["expense"]["image"], "receipts/lunch.jpg");
}

#[tokio::test]
async fn test_only_admins_add_funds() {
    let h = Harness::new().await;
    let response = h
        .as_user(h.server.post("/api/v1/funds"))
        .json(&json!({
            "account_id": h.user.id.to_string(),
            "pool": "personal",
            "amount": "1000",
        }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let balances = h
        .as_admin(h.server.get(&format!("/api/v1/accounts/{}/balances", h.user.id)))
        .await;
    assert_eq!(balances.json::<Value>()["balances"]["personal"], "0.00");
}

#[tokio::test]
async fn test_non_admin_fund_request_is_forbidden_before_validation() {
    let h = Harness::new().await;
    let response = h
        .as_user(h.server.post("/api/v1/funds"))
        .json(&json!({
            "account_id": "not-an-id",
            "pool": "savings",
            "amount": "5",
            "description": "x".repeat(600),
        }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_amount_above_limit_is_rejected() {
    let h = Harness::new().await;
    h.submit("Travel", "Charter flight", "1000000000000")
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let response = h
        .as_admin(h.server.post("/api/v1/funds"))
        .json(&json!({
            "account_id": h.user.id.to_string(),
            "pool": "company",
            "amount": "40000000000000000000000000000",
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let dashboard = h.as_admin(h.server.get("/api/v1/stats/dashboard")).await;
    dashboard.assert_status_ok();
    assert_eq!(dashboard.json::<Value>()["expenses"]["total"], "0.00");
}

#[tokio::test]
async fn test_salary_credit_requires_month() {
    let h = Harness::new().await;
    let missing = h
        .as_admin(h.server.post("/api/v1/funds"))
        .json(&json!({ "user_id": h.user.id.to_string(), "type": "salary", "amount": "45000" }))
        .await;
    missing.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let credited = h
        .as_admin(h.server.post("/api/v1/funds"))
        .json(&json!({
            "user_id": h.user.id.to_string(),
            "type": "salary",
            "amount": "45000",
            "salary_month": "2024-03",
        }))
        .await;
    credited.assert_status(StatusCode::CREATED);
    let applied: Value = credited.json();
    assert_eq!(applied["new_balance"], "45000.00");
    assert_eq!(applied["entry"]["salary_month"], "2024-03-01");
    assert_eq!(applied["entry"]["recorded_by"], h.admin.id.as_uuid().to_string());
}

#[tokio::test]
async fn test_transactions_are_scoped_and_paged() {
    let h = Harness::new().await;
    for _ in 0..3 {
        h.fund_company(&h.user, "10").await;
    }
    h.fund_company(&h.admin, "10").await;

    let own = h
        .as_user(h.server.get("/api/v1/transactions"))
        .add_query_param("account_id", h.admin.id.to_string())
        .add_query_param("page_size", "2")
        .await;
    own.assert_status_ok();
    let page: Value = own.json();
    assert_eq!(page["total"], 3);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["items"].as_array().unwrap().len(), 2);
    assert!(page["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["user_id"] == h.user.id.as_uuid().to_string()));

    let everyone = h.as_admin(h.server.get("/api/v1/transactions")).await;
    assert_eq!(everyone.json::<Value>()["total"], 4);

    let bad_page = h
        .as_admin(h.server.get("/api/v1/transactions"))
        .add_query_param("page", "0")
        .await;
    bad_page.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let bad_pool = h
        .as_admin(h.server.get("/api/v1/transactions"))
        .add_query_param("pool", "savings")
        .await;
    bad_pool.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_failed_ledger_append_reports_out_of_sync() {
    let h = Harness::new().await;
    h.ledger.fail_appends(true);

    let response = h.submit("Software", "IDE licence", "99").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error"], "ledger_out_of_sync");
}

#[tokio::test]
async fn test_expense_visibility() {
    let h = Harness::new().await;
    let created: Value = h.submit("Bill", "Electricity", "1200").await.json();
    let id = created["expense"]["id"].as_str().unwrap().to_string();

    h.as_user(h.server.get(&format!("/api/v1/expenses/{}", id)))
        .await
        .assert_status_ok();
    h.as_admin(h.server.get(&format!("/api/v1/expenses/{}", id)))
        .await
        .assert_status_ok();

    let other = Account {
        id: core_kernel::AccountId::new(),
        ..h.user.clone()
    };
    let response = with_bearer(
        h.server.get(&format!("/api/v1/expenses/{}", id)),
        &h.token(&other),
    )
    .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_account_management_is_admin_only() {
    let h = Harness::new().await;

    h.as_user(h.server.get("/api/v1/accounts"))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let created = h
        .as_admin(h.server.post("/api/v1/accounts"))
        .json(&json!({ "name": "Meera", "pin": "2468", "role": "user", "salary": "30000" }))
        .await;
    created.assert_status(StatusCode::CREATED);
    let account: Value = created.json();
    assert_eq!(account["salary"], "30000.00");
    assert!(account.get("pin").is_none());

    let duplicate = h
        .as_admin(h.server.post("/api/v1/accounts"))
        .json(&json!({ "name": "Meera", "pin": "1357", "role": "user" }))
        .await;
    duplicate.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let id = account["id"].as_str().unwrap().to_string();
    let updated = h
        .as_admin(h.server.put(&format!("/api/v1/accounts/{}", id)))
        .json(&json!({ "salary": null }))
        .await;
    updated.assert_status_ok();
    assert_eq!(updated.json::<Value>()["salary"], Value::Null);

    h.as_admin(h.server.delete(&format!("/api/v1/accounts/{}", id)))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    h.as_admin(h.server.get(&format!("/api/v1/accounts/{}", id)))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_dashboard_and_totals() {
    let h = Harness::new().await;
    h.submit("Travel", "Train", "40").await.assert_status(StatusCode::CREATED);
    h.submit("Meals", "Lunch", "60").await.assert_status(StatusCode::CREATED);

    h.as_user(h.server.get("/api/v1/stats/dashboard"))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let dashboard = h.as_admin(h.server.get("/api/v1/stats/dashboard")).await;
    dashboard.assert_status_ok();
    let body: Value = dashboard.json();
    assert_eq!(body["account_count"], 2);
    assert_eq!(body["expenses"]["total"], "100.00");
    assert_eq!(body["expenses"]["count"], 2);
    assert_eq!(body["recent_expenses"][0]["description"], "Lunch");

    let totals = h.as_admin(h.server.get("/api/v1/stats/expenses-by-account")).await;
    let totals: Value = totals.json();
    assert_eq!(totals.as_array().unwrap().len(), 1);
    assert_eq!(totals[0]["total"], "100.00");

    let credits = h
        .as_user(h.server.get(&format!("/api/v1/accounts/{}/credits", h.user.id)))
        .await;
    credits.assert_status_ok();
    assert_eq!(credits.json::<Value>()["company"], "-100.00");
}
