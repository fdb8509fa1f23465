//! Balance mutation and ledger tests for domain_ledger

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal_macros::dec;
use std::time::Duration as StdDuration;

use core_kernel::{AccountId, Money};

use domain_ledger::{
    DeltaRequest, ExpenseCategory, ExpenseStore, ExpenseSubmission, FundAddition, LedgerConfig, LedgerError,
    LedgerFilter, LedgerStore, MemoryAccountStore, PageRequest, Pool, SalaryPeriod,
};
use test_utils::{
    assert_balance, assert_entries_newest_first, nonzero_delta_strategy, pool_strategy,
    AccountFixtures, MoneyFixtures, TemporalFixtures, TestLedger, TestLedgerEntryBuilder,
};

// ============================================================================
// apply_delta
// ============================================================================

mod apply_delta_tests {
    use super::*;

    #[tokio::test]
    async fn test_balance_moves_by_exact_delta() {
        let harness = TestLedger::new();
        let user = harness.add_user().await;
        harness
            .seed_balance(user.id, Pool::Personal, MoneyFixtures::odd_paise())
            .await;

        let applied = harness
            .mutator
            .apply_delta(DeltaRequest::new(user.id, Pool::Personal, Money::new(dec!(0.43))))
            .await
            .unwrap();

        assert_eq!(applied.previous_balance, Money::new(dec!(1234.57)));
        assert_eq!(applied.new_balance, Money::new(dec!(1235.00)));
        assert_balance(harness.accounts.as_ref(), user.id, Pool::Personal, Money::new(dec!(1235.00))).await;
    }

    #[tokio::test]
    async fn test_entry_amount_is_the_delta_not_the_balance() {
        let harness = TestLedger::new();
        let user = harness.add_user().await;
        harness.seed_balance(user.id, Pool::Company, Money::new(dec!(500))).await;
        let before = harness.ledger.len().await;

        let applied = harness
            .mutator
            .apply_delta(
                DeltaRequest::new(user.id, Pool::Company, Money::new(dec!(-120.50)))
                    .with_description("printer toner"),
            )
            .await
            .unwrap();

        assert_eq!(harness.ledger.len().await, before + 1);
        let stored = harness.ledger.get_entry(applied.ledger_entry_id).await.unwrap();
        assert_eq!(stored.amount, Money::new(dec!(-120.50)));
        assert_eq!(stored.pool, Pool::Company);
        assert_eq!(stored.account_id, user.id);
        assert_eq!(stored.description.as_deref(), Some("printer toner"));
        assert_eq!(applied.new_balance, Money::new(dec!(379.50)));
    }

    #[tokio::test]
    async fn test_pools_are_independent() {
        let harness = TestLedger::new();
        let user = harness.add_user().await;

        harness.seed_balance(user.id, Pool::Salary, MoneyFixtures::salary()).await;

        assert_balance(harness.accounts.as_ref(), user.id, Pool::Salary, MoneyFixtures::salary()).await;
        assert_balance(harness.accounts.as_ref(), user.id, Pool::Company, Money::zero()).await;
        assert_balance(harness.accounts.as_ref(), user.id, Pool::Personal, Money::zero()).await;
    }

    #[tokio::test]
    async fn test_salary_without_period_is_validation_error() {
        let harness = TestLedger::new();
        let user = harness.add_user().await;

        let err = harness
            .mutator
            .apply_delta(DeltaRequest::new(user.id, Pool::Salary, MoneyFixtures::salary()))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(harness.ledger.is_empty().await);
        assert_balance(harness.accounts.as_ref(), user.id, Pool::Salary, Money::zero()).await;
    }

    #[tokio::test]
    async fn test_failed_balance_write_leaves_no_entry() {
        let harness = TestLedger::new();
        let user = harness.add_user().await;
        harness.accounts.fail_balance_writes(true);

        let err = harness
            .mutator
            .apply_delta(DeltaRequest::new(user.id, Pool::Company, Money::new(dec!(10))))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::BalanceUpdateFailed { .. }));
        assert!(!err.is_inconsistent());
        assert!(harness.ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_append_is_surfaced_and_not_rolled_back() {
        let harness = TestLedger::new();
        let user = harness.add_user().await;
        harness.ledger.fail_appends(true);

        let err = harness
            .mutator
            .apply_delta(DeltaRequest::new(user.id, Pool::Personal, Money::new(dec!(75))))
            .await
            .unwrap_err();

        match err {
            LedgerError::LedgerAppendFailed { delta, new_balance, pool, .. } => {
                assert_eq!(delta, Money::new(dec!(75)));
                assert_eq!(new_balance, Money::new(dec!(75)));
                assert_eq!(pool, Pool::Personal);
            }
            other => panic!("expected LedgerAppendFailed, got {:?}", other),
        }
        assert!(harness.ledger.is_empty().await);
        assert_balance(harness.accounts.as_ref(), user.id, Pool::Personal, Money::new(dec!(75))).await;
    }

    #[tokio::test]
    async fn test_failures_are_not_retried() {
        let harness = TestLedger::new();
        let user = harness.add_user().await;
        harness.ledger.fail_appends(true);
        let _ = harness
            .mutator
            .apply_delta(DeltaRequest::new(user.id, Pool::Personal, Money::new(dec!(5))))
            .await;

        harness.ledger.fail_appends(false);
        // the balance moved exactly once
        assert_balance(harness.accounts.as_ref(), user.id, Pool::Personal, Money::new(dec!(5))).await;
    }
}

// ============================================================================
// Expenses and fund additions
// ============================================================================

mod expense_and_funds_tests {
    use super::*;

    fn submission(amount: Money) -> ExpenseSubmission {
        ExpenseSubmission {
            category: ExpenseCategory::OfficeSupplies,
            description: "stationery".to_string(),
            amount,
            receipt: Some("receipts/abc.jpg".to_string()),
        }
    }

    #[tokio::test]
    async fn test_expense_may_overdraw_company_balance() {
        let harness = TestLedger::new();
        let user = harness.add_user().await;
        harness.seed_balance(user.id, Pool::Company, MoneyFixtures::rupees_50()).await;

        let receipt = harness
            .mutator
            .submit_expense(&user.actor(), submission(MoneyFixtures::rupees_100()))
            .await
            .unwrap();

        assert_eq!(receipt.new_balance, Money::new(dec!(-50.00)));
        assert_eq!(receipt.ledger_entry.amount, Money::new(dec!(-100.00)));
        assert_eq!(receipt.expense.amount, MoneyFixtures::rupees_100());
        assert_eq!(receipt.expense.ledger_entry_id, receipt.ledger_entry.id);
        assert_eq!(receipt.expense.receipt.as_deref(), Some("receipts/abc.jpg"));
        assert_balance(harness.accounts.as_ref(), user.id, Pool::Company, Money::new(dec!(-50.00))).await;
    }

    #[tokio::test]
    async fn test_expense_requires_positive_amount() {
        let harness = TestLedger::new();
        let user = harness.add_user().await;

        for amount in [Money::zero(), Money::new(dec!(-5))] {
            let err = harness
                .mutator
                .submit_expense(&user.actor(), submission(amount))
                .await
                .unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)));
        }
        assert!(harness.ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_expense_requires_description() {
        let harness = TestLedger::new();
        let user = harness.add_user().await;
        let mut input = submission(MoneyFixtures::rupees_50());
        input.description = "   ".to_string();

        let err = harness.mutator.submit_expense(&user.actor(), input).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_salary_credit_needs_period() {
        let harness = TestLedger::new();
        let admin = harness.add_admin().await;
        let user = harness.add_user().await;

        let mut addition = FundAddition {
            account_id: user.id,
            pool: Pool::Salary,
            amount: MoneyFixtures::salary(),
            description: None,
            period: None,
        };
        let err = harness
            .mutator
            .add_funds(&admin.actor(), addition.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        addition.period = Some(TemporalFixtures::salary_period());
        let applied = harness.mutator.add_funds(&admin.actor(), addition).await.unwrap();
        assert_eq!(applied.entry.period, Some(SalaryPeriod::new(2024, 3).unwrap()));
        assert_balance(harness.accounts.as_ref(), user.id, Pool::Salary, MoneyFixtures::salary()).await;
    }

    #[tokio::test]
    async fn test_only_admins_add_funds() {
        let harness = TestLedger::new();
        let user = harness.add_user().await;

        let err = harness
            .mutator
            .add_funds(
                &user.actor(),
                FundAddition {
                    account_id: user.id,
                    pool: Pool::Personal,
                    amount: MoneyFixtures::rupees_100(),
                    description: None,
                    period: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden(_)));
        assert!(harness.ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_fund_amount_must_be_positive() {
        let harness = TestLedger::new();
        let admin = harness.add_admin().await;

        let err = harness
            .mutator
            .add_funds(
                &admin.actor(),
                FundAddition {
                    account_id: admin.id,
                    pool: Pool::Company,
                    amount: Money::new(dec!(-1)),
                    description: None,
                    period: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn test_amounts_above_entry_limit_are_rejected() {
        let harness = TestLedger::new();
        let admin = harness.add_admin().await;
        let user = harness.add_user().await;
        let too_large = Money::max_entry() + Money::from_minor(1);

        for amount in [too_large, Money::new(dec!(40000000000000000000000000000))] {
            let err = harness
                .mutator
                .submit_expense(&user.actor(), submission(amount))
                .await
                .unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)));
        }

        let err = harness
            .mutator
            .add_funds(
                &admin.actor(),
                FundAddition {
                    account_id: user.id,
                    pool: Pool::Company,
                    amount: too_large,
                    description: None,
                    period: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(harness.ledger.is_empty().await);

        harness
            .mutator
            .submit_expense(&user.actor(), submission(Money::max_entry()))
            .await
            .unwrap();
        let summary = harness.expenses.summary(None).await.unwrap();
        assert_eq!(summary.total, Money::max_entry());
    }
}

// ============================================================================
// Concurrency
// ============================================================================

mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deltas_on_shared_mutator_are_not_lost() {
        let harness = TestLedger::from_stores(
            MemoryAccountStore::new().with_read_latency(StdDuration::from_millis(5)),
            LedgerConfig::default(),
        );
        let user = harness.add_user().await;

        let a = harness.mutator.clone();
        let b = harness.mutator.clone();
        let id = user.id;
        let first = tokio::spawn(async move {
            a.apply_delta(DeltaRequest::new(id, Pool::Company, Money::new(dec!(10)))).await
        });
        let second = tokio::spawn(async move {
            b.apply_delta(DeltaRequest::new(id, Pool::Company, Money::new(dec!(20)))).await
        });
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(harness.balance(user.id, Pool::Company).await, Money::new(dec!(30)));
        assert_eq!(harness.ledger.len().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_deltas_from_independent_writers_use_cas() {
        let harness = TestLedger::from_stores(
            MemoryAccountStore::new().with_read_latency(StdDuration::from_millis(5)),
            LedgerConfig::default(),
        );
        let user = harness.add_user().await;

        let a = harness.mutator.clone();
        let b = harness.independent_mutator();
        let id = user.id;
        let (r1, r2) = tokio::join!(
            a.apply_delta(DeltaRequest::new(id, Pool::Company, Money::new(dec!(10)))),
            b.apply_delta(DeltaRequest::new(id, Pool::Company, Money::new(dec!(20)))),
        );
        r1.unwrap();
        r2.unwrap();

        assert_eq!(harness.balance(user.id, Pool::Company).await, Money::new(dec!(30)));
        assert_eq!(harness.ledger.len().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_concurrent_expenses_sum_exactly() {
        let harness = TestLedger::new();
        let user = harness.add_user().await;

        let mut tasks = Vec::new();
        for _ in 0..20 {
            let mutator = harness.mutator.clone();
            let actor = user.actor();
            tasks.push(tokio::spawn(async move {
                mutator
                    .submit_expense(
                        &actor,
                        ExpenseSubmission {
                            category: ExpenseCategory::Meals,
                            description: "tea".to_string(),
                            amount: Money::new(dec!(12.25)),
                            receipt: None,
                        },
                    )
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(harness.balance(user.id, Pool::Company).await, Money::new(dec!(-245.00)));
        assert_eq!(harness.ledger.len().await, 20);
    }
}

// ============================================================================
// Listing
// ============================================================================

mod listing_tests {
    use super::*;

    #[tokio::test]
    async fn test_exact_date_filter() {
        let harness = TestLedger::new();
        let owner = AccountId::new();
        let times = [
            TemporalFixtures::day_before(),
            TemporalFixtures::filter_day_start(),
            TemporalFixtures::filter_day_noon(),
            TemporalFixtures::filter_day_last_second(),
            TemporalFixtures::day_after(),
        ];
        for at in times {
            harness
                .ledger
                .append_entry(TestLedgerEntryBuilder::new().with_account(owner, "Isha").created_at(at).build())
                .await
                .unwrap();
        }

        let filter = LedgerFilter::new().on_date(TemporalFixtures::filter_day());
        let page = harness
            .queries
            .list_transactions(&filter, PageRequest::new(1, 25).unwrap())
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert!(page
            .items
            .iter()
            .all(|e| e.created_at.date_naive() == NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()));
        assert_entries_newest_first(&page.items);
    }

    #[tokio::test]
    async fn test_second_page_of_twenty_five() {
        let harness = TestLedger::new();
        let owner = AccountId::new();
        let base = TemporalFixtures::filter_day_start();
        for i in 1..=25i64 {
            harness
                .ledger
                .append_entry(
                    TestLedgerEntryBuilder::new()
                        .with_account(owner, "Jaya")
                        .with_amount(Money::from_minor(i * 100))
                        .created_at(base + Duration::minutes(i))
                        .build(),
                )
                .await
                .unwrap();
        }

        let page = harness
            .queries
            .list_transactions(&LedgerFilter::new(), PageRequest::new(2, 10).unwrap())
            .await
            .unwrap();

        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages(), 3);
        // newest first: entries 25..16 on page 1, 15..6 on page 2
        let amounts: Vec<Money> = page.items.iter().map(|e| e.amount).collect();
        let expected: Vec<Money> = (6..=15i64).rev().map(|i| Money::from_minor(i * 100)).collect();
        assert_eq!(amounts, expected);
    }

    #[tokio::test]
    async fn test_text_and_pool_filters() {
        let harness = TestLedger::new();
        let admin = harness.add_admin().await;
        let user = harness.add_account(AccountFixtures::named_user("Kavya Menon")).await;

        harness
            .mutator
            .add_funds(
                &admin.actor(),
                FundAddition {
                    account_id: user.id,
                    pool: Pool::Personal,
                    amount: MoneyFixtures::rupees_100(),
                    description: Some("Diwali bonus".to_string()),
                    period: None,
                },
            )
            .await
            .unwrap();
        harness.seed_balance(user.id, Pool::Company, MoneyFixtures::rupees_50()).await;

        let by_text = harness
            .queries
            .list_transactions(&LedgerFilter::new().with_text("diwali"), PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(by_text.total, 1);

        let by_name = harness
            .queries
            .list_transactions(&LedgerFilter::new().with_text("MENON"), PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        assert_eq!(by_name.total, 2);

        let by_pool = harness
            .queries
            .list_transactions(
                &LedgerFilter::new().for_account(user.id).with_pool(Pool::Company),
                PageRequest::new(1, 10).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(by_pool.total, 1);
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn balance_after_delta_is_exact(
        start in nonzero_delta_strategy(),
        delta in nonzero_delta_strategy(),
        pool in pool_strategy()
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        runtime.block_on(async {
            let harness = TestLedger::new();
            let user = harness.add_user().await;
            harness.seed_balance(user.id, pool, start).await;

            let mut request = DeltaRequest::new(user.id, pool, delta);
            if pool == Pool::Salary {
                request = request.with_period(TemporalFixtures::salary_period());
            }
            let applied = harness.mutator.apply_delta(request).await.unwrap();

            assert_eq!(applied.new_balance, start + delta);
            assert_eq!(applied.entry.amount, delta);
            assert_eq!(harness.balance(user.id, pool).await, start + delta);
        });
    }
}
