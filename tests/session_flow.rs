mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use common::{draft, noon, setup_test_env};
use ev_ledger::{
    config::Config,
    core::time::FixedClock,
    domain::transaction::{AccountType, TransactionType},
    storage::PersistenceGateway,
    CredentialStore, LedgerError, LedgerManager, Session,
};

#[tokio::test]
async fn register_sign_in_and_keep_books_apart() {
    let (config_manager, store) = setup_test_env();
    let gateway = PersistenceGateway::new(Arc::new(store.clone()));
    let mut credentials = CredentialStore::open(gateway.clone()).await;

    let (session, handle) = credentials.register("Maya", "s3cret").unwrap();
    handle.wait().await;
    assert!(matches!(
        credentials.register("maya", "other"),
        Err(LedgerError::Credential(_))
    ));

    let config = Config::default();
    let clock = Arc::new(FixedClock(noon(2024, 5, 1)));
    let mut manager = LedgerManager::open(gateway.clone(), session, &config, clock)
        .await
        .unwrap();
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let draw = draft("Bank draw", 50_000.0, TransactionType::Income, AccountType::Loan, day);
    manager
        .add_transaction(draw)
        .unwrap()
        .1
        .wait()
        .await;
    assert_eq!(manager.dashboard().totals.loan_balance, 50_000.0);
    assert_eq!(manager.dashboard().totals.net_profit(), 0.0);

    let admin = credentials.login("admin", "password").unwrap();
    manager.switch_session(admin).await;
    assert!(manager.transactions().is_empty());

    // A fresh process sees the registered user and their ledger.
    let reopened = CredentialStore::open(PersistenceGateway::new(Arc::new(store))).await;
    assert_eq!(reopened.usernames(), vec!["admin", "Maya"]);
    let maya = reopened.login("Maya", "s3cret").unwrap();
    assert!(reopened.login("maya", "s3cret").is_err());
    manager.switch_session(maya).await;
    assert_eq!(manager.transactions().len(), 1);
    assert!(config_manager.data_dir().join("users.json").exists());
}

#[tokio::test]
async fn monthly_report_through_manager() {
    let (_config, store) = setup_test_env();
    let gateway = PersistenceGateway::new(Arc::new(store));
    let clock = Arc::new(FixedClock(noon(2024, 5, 20)));
    let mut manager = LedgerManager::open(
        gateway,
        Session::signed_in("ravi"),
        &Config::default(),
        clock,
    )
    .await
    .unwrap();

    let baisakh = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let jestha = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
    let fare = draft("Fare", 800.0, TransactionType::Income, AccountType::Cash, baisakh);
    let tyres = draft("Tyres", 1200.0, TransactionType::Expense, AccountType::Cash, jestha);
    manager.add_transaction(fare).unwrap();
    manager.add_transaction(tyres).unwrap();

    let current = manager.default_scope();
    assert_eq!((current.month(), current.year()), (1, 2081));
    let report = manager.monthly_report(current);
    assert_eq!(report.title, "Summary for Jestha 2081");
    assert_eq!(report.totals.total_expenses, 1200.0);
    assert!(report.render().contains("Net Loss"));
    assert!(report.render().contains("No income transactions."));

    let dashboard = manager.dashboard();
    assert_eq!(dashboard.totals.cash_balance, -400.0);
    assert_eq!(dashboard.recent[0].description, "Tyres");
}
