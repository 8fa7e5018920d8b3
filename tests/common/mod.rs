#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use ev_ledger::{
    calendar::{BikramSambat, NEPAL_UTC_OFFSET_MINUTES},
    config::{Config, ConfigManager},
    core::time::FixedClock,
    domain::transaction::{AccountType, Transaction, TransactionDraft, TransactionType},
    storage::{JsonFileStore, PersistenceGateway},
    LedgerManager, Session,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh application directory with its config manager and JSON store.
pub fn setup_test_env() -> (ConfigManager, JsonFileStore) {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);

    let config_manager =
        ConfigManager::with_base_dir(base).expect("create config manager for temp dir");
    let store = JsonFileStore::new(config_manager.data_dir()).expect("create json store");
    (config_manager, store)
}

pub fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 6, 15, 0).unwrap()
}

pub fn nepal_offset() -> FixedOffset {
    FixedOffset::east_opt(NEPAL_UTC_OFFSET_MINUTES * 60).unwrap()
}

pub fn nepal_calendar(now: DateTime<Utc>) -> BikramSambat {
    BikramSambat::new(nepal_offset(), Arc::new(FixedClock(now)))
}

pub fn txn(
    account: AccountType,
    kind: TransactionType,
    amount: f64,
    date: DateTime<Utc>,
) -> Transaction {
    Transaction::new("entry", amount, kind, account, date)
}

pub fn draft(
    description: &str,
    amount: f64,
    kind: TransactionType,
    account: AccountType,
    date: NaiveDate,
) -> TransactionDraft {
    TransactionDraft {
        description: description.into(),
        amount,
        kind,
        account,
        date,
    }
}

/// Opens a manager for `user` over `store` with no artificial latency.
pub async fn open_manager(store: JsonFileStore, user: &str, now: DateTime<Utc>) -> LedgerManager {
    let gateway = PersistenceGateway::new(Arc::new(store));
    LedgerManager::open(
        gateway,
        Session::signed_in(user),
        &Config::default(),
        Arc::new(FixedClock(now)),
    )
    .await
    .expect("open ledger manager")
}
