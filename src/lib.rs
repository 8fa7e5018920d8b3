#![doc(test(attr(deny(warnings))))]

//! EV Ledger keeps the income, expense and loan book of an electric vehicle
//! operator, reports it by Bikram Sambat month, and logs vehicle servicing.

pub mod calendar;
pub mod config;
pub mod core;
pub mod currency;
pub mod domain;
pub mod errors;
pub mod report;
pub mod session;
pub mod storage;
pub mod utils;

pub use crate::calendar::{BikramSambat, ForeignCalendar, ForeignDate, GregorianFallback};
pub use crate::config::{Config, ConfigManager};
pub use crate::core::aggregation::{calculate, compute_totals, PeriodScope, Totals};
pub use crate::core::ledger_manager::LedgerManager;
pub use crate::errors::{LedgerError, Result};
pub use crate::session::{CredentialStore, Session};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("EV Ledger tracing initialized.");
    });
}
