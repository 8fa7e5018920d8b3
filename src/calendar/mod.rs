//! Conversion from stored Gregorian instants into the Bikram Sambat calendar
//! used for reporting.
//!
//! The engine never talks to a concrete converter. It receives a
//! [`ForeignCalendar`] and callers choose between [`BikramSambat`] and the
//! explicit [`GregorianFallback`], usually through [`from_config`].

pub mod bikram_sambat;
pub mod fallback;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CalendarKind, Config};
use crate::core::time::Clock;

pub use bikram_sambat::BikramSambat;
pub use fallback::GregorianFallback;

/// Month names used when a calendar has none of its own.
pub const DEFAULT_MONTH_NAMES: [&str; 12] = [
    "Baisakh", "Jestha", "Asar", "Shrawan", "Bhadra", "Aswin", "Kartik", "Mangsir", "Poush",
    "Magh", "Falgun", "Chaitra",
];

/// Nepal Standard Time, UTC+05:45.
pub const NEPAL_UTC_OFFSET_MINUTES: i32 = 345;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("date {0} is outside the supported calendar range")]
    OutOfRange(String),
    #[error("invalid calendar date {year}-{month}-{day}")]
    InvalidDate { year: i32, month: u8, day: u8 },
    #[error("invalid UTC offset of {0} minutes")]
    InvalidOffset(i32),
}

/// A date in the foreign calendar. `month` is zero-based, `day` is one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ForeignDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl ForeignDate {
    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }

    /// Renders `MMMM D, YYYY`, e.g. `Baisakh 1, 2081`.
    pub fn format(&self, month_names: &[&str; 12]) -> String {
        let name = month_names
            .get(self.month as usize)
            .copied()
            .unwrap_or("?");
        format!("{} {}, {}", name, self.day, self.year)
    }
}

impl fmt::Display for ForeignDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month + 1, self.day)
    }
}

/// Capability the engine and report layer need from a calendar.
pub trait ForeignCalendar: Send + Sync {
    fn to_foreign_date(&self, timestamp: DateTime<Utc>) -> Result<ForeignDate, CalendarError>;

    fn today(&self) -> Result<ForeignDate, CalendarError>;

    fn month_names(&self) -> [&'static str; 12];

    /// Short human name used in logs.
    fn name(&self) -> &'static str;
}

pub(crate) fn fixed_offset(minutes: i32) -> Result<FixedOffset, CalendarError> {
    FixedOffset::east_opt(minutes * 60).ok_or(CalendarError::InvalidOffset(minutes))
}

/// Builds the calendar selected in `config`, reading time from `clock`.
pub fn from_config(
    config: &Config,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn ForeignCalendar>, CalendarError> {
    let offset = fixed_offset(config.utc_offset_minutes)?;
    let calendar: Arc<dyn ForeignCalendar> = match config.calendar {
        CalendarKind::BikramSambat => Arc::new(BikramSambat::new(offset, clock)),
        CalendarKind::GregorianFallback => Arc::new(GregorianFallback::new(
            offset,
            config.fallback_year_offset,
            clock,
        )),
    };
    tracing::debug!(calendar = calendar.name(), "calendar selected");
    Ok(calendar)
}

/// The Gregorian fallback configured in `config`, used when the selected
/// calendar cannot place today's date.
pub fn fallback_from_config(
    config: &Config,
    clock: Arc<dyn Clock>,
) -> Result<GregorianFallback, CalendarError> {
    let offset = fixed_offset(config.utc_offset_minutes)?;
    Ok(GregorianFallback::new(
        offset,
        config.fallback_year_offset,
        clock,
    ))
}
