use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

use super::{CalendarError, ForeignCalendar, ForeignDate, DEFAULT_MONTH_NAMES};
use crate::core::time::Clock;

/// First BS year covered by [`MONTH_LENGTHS`].
const FIRST_YEAR: i32 = 2070;

/// Days per month for each BS year starting at [`FIRST_YEAR`].
const MONTH_LENGTHS: [[u8; 12]; 21] = [
    [31, 31, 31, 32, 31, 31, 29, 30, 30, 29, 30, 30], // 2070
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 31],
    [31, 31, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30], // 2075
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31],
    [31, 31, 31, 32, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 29, 30, 29, 30, 30],
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 29, 30, 30], // 2080
    [31, 32, 31, 32, 31, 30, 30, 30, 29, 30, 29, 31],
    [31, 31, 32, 31, 31, 30, 30, 30, 29, 30, 30, 30],
    [31, 31, 32, 31, 31, 30, 30, 30, 29, 30, 30, 30],
    [31, 31, 32, 31, 31, 30, 30, 30, 29, 30, 30, 30],
    [31, 32, 31, 32, 30, 31, 30, 30, 29, 30, 30, 30], // 2085
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30],
    [31, 31, 32, 31, 31, 31, 30, 30, 29, 30, 30, 30],
    [30, 31, 32, 32, 30, 31, 30, 30, 29, 30, 30, 30],
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30],
    [30, 32, 31, 32, 31, 30, 30, 30, 29, 30, 30, 30], // 2090
];

/// Gregorian date of 1 Baisakh [`FIRST_YEAR`].
fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2013, 4, 14).unwrap_or_default()
}

fn year_lengths(year: i32) -> Option<&'static [u8; 12]> {
    let index = usize::try_from(year - FIRST_YEAR).ok()?;
    MONTH_LENGTHS.get(index)
}

fn days_in_year(lengths: &[u8; 12]) -> i64 {
    lengths.iter().map(|&days| i64::from(days)).sum()
}

/// Table-driven Bikram Sambat converter.
///
/// Instants are read in `offset` (Nepal time by default) before conversion so
/// an entry made late in the evening lands on the local day.
#[derive(Clone)]
pub struct BikramSambat {
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
}

impl BikramSambat {
    pub fn new(offset: FixedOffset, clock: Arc<dyn Clock>) -> Self {
        Self { offset, clock }
    }

    /// Supported BS years, inclusive.
    pub fn supported_years() -> (i32, i32) {
        (FIRST_YEAR, FIRST_YEAR + MONTH_LENGTHS.len() as i32 - 1)
    }

    pub fn days_in_month(year: i32, month: u8) -> Option<u8> {
        year_lengths(year)?.get(month as usize).copied()
    }

    /// Converts a Gregorian calendar day.
    pub fn from_gregorian(date: NaiveDate) -> Result<ForeignDate, CalendarError> {
        let mut remaining = (date - epoch()).num_days();
        if remaining < 0 {
            return Err(CalendarError::OutOfRange(date.to_string()));
        }
        for (year_index, lengths) in MONTH_LENGTHS.iter().enumerate() {
            let year_days = days_in_year(lengths);
            if remaining >= year_days {
                remaining -= year_days;
                continue;
            }
            for (month, &days) in lengths.iter().enumerate() {
                let days = i64::from(days);
                if remaining < days {
                    return Ok(ForeignDate::new(
                        FIRST_YEAR + year_index as i32,
                        month as u8,
                        remaining as u8 + 1,
                    ));
                }
                remaining -= days;
            }
        }
        Err(CalendarError::OutOfRange(date.to_string()))
    }

    /// Converts a BS date back to its Gregorian day.
    pub fn to_gregorian(date: ForeignDate) -> Result<NaiveDate, CalendarError> {
        let invalid = CalendarError::InvalidDate {
            year: date.year,
            month: date.month,
            day: date.day,
        };
        let lengths = year_lengths(date.year).ok_or_else(|| invalid.clone())?;
        let month_days = lengths.get(date.month as usize).ok_or_else(|| invalid.clone())?;
        if date.day == 0 || date.day > *month_days {
            return Err(invalid);
        }
        let leading_years: i64 = MONTH_LENGTHS[..(date.year - FIRST_YEAR) as usize]
            .iter()
            .map(days_in_year)
            .sum();
        let leading_months: i64 = lengths[..date.month as usize]
            .iter()
            .map(|&days| i64::from(days))
            .sum();
        let offset = leading_years + leading_months + i64::from(date.day) - 1;
        Ok(epoch() + Duration::days(offset))
    }
}

impl ForeignCalendar for BikramSambat {
    fn to_foreign_date(&self, timestamp: DateTime<Utc>) -> Result<ForeignDate, CalendarError> {
        let local = timestamp.with_timezone(&self.offset).date_naive();
        Self::from_gregorian(local)
    }

    fn today(&self) -> Result<ForeignDate, CalendarError> {
        self.to_foreign_date(self.clock.now())
    }

    fn month_names(&self) -> [&'static str; 12] {
        DEFAULT_MONTH_NAMES
    }

    fn name(&self) -> &'static str {
        "bikram-sambat"
    }
}
