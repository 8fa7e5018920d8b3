use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, Utc};

use super::{CalendarError, ForeignCalendar, ForeignDate, DEFAULT_MONTH_NAMES};
use crate::core::time::Clock;

/// Years added to the Gregorian year to approximate the BS year.
pub const DEFAULT_YEAR_OFFSET: i32 = 57;

/// Approximates BS with the host calendar.
///
/// Month and day are the Gregorian ones read in `offset`; the year is shifted
/// by `year_offset`. Month boundaries are therefore off by roughly two weeks
/// compared to real BS. It is only used when the configuration asks for it.
#[derive(Clone)]
pub struct GregorianFallback {
    offset: FixedOffset,
    year_offset: i32,
    clock: Arc<dyn Clock>,
}

impl GregorianFallback {
    pub fn new(offset: FixedOffset, year_offset: i32, clock: Arc<dyn Clock>) -> Self {
        Self {
            offset,
            year_offset,
            clock,
        }
    }

    /// Conversion never fails here, unlike the table-driven calendar.
    pub fn date_of(&self, timestamp: DateTime<Utc>) -> ForeignDate {
        let local = timestamp.with_timezone(&self.offset).date_naive();
        ForeignDate::new(
            local.year() + self.year_offset,
            local.month0() as u8,
            local.day() as u8,
        )
    }

    pub fn current_date(&self) -> ForeignDate {
        self.date_of(self.clock.now())
    }
}

impl ForeignCalendar for GregorianFallback {
    fn to_foreign_date(&self, timestamp: DateTime<Utc>) -> Result<ForeignDate, CalendarError> {
        Ok(self.date_of(timestamp))
    }

    fn today(&self) -> Result<ForeignDate, CalendarError> {
        Ok(self.current_date())
    }

    fn month_names(&self) -> [&'static str; 12] {
        DEFAULT_MONTH_NAMES
    }

    fn name(&self) -> &'static str {
        "gregorian-fallback"
    }
}
