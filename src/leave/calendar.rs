use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::leave::error::{LeaveError, Result};

/// Number of calendar days covered by `start..=end`.
pub fn inclusive_day_count(start: NaiveDate, end: NaiveDate) -> Result<u32> {
    if end < start {
        return Err(LeaveError::InvalidRange { start, end });
    }
    let days = (end - start).num_days() + 1;
    u32::try_from(days).map_err(|_| LeaveError::InvalidRange { start, end })
}

pub fn is_within_current_year(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year()
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
