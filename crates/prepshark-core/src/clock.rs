//! Project calendar.
//!
//! Practice days are calendar dates in a single fixed timezone. Callers pass
//! the current instant in explicitly; this module never reads the wall clock.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};

use crate::error::ValidationError;

/// Minutes east of UTC for Indian Standard Time.
pub const IST_OFFSET_MINUTES: i32 = 330;

/// Converts instants into practice dates for a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PracticeClock {
    offset: FixedOffset,
}

impl PracticeClock {
    /// Build a clock from an offset in minutes east of UTC.
    ///
    /// # Errors
    /// Returns an error if the offset is not strictly within +/- 24 hours.
    pub fn from_offset_minutes(minutes: i32) -> Result<Self, ValidationError> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "utc_offset_minutes".into(),
                message: format!("{minutes} is out of range"),
            })?;
        Ok(Self { offset })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The practice date containing `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }
}

impl Default for PracticeClock {
    fn default() -> Self {
        let offset = FixedOffset::east_opt(IST_OFFSET_MINUTES * 60).unwrap_or_else(|| Utc.fix());
        Self { offset }
    }
}

/// Integer seed for a date, formatted as YYYYMMDD.
pub fn date_seed(date: NaiveDate) -> u64 {
    let year = u64::try_from(date.year()).unwrap_or(0);
    year * 10_000 + u64::from(date.month()) * 100 + u64::from(date.day())
}
