//! Splits a requested date window into windows the upstream accepts.
//!
//! The upstream rejects feed requests spanning more than `MAX_RANGE_DAYS`.
//! Windows are cut every `CHUNK_STEP_DAYS` days starting at the requested
//! start date, and the last window is clamped to the requested end date:
//!
//! ```text
//! 2024-01-01 ..= 2024-01-10
//!   ├─ 2024-01-01 ..= 2024-01-06
//!   └─ 2024-01-07 ..= 2024-01-10
//! ```

use chrono::{Days, NaiveDate};
use std::fmt;

/// Widest window, in days counted inclusively, that one upstream call accepts
pub const MAX_RANGE_DAYS: i64 = 7;

/// Distance between the start dates of consecutive windows
pub const CHUNK_STEP_DAYS: u64 = 6;

/// Inclusive range of calendar dates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Number of days covered, counting both ends. Zero or negative when
    /// `end` is before `start`.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("start date {start} is after end date {end}")]
pub struct InvalidRangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Splits `[start, end]` into contiguous, non-overlapping windows.
///
/// The windows are returned in date order and together cover exactly the
/// requested range.
pub fn chunk(start: NaiveDate, end: NaiveDate) -> Result<Vec<DateRange>, InvalidRangeError> {
    if start > end {
        return Err(InvalidRangeError { start, end });
    }

    let mut ranges = Vec::new();
    let mut cursor = start;

    loop {
        let chunk_end = cursor
            .checked_add_days(Days::new(CHUNK_STEP_DAYS - 1))
            .map_or(end, |d| d.min(end));

        ranges.push(DateRange {
            start: cursor,
            end: chunk_end,
        });

        if chunk_end == end {
            break;
        }

        // chunk_end < end, so there is always a next day
        let Some(next) = chunk_end.succ_opt() else {
            break;
        };
        cursor = next;
    }

    Ok(ranges)
}
