//! Date range resolution
//!
//! Turns user-facing date arguments (`2017-01-01`, `today`, `yesterday`,
//! signed day or month offsets) into an inclusive pair of calendar dates.
//! Relative tokens resolve against an explicit `today` so the logic stays
//! pure; the builder passes the local current date.

use chrono::{Duration, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_EXPECTED: &str = "a YYYY-MM-DD date, 'today' or 'yesterday'";

/// Local calendar date of the caller.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// A date argument, either absolute or relative to the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateExpr {
    Date(NaiveDate),
    Today,
    Yesterday,
}

impl DateExpr {
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            DateExpr::Date(date) => *date,
            DateExpr::Today => today,
            DateExpr::Yesterday => today - Duration::days(1),
        }
    }
}

impl FromStr for DateExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "today" => Ok(DateExpr::Today),
            "yesterday" => Ok(DateExpr::Yesterday),
            other => NaiveDate::parse_from_str(other, DATE_FORMAT)
                .map(DateExpr::Date)
                .map_err(|_| Error::invalid_argument("date", s, DATE_EXPECTED)),
        }
    }
}

impl From<NaiveDate> for DateExpr {
    fn from(date: NaiveDate) -> Self {
        DateExpr::Date(date)
    }
}

/// Signed distance from an anchor date. The anchor day counts as the first
/// day of the range, so `Days(3)` spans three days and `Days(-7)` spans the
/// seven days ending on the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offset {
    Days(i64),
    Months(i32),
}

/// Inclusive date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange(format!(
                "start {} is after end {}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Two explicit bounds. Fails when the resolved start is after the end.
    pub fn between(start: DateExpr, end: DateExpr, today: NaiveDate) -> Result<Self> {
        Self::new(start.resolve(today), end.resolve(today))
    }

    /// An anchor plus a signed offset. The resolved pair is ordered, so a
    /// negative offset produces a range that ends on the anchor.
    pub fn from_offset(anchor: DateExpr, offset: Offset, today: NaiveDate) -> Result<Self> {
        let anchor = anchor.resolve(today);
        let other = match offset {
            Offset::Days(0) | Offset::Months(0) => Some(anchor),
            Offset::Days(days) => Duration::try_days(days - days.signum())
                .and_then(|delta| anchor.checked_add_signed(delta)),
            Offset::Months(months) => shift_months(anchor, months)
                .and_then(|d| d.checked_add_signed(Duration::days(-i64::from(months.signum())))),
        };

        let other = other.ok_or_else(|| {
            Error::invalid_argument("date offset", format!("{:?}", offset), "an offset within the calendar range")
        })?;

        if other < anchor {
            Ok(Self { start: other, end: anchor })
        } else {
            Ok(Self { start: anchor, end: other })
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

fn shift_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let delta = Months::new(months.unsigned_abs());
    if months >= 0 {
        date.checked_add_months(delta)
    } else {
        date.checked_sub_months(delta)
    }
}
