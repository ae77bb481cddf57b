//! Calendar dates as seen by a journaling user.

use crate::error::{JournalError, JournalResult};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A calendar day, always rendered as `YYYY-MM-DD`.
///
/// Seeds are built from this string form, so a timestamp must never reach
/// resolution: parsing rejects anything but the bare ISO date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JournalDate(NaiveDate);

impl JournalDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    /// The calendar day at `instant` for a user `offset_minutes` east of UTC.
    pub fn at_offset(instant: DateTime<Utc>, offset_minutes: i32) -> Self {
        let local = instant.naive_utc() + Duration::minutes(offset_minutes as i64);
        Self(local.date())
    }

    /// Today for a user `offset_minutes` east of UTC.
    pub fn today(offset_minutes: i32) -> Self {
        Self::at_offset(Utc::now(), offset_minutes)
    }
}

impl FromStr for JournalDate {
    type Err = JournalError;

    fn from_str(s: &str) -> JournalResult<Self> {
        let invalid = || JournalError::InvalidDate { input: s.to_string() };
        // Digits everywhere but the two dashes: chrono alone accepts
        // "2024-6-1", "2024-06- 1" and "+024-06-01".
        let shape_ok = s.len() == 10
            && s.bytes().enumerate().all(|(i, b)| match i {
                4 | 7 => b == b'-',
                _ => b.is_ascii_digit(),
            });
        if !shape_ok {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| invalid())
    }
}

impl TryFrom<String> for JournalDate {
    type Error = JournalError;

    fn try_from(value: String) -> JournalResult<Self> {
        value.parse()
    }
}

impl From<JournalDate> for String {
    fn from(date: JournalDate) -> Self {
        date.to_string()
    }
}

impl fmt::Display for JournalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
