use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::DateError;

/// First year served. Readings before the post-conciliar lectionary are not published upstream.
pub const EARLIEST_SUPPORTED_YEAR: i32 = 1970;

/// Last year served.
pub const LATEST_SUPPORTED_YEAR: i32 = 2099;

/// A validated calendar date identifying a liturgical day.
///
/// This is the lookup key of the readings cache: two `MassDate`s are equal
/// iff they denote the same calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "NaiveDate", into = "NaiveDate")]
pub struct MassDate(NaiveDate);

impl MassDate {
    /// Wraps a date, rejecting years outside the supported range.
    pub fn new(date: NaiveDate) -> Result<Self, DateError> {
        if !(EARLIEST_SUPPORTED_YEAR..=LATEST_SUPPORTED_YEAR).contains(&date.year()) {
            return Err(DateError::OutOfRange(date.to_string()));
        }
        Ok(Self(date))
    }

    /// Parses a `YYYY-MM-DD` string.
    ///
    /// # Examples
    ///
    /// ```
    /// use massreadings_core::mass::MassDate;
    ///
    /// assert!(MassDate::parse("2025-02-27").is_ok());
    /// assert!(MassDate::parse("2025-02-30").is_err());
    /// assert!(MassDate::parse("1850-01-01").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, DateError> {
        let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .map_err(|_| DateError::Malformed(input.to_string()))?;
        Self::new(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Days since 0001-01-01, used to spread dates across cache shards.
    pub fn ordinal(&self) -> i32 {
        self.0.num_days_from_ce()
    }

    /// The `MMDDYY` slug USCCB uses in its daily readings URLs.
    pub fn usccb_slug(&self) -> String {
        self.0.format("%m%d%y").to_string()
    }
}

impl fmt::Display for MassDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for MassDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<NaiveDate> for MassDate {
    type Error = DateError;

    fn try_from(date: NaiveDate) -> Result<Self, Self::Error> {
        Self::new(date)
    }
}

impl From<MassDate> for NaiveDate {
    fn from(date: MassDate) -> Self {
        date.0
    }
}
