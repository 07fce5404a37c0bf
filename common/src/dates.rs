//! Month-granular calendar values rendered as `MM-YYYY`.
//!
//! A [`MonthYear`] always points at the first day of its month; day of month
//! and time of day are discarded on parse.

use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("invalid date format, expected MM-YYYY")]
    InvalidFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, sqlx::Type)]
#[sqlx(transparent)]
pub struct MonthYear(NaiveDate);

impl MonthYear {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(MonthYear)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Inclusive number of calendar months from `self` through `end`.
    ///
    /// `01-2024` through `12-2024` is 12; the same month is 1. Returns a
    /// value below 1 when `end` precedes `self`.
    pub fn months_until(&self, end: &MonthYear) -> i64 {
        let years = i64::from(end.year()) - i64::from(self.year());
        let months = i64::from(end.month()) - i64::from(self.month());
        years * 12 + months + 1
    }
}

impl FromStr for MonthYear {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (month, year) = s.split_once('-').ok_or(DateError::InvalidFormat)?;

        // fixed widths reject reversed YYYY-MM input
        if month.len() != 2 || year.len() != 4 {
            return Err(DateError::InvalidFormat);
        }
        if !month.bytes().chain(year.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(DateError::InvalidFormat);
        }

        let month: u32 = month.parse().map_err(|_| DateError::InvalidFormat)?;
        let year: i32 = year.parse().map_err(|_| DateError::InvalidFormat)?;
        if !(1..=12).contains(&month) {
            return Err(DateError::InvalidFormat);
        }

        MonthYear::new(year, month).ok_or(DateError::InvalidFormat)
    }
}

impl fmt::Display for MonthYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:04}", self.month(), self.year())
    }
}

impl Serialize for MonthYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s: String = Deserialize::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
