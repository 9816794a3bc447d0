//! `MM-DD` birthday dates.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::error::BirthdayError;

/// A month and day without a year. February 29 is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BirthdayDate {
    month: u32,
    day: u32,
}

impl BirthdayDate {
    /// Build from a month and day, validated against a leap year.
    pub fn new(month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(2000, month, day).map(|_| Self { month, day })
    }

    /// The birthday falling on `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    /// Month, 1-12.
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Day of month.
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Whether this birthday is celebrated on `date`.
    ///
    /// February 29 birthdays are celebrated on February 28 in common years.
    pub fn falls_on(&self, date: NaiveDate) -> bool {
        if *self == Self::of(date) {
            return true;
        }
        let is_leap_day = self.month == 2 && self.day == 29;
        let common_year = NaiveDate::from_ymd_opt(date.year(), 2, 29).is_none();
        is_leap_day && common_year && date.month() == 2 && date.day() == 28
    }
}

impl FromStr for BirthdayDate {
    type Err = BirthdayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BirthdayError::InvalidDate(s.to_string());
        let (month, day) = s.trim().split_once('-').ok_or_else(invalid)?;
        let parse = |part: &str| -> Option<u32> {
            (!part.is_empty() && part.len() <= 2 && part.bytes().all(|b| b.is_ascii_digit()))
                .then(|| part.parse().ok())
                .flatten()
        };
        match (parse(month), parse(day)) {
            (Some(month), Some(day)) => Self::new(month, day).ok_or_else(invalid),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for BirthdayDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}
