//! Calendar date fixed once per run.

use std::fmt;

use chrono::{Local, NaiveDate};

use crate::error::{AcquireError, AcquireResult};

/// Date that namespaces every output directory and file of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunDate(NaiveDate);

impl RunDate {
    /// Today's local date.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// Parse a `YYYY-MM-DD` string.
    pub fn parse(s: &str) -> AcquireResult<Self> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|e| AcquireError::InvalidDate(format!("{}: {}", s, e)))
    }
}

impl From<NaiveDate> for RunDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for RunDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
