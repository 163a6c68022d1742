//! Fiscal quarter identifiers
//!
//! A [`QuarterId`] is a `(year, quarter)` pair with the canonical label
//! `"{year}Q{quarter}"`. Report dates are mapped to quarters with a one-quarter
//! look-back: results for Q4 are published in January/February of the
//! following year, so months 1-2 belong to the previous year's Q4.

use chrono::{Datelike, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

/// Format of `REPORT_DATE` in provider payloads
pub const REPORT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static QUARTER_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})Q([1-4])$").expect("quarter label regex is valid"));

/// Calendar quarter of a fiscal report, ordered by (year, quarter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct QuarterId {
    year: i32,
    quarter: u8,
}

impl QuarterId {
    pub fn new(year: i32, quarter: u8) -> Result<Self, AnalysisError> {
        if !(1..=4).contains(&quarter) {
            return Err(AnalysisError::InvalidParameter(format!(
                "quarter must be in 1..=4, got {}",
                quarter
            )));
        }
        Ok(Self { year, quarter })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Canonical label, e.g. `2023Q1`
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Parse a canonical label produced by [`QuarterId::encode`]
    pub fn decode(label: &str) -> Result<Self, AnalysisError> {
        let caps = QUARTER_LABEL
            .captures(label.trim())
            .ok_or_else(|| AnalysisError::malformed(format!("decode error: {}", label)))?;

        let year = caps[1]
            .parse::<i32>()
            .map_err(|e| AnalysisError::malformed(format!("decode error: {}: {}", label, e)))?;
        let quarter = caps[2]
            .parse::<u8>()
            .map_err(|e| AnalysisError::malformed(format!("decode error: {}: {}", label, e)))?;

        Self::new(year, quarter)
    }

    /// Quarter a report published in `month` of `year` refers to.
    ///
    /// Months 3-5 map to Q1, 6-8 to Q2, 9-11 to Q3, 12 to Q4, and 1-2 to Q4 of
    /// the previous year.
    pub fn from_month(year: i32, month: u32) -> Result<Self, AnalysisError> {
        if !(1..=12).contains(&month) {
            return Err(AnalysisError::InvalidParameter(format!(
                "month must be in 1..=12, got {}",
                month
            )));
        }

        let quarter = (month as i32 - 3).div_euclid(3) + 1;
        if quarter <= 0 {
            return Self::new(year - 1, 4);
        }
        Self::new(year, quarter as u8)
    }

    /// Resolve a provider `REPORT_DATE` (`YYYY-MM-DD HH:MM:SS`)
    pub fn from_report_date(value: &str) -> Result<Self, AnalysisError> {
        let dt = NaiveDateTime::parse_from_str(value.trim(), REPORT_DATE_FORMAT).map_err(|e| {
            AnalysisError::DateParse {
                value: value.to_string(),
                reason: e.to_string(),
            }
        })?;
        Self::from_month(dt.year(), dt.month())
    }

    /// Preceding quarter of the same year; `None` for Q1
    pub fn previous_in_year(&self) -> Option<Self> {
        if self.quarter > 1 {
            Some(Self {
                year: self.year,
                quarter: self.quarter - 1,
            })
        } else {
            None
        }
    }
}

impl fmt::Display for QuarterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for QuarterId {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}
