//! Calendar periods used to key registrations.
//!
//! Periods are explicit `(year, month)` and `(year, quarter)` pairs. Stepping
//! backwards carries across year boundaries, so Q1 minus one quarter is Q4 of
//! the previous year and January minus one month is December.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ── Month names ───────────────────────────────────────────────────────────────

const MONTH_ABBRS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Resolve a three-letter month abbreviation (`jan`, `JAN`, `Jan`) to 1–12.
pub fn parse_month_abbr(abbr: &str) -> Option<u32> {
    if abbr.len() != 3 {
        return None;
    }
    MONTH_ABBRS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(abbr))
        .map(|i| i as u32 + 1)
}

/// Resolve a user-supplied month: a number 1–12, an abbreviation or a full
/// month name (case-insensitive).
pub fn parse_month(value: &str) -> Option<u32> {
    let value = value.trim();
    if let Ok(n) = value.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    parse_month_abbr(value).or_else(|| {
        MONTH_NAMES
            .iter()
            .position(|m| m.eq_ignore_ascii_case(value))
            .map(|i| i as u32 + 1)
    })
}

/// Three-letter abbreviation for month 1–12, `"???"` otherwise.
pub fn month_abbr(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_ABBRS.get(i as usize))
        .copied()
        .unwrap_or("???")
}

/// Full English name for month 1–12, `"Unknown"` otherwise.
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("Unknown")
}

/// Quarter 1–4 containing `month`, i.e. `ceil(month / 3)`.
pub fn quarter_of_month(month: u32) -> u32 {
    month.div_ceil(3)
}

/// Resolve a user-supplied quarter: `1`–`4` or `Q1`–`Q4`.
pub fn parse_quarter(value: &str) -> Option<u32> {
    let value = value.trim();
    let digits = value
        .strip_prefix('Q')
        .or_else(|| value.strip_prefix('q'))
        .unwrap_or(value);
    digits
        .parse::<u32>()
        .ok()
        .filter(|q| (1..=4).contains(q))
}

// ── MonthPeriod ───────────────────────────────────────────────────────────────

/// One calendar month. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthPeriod {
    year: i32,
    month: u32,
}

impl MonthPeriod {
    /// Build a month period, returning `None` when `month` is outside 1–12 or
    /// the year cannot be represented as a calendar date.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The quarter this month belongs to.
    pub fn quarter(&self) -> QuarterPeriod {
        QuarterPeriod {
            year: self.year,
            quarter: quarter_of_month(self.month),
        }
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// The month `n` months earlier, carrying across year boundaries.
    pub fn minus_months(&self, n: u32) -> Self {
        let index = self.year as i64 * 12 + (self.month as i64 - 1) - n as i64;
        Self {
            year: index.div_euclid(12) as i32,
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// The immediately preceding month.
    pub fn previous(&self) -> Self {
        self.minus_months(1)
    }

    /// The same month one year earlier.
    pub fn previous_year(&self) -> Self {
        self.minus_months(12)
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

// ── QuarterPeriod ─────────────────────────────────────────────────────────────

/// One calendar quarter. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuarterPeriod {
    year: i32,
    quarter: u32,
}

impl QuarterPeriod {
    /// Build a quarter period, returning `None` when `quarter` is outside 1–4.
    pub fn new(year: i32, quarter: u32) -> Option<Self> {
        (1..=4)
            .contains(&quarter)
            .then_some(Self { year, quarter })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter(&self) -> u32 {
        self.quarter
    }

    /// The quarter `n` quarters earlier, carrying across year boundaries.
    pub fn minus_quarters(&self, n: u32) -> Self {
        let index = self.year as i64 * 4 + (self.quarter as i64 - 1) - n as i64;
        Self {
            year: index.div_euclid(4) as i32,
            quarter: index.rem_euclid(4) as u32 + 1,
        }
    }

    /// The immediately preceding quarter.
    pub fn previous(&self) -> Self {
        self.minus_quarters(1)
    }

    /// The same quarter one year earlier.
    pub fn previous_year(&self) -> Self {
        self.minus_quarters(4)
    }
}

impl fmt::Display for QuarterPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
