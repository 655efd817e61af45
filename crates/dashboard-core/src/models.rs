use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{MonthPeriod, QuarterPeriod};
use crate::error::DashboardError;

// ── Category ──────────────────────────────────────────────────────────────────

/// Vehicle class a registration count belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Two-wheelers (motorcycles, scooters).
    #[serde(rename = "2W")]
    TwoWheeler,
    /// Three-wheelers (auto-rickshaws, cargo three-wheelers).
    #[serde(rename = "3W")]
    ThreeWheeler,
    /// Four-wheelers (cars, light commercial vehicles).
    #[serde(rename = "4W")]
    FourWheeler,
}

impl Category {
    /// Every supported category, in column order.
    pub const ALL: [Category; 3] = [
        Category::TwoWheeler,
        Category::ThreeWheeler,
        Category::FourWheeler,
    ];

    /// Column header / display label, e.g. `"2W"`.
    pub fn label(&self) -> &'static str {
        match self {
            Category::TwoWheeler => "2W",
            Category::ThreeWheeler => "3W",
            Category::FourWheeler => "4W",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| DashboardError::Config(format!("unknown vehicle category `{}`", s)))
    }
}

// ── RawFile ───────────────────────────────────────────────────────────────────

/// A discovered input file whose name and folder agree on the period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    /// Location of the CSV file.
    pub path: PathBuf,
    /// Year parsed from the filename.
    pub year: i32,
    /// Month (1–12) parsed from the filename's abbreviation.
    pub month: u32,
    /// Name of the containing directory; always equal to the filename year text.
    pub folder_year: String,
}

impl RawFile {
    /// The calendar month this file reports on.
    pub fn period(&self) -> Option<MonthPeriod> {
        MonthPeriod::new(self.year, self.month)
    }
}

// ── RegistrationRow ───────────────────────────────────────────────────────────

/// Per-category counts as they appear in one wide CSV row.
///
/// Values are kept signed: negative or zero counts are legal input and are
/// dropped during normalization rather than at parse time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub two_wheeler: i64,
    pub three_wheeler: i64,
    pub four_wheeler: i64,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> i64 {
        match category {
            Category::TwoWheeler => self.two_wheeler,
            Category::ThreeWheeler => self.three_wheeler,
            Category::FourWheeler => self.four_wheeler,
        }
    }

    pub fn set(&mut self, category: Category, value: i64) {
        match category {
            Category::TwoWheeler => self.two_wheeler = value,
            Category::ThreeWheeler => self.three_wheeler = value,
            Category::FourWheeler => self.four_wheeler = value,
        }
    }

    /// Add another row's counts into this one.
    ///
    /// Zero and negative cells on either side mean "no activity" and count
    /// as zero, so one row can never cancel out another.
    pub fn merge(&mut self, other: &CategoryCounts) {
        for category in Category::ALL {
            let sum = self
                .get(category)
                .max(0)
                .saturating_add(other.get(category).max(0));
            self.set(category, sum);
        }
    }
}

/// One manufacturer's wide-format row from a single monthly file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRow {
    /// Manufacturer name, trimmed and non-empty.
    pub manufacturer: String,
    /// Registration counts per category.
    pub counts: CategoryCounts,
    /// Year of the source file.
    pub year: i32,
    /// Month (1–12) of the source file.
    pub month: u32,
}

// ── NormalizedRecord ──────────────────────────────────────────────────────────

/// Canonical long-form unit: one manufacturer, one category, one month.
///
/// `registrations` is always strictly positive; the normalizer never emits a
/// record for a zero or negative count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub manufacturer: String,
    pub category: Category,
    pub period: MonthPeriod,
    pub registrations: u64,
    /// First day of `period`.
    pub date: NaiveDate,
    /// Quarter containing `period`.
    pub quarter: QuarterPeriod,
}

impl NormalizedRecord {
    /// Build a record, returning `None` for non-positive counts.
    pub fn new(
        manufacturer: impl Into<String>,
        category: Category,
        period: MonthPeriod,
        registrations: i64,
    ) -> Option<Self> {
        if registrations <= 0 {
            return None;
        }
        Some(Self {
            manufacturer: manufacturer.into(),
            category,
            period,
            registrations: registrations as u64,
            date: period.first_day(),
            quarter: period.quarter(),
        })
    }

    pub fn year(&self) -> i32 {
        self.period.year()
    }

    pub fn month(&self) -> u32 {
        self.period.month()
    }

    /// Numeric quarter 1–4.
    pub fn quarter_number(&self) -> u32 {
        self.quarter.quarter()
    }
}

// ── FilterSpec ────────────────────────────────────────────────────────────────

/// Time granularity a query is evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Trend across the whole selected year range.
    #[default]
    Overall,
    /// One quarter at a time.
    Quarterly,
    /// One month at a time.
    Monthly,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Granularity::Overall => "overall",
            Granularity::Quarterly => "quarterly",
            Granularity::Monthly => "monthly",
        })
    }
}

/// Immutable description of one dashboard query.
///
/// `categories` and `manufacturers` are `None` for "no restriction"; an
/// empty set matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Inclusive lower bound of the year range.
    pub year_from: i32,
    /// Inclusive upper bound of the year range.
    pub year_to: i32,
    pub granularity: Granularity,
    /// Pins the query to one year; narrows the range when set.
    pub year: Option<i32>,
    /// Pins a month (1–12) when granularity is monthly.
    pub month: Option<u32>,
    /// Pins a quarter (1–4) when granularity is quarterly.
    pub quarter: Option<u32>,
    pub categories: Option<BTreeSet<Category>>,
    pub manufacturers: Option<BTreeSet<String>>,
}

impl FilterSpec {
    /// Overall trend across `year_from..=year_to`.
    pub fn overall(year_from: i32, year_to: i32) -> Self {
        Self {
            year_from,
            year_to,
            granularity: Granularity::Overall,
            year: None,
            month: None,
            quarter: None,
            categories: None,
            manufacturers: None,
        }
    }

    /// A single month.
    pub fn monthly(year: i32, month: u32) -> Self {
        Self {
            granularity: Granularity::Monthly,
            year: Some(year),
            month: Some(month),
            ..Self::overall(year, year)
        }
    }

    /// A single quarter.
    pub fn quarterly(year: i32, quarter: u32) -> Self {
        Self {
            granularity: Granularity::Quarterly,
            year: Some(year),
            quarter: Some(quarter),
            ..Self::overall(year, year)
        }
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = Some(categories.into_iter().collect());
        self
    }

    pub fn with_manufacturers<S: Into<String>>(
        mut self,
        manufacturers: impl IntoIterator<Item = S>,
    ) -> Self {
        self.manufacturers = Some(manufacturers.into_iter().map(Into::into).collect());
        self
    }

    /// Check ranges and that pinned fields agree with the granularity.
    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.year_from > self.year_to {
            return Err(DashboardError::InvalidFilter(format!(
                "year range {}..{} is reversed",
                self.year_from, self.year_to
            )));
        }
        if let Some(m) = self.month {
            if !(1..=12).contains(&m) {
                return Err(DashboardError::InvalidFilter(format!(
                    "month {} is out of range",
                    m
                )));
            }
            if self.granularity != Granularity::Monthly {
                return Err(DashboardError::InvalidFilter(
                    "a month can only be pinned with monthly granularity".to_string(),
                ));
            }
        }
        if let Some(q) = self.quarter {
            if !(1..=4).contains(&q) {
                return Err(DashboardError::InvalidFilter(format!(
                    "quarter {} is out of range",
                    q
                )));
            }
            if self.granularity != Granularity::Quarterly {
                return Err(DashboardError::InvalidFilter(
                    "a quarter can only be pinned with quarterly granularity".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Inclusive year bounds after applying a pinned year.
    pub fn effective_years(&self) -> (i32, i32) {
        match self.year {
            Some(y) => (y, y),
            None => (self.year_from, self.year_to),
        }
    }

    /// Category and manufacturer selection only, ignoring every time bound.
    pub fn matches_selection(&self, record: &NormalizedRecord) -> bool {
        let category_ok = self
            .categories
            .as_ref()
            .map_or(true, |set| set.contains(&record.category));
        let maker_ok = self
            .manufacturers
            .as_ref()
            .map_or(true, |set| set.contains(&record.manufacturer));
        category_ok && maker_ok
    }

    /// Full predicate: year range, pinned month/quarter and selection.
    pub fn matches(&self, record: &NormalizedRecord) -> bool {
        let (from, to) = self.effective_years();
        if record.year() < from || record.year() > to {
            return false;
        }
        match self.granularity {
            Granularity::Monthly => {
                if self.month.is_some_and(|m| m != record.month()) {
                    return false;
                }
            }
            Granularity::Quarterly => {
                if self.quarter.is_some_and(|q| q != record.quarter_number()) {
                    return false;
                }
            }
            Granularity::Overall => {}
        }
        self.matches_selection(record)
    }

    /// The month this spec pins down completely, if any.
    pub fn pinned_month(&self) -> Option<MonthPeriod> {
        match (self.granularity, self.year, self.month) {
            (Granularity::Monthly, Some(y), Some(m)) => MonthPeriod::new(y, m),
            _ => None,
        }
    }

    /// The quarter this spec pins down completely, if any.
    pub fn pinned_quarter(&self) -> Option<QuarterPeriod> {
        match (self.granularity, self.year, self.quarter) {
            (Granularity::Quarterly, Some(y), Some(q)) => QuarterPeriod::new(y, q),
            _ => None,
        }
    }
}

// ── Query results ─────────────────────────────────────────────────────────────

/// The period a growth figure is anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnchorPeriod {
    Month(MonthPeriod),
    Quarter(QuarterPeriod),
}

impl fmt::Display for AnchorPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorPeriod::Month(m) => write!(f, "{}", m),
            AnchorPeriod::Quarter(q) => write!(f, "{}", q),
        }
    }
}

/// Period-over-period growth for one query.
///
/// Growth percentages are `0.0` whenever the comparison total is zero; this
/// is a display simplification, not a true growth rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthResult {
    pub granularity: Granularity,
    /// Period the current/prior comparison is anchored on.
    pub period: AnchorPeriod,
    /// Registrations in the anchor period.
    pub current: u64,
    /// Registrations one unit (month or quarter) earlier.
    pub prior_period: u64,
    /// Registrations in the same period one year earlier.
    pub prior_year: u64,
    /// MoM (monthly) or QoQ (quarterly / overall) growth.
    pub period_growth_pct: f64,
    pub yoy_growth_pct: f64,
    /// Registrations across the whole filtered subset.
    pub range_total: u64,
}

/// A manufacturer with its summed registrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerTotal {
    pub manufacturer: String,
    pub total: u64,
}

/// A manufacturer's slice of the subset total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketShare {
    pub manufacturer: String,
    pub total: u64,
    pub share_pct: f64,
}

/// Summed registrations for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: u64,
}

/// Summed registrations for one month of the trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub total: u64,
}

/// One row of the year-over-year quarter ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoyRankingRow {
    pub manufacturer: String,
    /// Registrations in the same quarter one year earlier.
    pub previous: u64,
    /// Registrations in the ranked quarter.
    pub current: u64,
    pub growth_pct: f64,
}

/// Which manufacturers the YoY ranking covers and how it is ordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankingMode {
    /// Every manufacturer in either quarter, fastest growing first.
    TopGrowth,
    /// Only the given manufacturers, in name order.
    Selected(BTreeSet<String>),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
