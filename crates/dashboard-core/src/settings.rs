use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::calendar::{parse_month, parse_quarter};
use crate::error::{DashboardError, Result};
use crate::models::{Category, FilterSpec, Granularity, RankingMode};

/// How many manufacturers the dashboard selects when none are given.
pub const DEFAULT_SELECTED_MANUFACTURERS: usize = 10;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Vehicle registration growth dashboard
#[derive(Parser, Debug, Clone)]
#[command(
    name = "registration-dashboard",
    about = "Vehicle registration trends and growth metrics from monthly CSV files",
    version
)]
pub struct Settings {
    /// Root directory holding `<YEAR>/<YEAR>-<MON>.csv` files
    #[arg(long, default_value = ".", env = "DASHBOARD_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Analysis granularity
    #[arg(long, default_value = "overall", value_parser = ["overall", "quarterly", "monthly"])]
    pub granularity: String,

    /// First year of the range (defaults to the earliest year with data)
    #[arg(long)]
    pub from_year: Option<i32>,

    /// Last year of the range (defaults to the latest year with data)
    #[arg(long)]
    pub to_year: Option<i32>,

    /// Year to analyse (monthly/quarterly default: latest year with data)
    #[arg(long)]
    pub year: Option<i32>,

    /// Month for monthly analysis (1-12, `jan`, `January`)
    #[arg(long, value_parser = parse_month_arg)]
    pub month: Option<u32>,

    /// Quarter for quarterly analysis (1-4 or Q1-Q4)
    #[arg(long, value_parser = parse_quarter_arg)]
    pub quarter: Option<u32>,

    /// Vehicle category to include (repeatable; default: all)
    #[arg(long = "category", value_parser = parse_category_arg)]
    pub categories: Vec<Category>,

    /// Manufacturer to include (repeatable; default: top 10 by registrations)
    #[arg(long = "manufacturer")]
    pub manufacturers: Vec<String>,

    /// Include every manufacturer instead of the default top-10 selection
    #[arg(long, conflicts_with = "manufacturers")]
    pub all_manufacturers: bool,

    /// Number of manufacturers shown in rankings
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Category whose market leader is reported
    #[arg(long, value_parser = parse_category_arg)]
    pub leader_category: Option<Category>,

    /// YoY ranking population
    #[arg(long, default_value = "top-growth", value_parser = ["top-growth", "selected"])]
    pub ranking_mode: String,

    /// Write the filtered rows to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Print the snapshot as JSON instead of a text report
    #[arg(long)]
    pub json: bool,

    /// List every file considered during discovery
    #[arg(long)]
    pub show_files: bool,

    /// Logging level
    #[arg(
        long,
        default_value = "INFO",
        env = "DASHBOARD_LOG_LEVEL",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse process arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Settings::try_parse_from(args).map(Self::resolve)
    }

    fn resolve(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The selected granularity.
    pub fn granularity(&self) -> Granularity {
        match self.granularity.as_str() {
            "monthly" => Granularity::Monthly,
            "quarterly" => Granularity::Quarterly,
            _ => Granularity::Overall,
        }
    }

    /// Build the query for this run.
    ///
    /// `available_years` are the years present in the loaded data and
    /// `default_manufacturers` the selection used when none was given.
    pub fn to_filter_spec(
        &self,
        available_years: &[i32],
        default_manufacturers: &[String],
    ) -> Result<FilterSpec> {
        let (min_year, max_year) = match (
            available_years.iter().min(),
            available_years.iter().max(),
        ) {
            (Some(&lo), Some(&hi)) => (lo, hi),
            _ => return Err(DashboardError::Config("no years with data".to_string())),
        };

        let mut spec = match self.granularity() {
            Granularity::Overall => {
                let mut spec = FilterSpec::overall(
                    self.from_year.unwrap_or(min_year),
                    self.to_year.unwrap_or(max_year),
                );
                spec.year = self.year;
                spec
            }
            Granularity::Monthly => {
                let year = self.year.unwrap_or(max_year);
                FilterSpec {
                    granularity: Granularity::Monthly,
                    year: Some(year),
                    month: self.month,
                    ..FilterSpec::overall(year, year)
                }
            }
            Granularity::Quarterly => {
                let year = self.year.unwrap_or(max_year);
                FilterSpec {
                    granularity: Granularity::Quarterly,
                    year: Some(year),
                    quarter: self.quarter,
                    ..FilterSpec::overall(year, year)
                }
            }
        };

        if !self.categories.is_empty() {
            spec.categories = Some(self.categories.iter().copied().collect());
        }

        spec.manufacturers = if self.all_manufacturers {
            None
        } else if !self.manufacturers.is_empty() {
            Some(self.manufacturers.iter().map(|m| m.trim().to_string()).collect())
        } else if !default_manufacturers.is_empty() {
            Some(default_manufacturers.iter().cloned().collect())
        } else {
            None
        };

        spec.validate()?;
        Ok(spec)
    }

    /// YoY ranking mode for `spec`. Selected mode without a manufacturer
    /// restriction ranks everyone.
    pub fn ranking_mode(&self, spec: &FilterSpec) -> RankingMode {
        match (self.ranking_mode.as_str(), spec.manufacturers.as_ref()) {
            ("selected", Some(set)) => RankingMode::Selected(set.clone()),
            _ => RankingMode::TopGrowth,
        }
    }

    /// Category the leader panel reports on: the explicit choice, otherwise
    /// the first selected category.
    pub fn leader_category(&self, spec: &FilterSpec) -> Category {
        self.leader_category
            .or_else(|| {
                spec.categories
                    .as_ref()
                    .and_then(|set: &BTreeSet<Category>| set.iter().next().copied())
            })
            .unwrap_or(Category::TwoWheeler)
    }
}

// ── Value parsers ──────────────────────────────────────────────────────────────

fn parse_month_arg(value: &str) -> std::result::Result<u32, String> {
    parse_month(value).ok_or_else(|| format!("`{}` is not a month", value))
}

fn parse_quarter_arg(value: &str) -> std::result::Result<u32, String> {
    parse_quarter(value).ok_or_else(|| format!("`{}` is not a quarter", value))
}

fn parse_category_arg(value: &str) -> std::result::Result<Category, String> {
    value.parse::<Category>().map_err(|e| e.to_string())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
