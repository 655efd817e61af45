//! Time-windowed aggregation over a [`Dataset`].
//!
//! Every function is pure: identical inputs give identical outputs and the
//! dataset is never modified. Empty inputs produce zero totals or empty
//! lists, never errors.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use dashboard_core::calculations::{growth_percentage, share_percentage};
use dashboard_core::calendar::{MonthPeriod, QuarterPeriod};
use dashboard_core::models::{
    AnchorPeriod, Category, CategoryTotal, FilterSpec, Granularity, GrowthResult,
    ManufacturerTotal, MarketShare, NormalizedRecord, RankingMode, TrendPoint, YoyRankingRow,
};

use crate::dataset::Dataset;

// ── PeriodKey ─────────────────────────────────────────────────────────────────

/// The window a total is summed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodKey {
    Month(MonthPeriod),
    Quarter(QuarterPeriod),
    /// Every record in the subset.
    All,
}

impl PeriodKey {
    fn contains(&self, record: &NormalizedRecord) -> bool {
        match self {
            PeriodKey::Month(m) => record.period == *m,
            PeriodKey::Quarter(q) => record.quarter == *q,
            PeriodKey::All => true,
        }
    }
}

impl From<AnchorPeriod> for PeriodKey {
    fn from(anchor: AnchorPeriod) -> Self {
        match anchor {
            AnchorPeriod::Month(m) => PeriodKey::Month(m),
            AnchorPeriod::Quarter(q) => PeriodKey::Quarter(q),
        }
    }
}

// ── RegistrationAggregator ────────────────────────────────────────────────────

/// Stateless query functions over registration datasets.
pub struct RegistrationAggregator;

impl RegistrationAggregator {
    /// Records matching `spec`; see [`Dataset::filter`].
    pub fn filter(dataset: &Dataset, spec: &FilterSpec) -> Dataset {
        dataset.filter(spec)
    }

    /// Sum of registrations inside `period`. An empty sum is `0`.
    pub fn period_total(subset: &Dataset, period: PeriodKey) -> u64 {
        Self::sum_where(subset.records().iter(), |r| period.contains(r))
    }

    /// Current versus prior-period and prior-year totals for `spec`.
    ///
    /// The anchor is the month (monthly) or quarter (quarterly, overall)
    /// pinned by `spec`, or else the latest one present in the filtered
    /// subset. The current total comes from the filtered subset; the two
    /// comparison totals are looked up in `dataset` with only the category and
    /// manufacturer selection applied, so they may fall outside the selected
    /// year range.
    ///
    /// Returns `None` when the anchor is open and the filtered subset is
    /// empty.
    pub fn growth_metrics(dataset: &Dataset, spec: &FilterSpec) -> Option<GrowthResult> {
        let subset = dataset.filter(spec);

        let anchor = match spec.granularity {
            Granularity::Monthly => spec
                .pinned_month()
                .or_else(|| subset.latest_month())
                .map(AnchorPeriod::Month)?,
            Granularity::Quarterly => spec
                .pinned_quarter()
                .or_else(|| subset.latest_quarter())
                .map(AnchorPeriod::Quarter)?,
            Granularity::Overall => subset.latest_quarter().map(AnchorPeriod::Quarter)?,
        };

        let (prior_key, prior_year_key) = match anchor {
            AnchorPeriod::Month(m) => (PeriodKey::Month(m.previous()), PeriodKey::Month(m.previous_year())),
            AnchorPeriod::Quarter(q) => (
                PeriodKey::Quarter(q.previous()),
                PeriodKey::Quarter(q.previous_year()),
            ),
        };

        let current = Self::period_total(&subset, anchor.into());
        let selected = || dataset.records().iter().filter(|r| spec.matches_selection(r));
        let prior_period = Self::sum_where(selected(), |r| prior_key.contains(r));
        let prior_year = Self::sum_where(selected(), |r| prior_year_key.contains(r));

        Some(GrowthResult {
            granularity: spec.granularity,
            period: anchor,
            current,
            prior_period,
            prior_year,
            period_growth_pct: growth_percentage(current, prior_period),
            yoy_growth_pct: growth_percentage(current, prior_year),
            range_total: subset.total(),
        })
    }

    /// The `n` largest manufacturers by summed registrations.
    ///
    /// Ties resolve by manufacturer name ascending, so the result does not
    /// depend on record order.
    pub fn top_manufacturers(subset: &Dataset, n: usize) -> Vec<ManufacturerTotal> {
        let mut ranked = Self::manufacturer_totals(subset.records().iter());
        ranked.truncate(n);
        ranked
    }

    /// The manufacturer with the most registrations in `category`, or `None`
    /// when the subset has no records for it.
    pub fn category_leader(subset: &Dataset, category: Category) -> Option<ManufacturerTotal> {
        Self::manufacturer_totals(subset.records().iter().filter(|r| r.category == category))
            .into_iter()
            .next()
    }

    /// Per-manufacturer registrations in `quarter` against the same quarter a
    /// year earlier.
    ///
    /// Considers the whole `dataset` restricted to `categories` (`None` = all).
    /// A manufacturer missing from one side counts as `0` there. In
    /// [`RankingMode::TopGrowth`] rows are ordered by growth descending, then
    /// name; in [`RankingMode::Selected`] only the selected manufacturers are
    /// kept, in name order.
    pub fn yoy_ranking(
        dataset: &Dataset,
        quarter: QuarterPeriod,
        categories: Option<&BTreeSet<Category>>,
        mode: &RankingMode,
    ) -> Vec<YoyRankingRow> {
        let previous_quarter = quarter.previous_year();
        let mut sides: BTreeMap<&str, (u64, u64)> = BTreeMap::new();

        for r in dataset.records() {
            if categories.is_some_and(|set| !set.contains(&r.category)) {
                continue;
            }
            if r.quarter == quarter {
                sides.entry(r.manufacturer.as_str()).or_default().1 += r.registrations;
            } else if r.quarter == previous_quarter {
                sides.entry(r.manufacturer.as_str()).or_default().0 += r.registrations;
            }
        }

        let rows = sides
            .into_iter()
            .map(|(manufacturer, (previous, current))| YoyRankingRow {
                manufacturer: manufacturer.to_string(),
                previous,
                current,
                growth_pct: growth_percentage(current, previous),
            });

        match mode {
            RankingMode::TopGrowth => {
                let mut rows: Vec<YoyRankingRow> = rows.collect();
                rows.sort_by(|a, b| {
                    b.growth_pct
                        .total_cmp(&a.growth_pct)
                        .then_with(|| a.manufacturer.cmp(&b.manufacturer))
                });
                rows
            }
            RankingMode::Selected(selected) => rows
                .filter(|row| selected.contains(&row.manufacturer))
                .collect(),
        }
    }

    /// Registrations per month, oldest first.
    pub fn monthly_trend(subset: &Dataset) -> Vec<TrendPoint> {
        let mut by_date: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for r in subset.records() {
            *by_date.entry(r.date).or_default() += r.registrations;
        }
        by_date
            .into_iter()
            .map(|(date, total)| TrendPoint { date, total })
            .collect()
    }

    /// Registrations per category, in category order. Categories without
    /// data are omitted.
    pub fn category_totals(subset: &Dataset) -> Vec<CategoryTotal> {
        let mut by_category: BTreeMap<Category, u64> = BTreeMap::new();
        for r in subset.records() {
            *by_category.entry(r.category).or_default() += r.registrations;
        }
        by_category
            .into_iter()
            .map(|(category, total)| CategoryTotal { category, total })
            .collect()
    }

    /// The `n` largest manufacturers with their share of the subset total.
    pub fn market_share(subset: &Dataset, n: usize) -> Vec<MarketShare> {
        let whole = subset.total();
        Self::top_manufacturers(subset, n)
            .into_iter()
            .map(|m| MarketShare {
                share_pct: share_percentage(m.total, whole),
                manufacturer: m.manufacturer,
                total: m.total,
            })
            .collect()
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn sum_where<'a>(
        records: impl Iterator<Item = &'a NormalizedRecord>,
        predicate: impl Fn(&NormalizedRecord) -> bool,
    ) -> u64 {
        records
            .filter(|r| predicate(*r))
            .map(|r| r.registrations)
            .sum()
    }

    /// All manufacturers, largest total first, ties by name.
    fn manufacturer_totals<'a>(
        records: impl Iterator<Item = &'a NormalizedRecord>,
    ) -> Vec<ManufacturerTotal> {
        let mut totals: HashMap<&str, u64> = HashMap::new();
        for r in records {
            *totals.entry(r.manufacturer.as_str()).or_default() += r.registrations;
        }
        let mut ranked: Vec<ManufacturerTotal> = totals
            .into_iter()
            .map(|(manufacturer, total)| ManufacturerTotal {
                manufacturer: manufacturer.to_string(),
                total,
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.manufacturer.cmp(&b.manufacturer))
        });
        ranked
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
