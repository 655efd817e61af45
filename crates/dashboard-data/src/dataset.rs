//! Immutable, cheaply clonable collection of normalized records.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use dashboard_core::calendar::{MonthPeriod, QuarterPeriod};
use dashboard_core::models::{Category, FilterSpec, NormalizedRecord};

/// The loaded registration dataset, or any filtered view of it.
///
/// Records are shared behind an [`Arc`]; every query builds a new view and
/// the underlying records are never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Arc<[NormalizedRecord]>,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}

impl Dataset {
    /// Wrap already-normalized records.
    pub fn new(records: Vec<NormalizedRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// An explicitly empty dataset.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `true` when both handles share the same underlying records.
    pub fn same_records(&self, other: &Dataset) -> bool {
        Arc::ptr_eq(&self.records, &other.records)
    }

    /// Records matching `spec`. An empty result is a normal outcome.
    pub fn filter(&self, spec: &FilterSpec) -> Dataset {
        self.filter_by(|r| spec.matches(r))
    }

    /// Records matching `predicate`.
    pub fn filter_by(&self, predicate: impl Fn(&NormalizedRecord) -> bool) -> Dataset {
        Dataset::new(self.records.iter().filter(|r| predicate(*r)).cloned().collect())
    }

    /// Sum of registrations over every record.
    pub fn total(&self) -> u64 {
        self.records.iter().map(|r| r.registrations).sum()
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.records.iter().map(|r| r.year()).collect();
        set.into_iter().collect()
    }

    /// Distinct categories, in category order.
    pub fn categories(&self) -> Vec<Category> {
        let set: BTreeSet<Category> = self.records.iter().map(|r| r.category).collect();
        set.into_iter().collect()
    }

    /// Distinct manufacturers, ascending.
    pub fn manufacturers(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.manufacturer.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// The `n` largest manufacturers by total registrations, used as the
    /// default manufacturer selection. Ties resolve by name.
    pub fn default_manufacturers(&self, n: usize) -> Vec<String> {
        let mut totals: HashMap<&str, u64> = HashMap::new();
        for r in self.records.iter() {
            *totals.entry(r.manufacturer.as_str()).or_default() += r.registrations;
        }
        let mut ranked: Vec<(&str, u64)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.into_iter().take(n).map(|(m, _)| m.to_string()).collect()
    }

    /// Most recent month with any record.
    pub fn latest_month(&self) -> Option<MonthPeriod> {
        self.records.iter().map(|r| r.period).max()
    }

    /// Most recent quarter with any record.
    pub fn latest_quarter(&self) -> Option<QuarterPeriod> {
        self.records.iter().map(|r| r.quarter).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(maker: &str, category: Category, year: i32, month: u32, n: i64) -> NormalizedRecord {
        NormalizedRecord::new(maker, category, MonthPeriod::new(year, month).unwrap(), n).unwrap()
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            record("Bajaj", Category::TwoWheeler, 2023, 1, 100),
            record("Bajaj", Category::ThreeWheeler, 2023, 2, 40),
            record("Tata", Category::FourWheeler, 2024, 3, 70),
            record("Hero", Category::TwoWheeler, 2024, 11, 140),
        ])
    }

    #[test]
    fn test_distinct_options() {
        let ds = sample();
        assert_eq!(ds.years(), vec![2023, 2024]);
        assert_eq!(
            ds.categories(),
            vec![Category::TwoWheeler, Category::ThreeWheeler, Category::FourWheeler]
        );
        assert_eq!(ds.manufacturers(), vec!["Bajaj", "Hero", "Tata"]);
    }

    #[test]
    fn test_default_manufacturers_by_total() {
        let ds = sample();
        assert_eq!(ds.default_manufacturers(2), vec!["Bajaj", "Hero"]);
        assert_eq!(ds.default_manufacturers(10).len(), 3);
    }

    #[test]
    fn test_latest_periods() {
        let ds = sample();
        assert_eq!(ds.latest_month(), MonthPeriod::new(2024, 11));
        assert_eq!(ds.latest_quarter(), QuarterPeriod::new(2024, 4));
        assert_eq!(Dataset::empty().latest_month(), None);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let ds = sample();
        let spec = FilterSpec::overall(2023, 2024)
            .with_categories([Category::TwoWheeler])
            .with_manufacturers(["Bajaj", "Hero"]);
        let once = ds.filter(&spec);
        let twice = once.filter(&spec);
        assert_eq!(once.records(), twice.records());
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_filter_does_not_touch_base() {
        let ds = sample();
        let _ = ds.filter(&FilterSpec::overall(2030, 2030));
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.total(), 350);
    }

    #[test]
    fn test_filter_no_match_is_empty() {
        let ds = sample();
        let subset = ds.filter(&FilterSpec::monthly(2023, 12));
        assert!(subset.is_empty());
        assert_eq!(subset.total(), 0);
    }

    #[test]
    fn test_clone_shares_records() {
        let ds = sample();
        let copy = ds.clone();
        assert!(ds.same_records(&copy));
        assert!(!ds.same_records(&ds.filter(&FilterSpec::overall(2023, 2024))));
    }
}
