//! One dashboard view, computed from a dataset and a query.

use dashboard_core::calendar::QuarterPeriod;
use dashboard_core::models::{
    Category, CategoryTotal, FilterSpec, GrowthResult, ManufacturerTotal, MarketShare,
    RankingMode, TrendPoint, YoyRankingRow,
};
use dashboard_core::Result;
use dashboard_data::aggregator::RegistrationAggregator;
use dashboard_data::dataset::Dataset;
use serde::Serialize;

/// Everything that determines a [`DashboardSnapshot`] besides the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DashboardQuery {
    pub spec: FilterSpec,
    /// Length of the top-manufacturer and market-share lists.
    pub top_n: usize,
    pub leader_category: Category,
    pub ranking_mode: RankingMode,
}

impl DashboardQuery {
    pub fn new(spec: FilterSpec) -> Self {
        Self {
            spec,
            top_n: 10,
            leader_category: Category::TwoWheeler,
            ranking_mode: RankingMode::TopGrowth,
        }
    }
}

/// The computed panels of one dashboard view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub query: DashboardQuery,
    /// `None` when the query selects no data and pins no period.
    pub growth: Option<GrowthResult>,
    pub top_manufacturers: Vec<ManufacturerTotal>,
    pub market_share: Vec<MarketShare>,
    pub category_totals: Vec<CategoryTotal>,
    pub trend: Vec<TrendPoint>,
    pub leader: Option<ManufacturerTotal>,
    /// Quarter the YoY ranking compares against a year earlier.
    pub ranking_quarter: Option<QuarterPeriod>,
    pub yoy_ranking: Vec<YoyRankingRow>,
    /// Records matched by the query.
    pub records_in_view: usize,
    pub total_records: usize,
}

impl DashboardSnapshot {
    /// `true` when the query matched nothing.
    pub fn is_empty(&self) -> bool {
        self.records_in_view == 0
    }
}

/// Compute every panel for `query` over `dataset`.
///
/// Fails only when the filter itself is invalid. An empty dataset or a
/// filter that matches nothing gives a snapshot with empty panels.
pub fn build_snapshot(dataset: &Dataset, query: &DashboardQuery) -> Result<DashboardSnapshot> {
    let spec = &query.spec;
    spec.validate()?;

    let subset = RegistrationAggregator::filter(dataset, spec);

    // The ranking covers the pinned quarter, or the latest one in view.
    let ranking_quarter = spec.pinned_quarter().or_else(|| subset.latest_quarter());
    let yoy_ranking = ranking_quarter
        .map(|quarter| {
            RegistrationAggregator::yoy_ranking(
                dataset,
                quarter,
                spec.categories.as_ref(),
                &query.ranking_mode,
            )
        })
        .unwrap_or_default();

    Ok(DashboardSnapshot {
        query: query.clone(),
        growth: RegistrationAggregator::growth_metrics(dataset, spec),
        top_manufacturers: RegistrationAggregator::top_manufacturers(&subset, query.top_n),
        market_share: RegistrationAggregator::market_share(&subset, query.top_n),
        category_totals: RegistrationAggregator::category_totals(&subset),
        trend: RegistrationAggregator::monthly_trend(&subset),
        leader: RegistrationAggregator::category_leader(&subset, query.leader_category),
        ranking_quarter,
        yoy_ranking,
        records_in_view: subset.len(),
        total_records: dataset.len(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::calendar::MonthPeriod;
    use dashboard_core::models::NormalizedRecord;
    use dashboard_core::DashboardError;

    fn record(maker: &str, category: Category, year: i32, month: u32, n: i64) -> NormalizedRecord {
        NormalizedRecord::new(maker, category, MonthPeriod::new(year, month).unwrap(), n).unwrap()
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            record("Hero", Category::TwoWheeler, 2023, 2, 400),
            record("Hero", Category::TwoWheeler, 2024, 2, 500),
            record("Bajaj", Category::ThreeWheeler, 2023, 1, 100),
            record("Bajaj", Category::ThreeWheeler, 2024, 1, 90),
            record("Tata", Category::FourWheeler, 2024, 3, 300),
        ])
    }

    #[test]
    fn test_snapshot_panels() {
        let query = DashboardQuery::new(FilterSpec::quarterly(2024, 1));
        let snap = build_snapshot(&sample(), &query).unwrap();

        assert_eq!(snap.records_in_view, 3);
        assert_eq!(snap.total_records, 5);
        assert_eq!(snap.top_manufacturers[0].manufacturer, "Hero");
        assert_eq!(snap.leader.as_ref().unwrap().manufacturer, "Hero");
        assert_eq!(snap.ranking_quarter, QuarterPeriod::new(2024, 1));
        assert_eq!(snap.yoy_ranking[0].manufacturer, "Hero");
        assert_eq!(snap.yoy_ranking.len(), 3);

        let growth = snap.growth.unwrap();
        assert_eq!(growth.current, 890);
        assert_eq!(growth.prior_year, 500);
    }

    #[test]
    fn test_snapshot_empty_dataset() {
        let query = DashboardQuery::new(FilterSpec::overall(2023, 2024));
        let snap = build_snapshot(&Dataset::empty(), &query).unwrap();
        assert!(snap.is_empty());
        assert!(snap.growth.is_none());
        assert!(snap.top_manufacturers.is_empty());
        assert!(snap.leader.is_none());
        assert!(snap.ranking_quarter.is_none());
        assert!(snap.yoy_ranking.is_empty());
    }

    #[test]
    fn test_snapshot_rejects_invalid_filter() {
        let query = DashboardQuery::new(FilterSpec::overall(2025, 2023));
        let err = build_snapshot(&sample(), &query).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidFilter(_)));
    }

    #[test]
    fn test_snapshot_serializes_to_json() {
        let query = DashboardQuery::new(FilterSpec::monthly(2024, 2));
        let snap = build_snapshot(&sample(), &query).unwrap();
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["growth"]["current"], 500);
        assert_eq!(json["records_in_view"], 1);
    }
}
