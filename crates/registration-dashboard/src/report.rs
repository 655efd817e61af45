//! Plain-text rendering of a dashboard snapshot.

use std::fmt::Write;

use dashboard_core::formatting::{format_count, format_growth};
use dashboard_core::models::{AnchorPeriod, Granularity};
use dashboard_data::analysis::LoadResult;
use dashboard_data::discovery::{Classification, DiscoveryReport};
use dashboard_runtime::snapshot::DashboardSnapshot;

/// Width of the manufacturer column in tables.
const NAME_WIDTH: usize = 28;

/// One line per file discovery considered, accepted or not.
pub fn render_file_log(report: &DiscoveryReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Files considered: {} ({} accepted, {} skipped)",
        report.considered.len(),
        report.accepted.len(),
        report.rejected_count()
    );
    for file in &report.considered {
        let _ = match &file.verdict {
            Classification::Accepted(raw) => writeln!(
                out,
                "  ok    {}  [{}-{:02}]",
                file.path.display(),
                raw.year,
                raw.month
            ),
            Classification::Rejected(reason) => {
                writeln!(out, "  skip  {}  ({})", file.path.display(), reason)
            }
        };
    }
    out
}

/// Short summary of how the load went.
pub fn render_load_summary(load: &LoadResult) -> String {
    let meta = &load.metadata;
    let mut out = format!(
        "Loaded {} records from {} of {} files ({} rows read",
        format_count(meta.records as u64),
        meta.files_loaded,
        meta.files_accepted,
        format_count(meta.rows_read as u64)
    );
    if meta.rows_skipped > 0 {
        let _ = write!(out, ", {} skipped", meta.rows_skipped);
    }
    out.push(')');
    for failure in &load.failures {
        let _ = write!(out, "\n  failed: {}: {}", failure.path.display(), failure.message);
    }
    out
}

/// Full text report for one snapshot.
pub fn render_report(snapshot: &DashboardSnapshot) -> String {
    let mut out = String::new();
    let spec = &snapshot.query.spec;
    let (from, to) = spec.effective_years();

    let _ = writeln!(out, "Vehicle registrations {}-{} ({})", from, to, spec.granularity);
    let _ = writeln!(
        out,
        "Records in view: {} of {}",
        format_count(snapshot.records_in_view as u64),
        format_count(snapshot.total_records as u64)
    );

    if snapshot.is_empty() {
        let _ = writeln!(out, "\nNo registrations match the current filters.");
    }

    // ── Growth ────────────────────────────────────────────────────────────────
    if let Some(growth) = &snapshot.growth {
        let unit = match growth.period {
            AnchorPeriod::Month(_) => "MoM",
            AnchorPeriod::Quarter(_) => "QoQ",
        };
        let _ = writeln!(out, "\nGrowth for {}", growth.period);
        let _ = writeln!(out, "  Registrations   {:>14}", format_count(growth.current));
        let _ = writeln!(
            out,
            "  {} growth      {:>14}   (prior {})",
            unit,
            format_growth(growth.period_growth_pct),
            format_count(growth.prior_period)
        );
        let _ = writeln!(
            out,
            "  YoY growth      {:>14}   (prior {})",
            format_growth(growth.yoy_growth_pct),
            format_count(growth.prior_year)
        );
        if spec.granularity == Granularity::Overall {
            let _ = writeln!(
                out,
                "  Range total     {:>14}",
                format_count(growth.range_total)
            );
        }
    }

    // ── Category breakdown ────────────────────────────────────────────────────
    if !snapshot.category_totals.is_empty() {
        let _ = writeln!(out, "\nBy category");
        for c in &snapshot.category_totals {
            let _ = writeln!(out, "  {:<4} {:>14}", c.category, format_count(c.total));
        }
    }

    // ── Rankings ──────────────────────────────────────────────────────────────
    if !snapshot.market_share.is_empty() {
        let _ = writeln!(out, "\nTop manufacturers");
        for (i, m) in snapshot.market_share.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {:>2}. {:<width$} {:>14} {:>8}",
                i + 1,
                truncate(&m.manufacturer, NAME_WIDTH),
                format_count(m.total),
                format_growth(m.share_pct),
                width = NAME_WIDTH
            );
        }
    }

    let leader_category = snapshot.query.leader_category;
    match &snapshot.leader {
        Some(leader) => {
            let _ = writeln!(
                out,
                "\n{} leader: {} ({})",
                leader_category,
                leader.manufacturer,
                format_count(leader.total)
            );
        }
        None => {
            let _ = writeln!(out, "\n{} leader: no data", leader_category);
        }
    }

    if let Some(quarter) = snapshot.ranking_quarter {
        let _ = writeln!(
            out,
            "\nYoY ranking {} vs {}",
            quarter,
            quarter.previous_year()
        );
        if snapshot.yoy_ranking.is_empty() {
            let _ = writeln!(out, "  no manufacturers in either quarter");
        }
        for row in &snapshot.yoy_ranking {
            let _ = writeln!(
                out,
                "  {:<width$} {:>12} {:>12} {:>9}",
                truncate(&row.manufacturer, NAME_WIDTH),
                format_count(row.previous),
                format_count(row.current),
                format_growth(row.growth_pct),
                width = NAME_WIDTH
            );
        }
    }

    // ── Trend ─────────────────────────────────────────────────────────────────
    if !snapshot.trend.is_empty() {
        let _ = writeln!(out, "\nMonthly trend");
        for point in &snapshot.trend {
            let _ = writeln!(
                out,
                "  {} {:>14}",
                point.date.format("%Y-%m"),
                format_count(point.total)
            );
        }
    }

    out
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let mut cut: String = name.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::calendar::MonthPeriod;
    use dashboard_core::models::{Category, FilterSpec, NormalizedRecord};
    use dashboard_data::dataset::Dataset;
    use dashboard_runtime::snapshot::{build_snapshot, DashboardQuery};

    fn record(maker: &str, category: Category, year: i32, month: u32, n: i64) -> NormalizedRecord {
        NormalizedRecord::new(maker, category, MonthPeriod::new(year, month).unwrap(), n).unwrap()
    }

    #[test]
    fn test_report_monthly_growth() {
        let ds = Dataset::new(vec![
            record("ManufacturerX", Category::TwoWheeler, 2023, 1, 100),
            record("ManufacturerX", Category::TwoWheeler, 2023, 2, 120),
        ]);
        let query = DashboardQuery::new(FilterSpec::monthly(2023, 2));
        let text = render_report(&build_snapshot(&ds, &query).unwrap());

        assert!(text.contains("Growth for 2023-02"));
        assert!(text.contains("MoM growth"));
        assert!(text.contains("20.00%"));
        assert!(text.contains("2W leader: ManufacturerX (120)"));
        assert!(text.contains("YoY ranking 2023Q1 vs 2022Q1"));
    }

    #[test]
    fn test_report_empty_snapshot() {
        let query = DashboardQuery::new(FilterSpec::overall(2023, 2023));
        let text = render_report(&build_snapshot(&Dataset::empty(), &query).unwrap());
        assert!(text.contains("No registrations match the current filters."));
        assert!(text.contains("2W leader: no data"));
        assert!(!text.contains("Growth for"));
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("Short", 10), "Short");
        let cut = truncate("A very long manufacturer name indeed", 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_file_log_lists_verdicts() {
        let dir = tempfile::TempDir::new().unwrap();
        let folder = dir.path().join("2023");
        std::fs::create_dir_all(&folder).unwrap();
        std::fs::write(folder.join("2023-JAN.csv"), "Maker,2W,3W,4W\n").unwrap();
        std::fs::write(folder.join("2024-JAN.csv"), "Maker,2W,3W,4W\n").unwrap();

        let report = dashboard_data::discovery::discover_files(dir.path()).unwrap();
        let text = render_file_log(&report);
        assert!(text.starts_with("Files considered: 2 (1 accepted, 1 skipped)"));
        assert!(text.contains("[2023-01]"));
        assert!(text.contains("does not match file year"));
    }
}
