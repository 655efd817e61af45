//! Wide-to-long reshaping of registration rows.
//!
//! Every `(manufacturer, year, month)` row fans out into one record per
//! category with a positive count. Zero and negative counts mean "no
//! activity" and are dropped.

use std::collections::BTreeMap;

use dashboard_core::calendar::MonthPeriod;
use dashboard_core::models::{Category, CategoryCounts, NormalizedRecord, RegistrationRow};
use tracing::{debug, warn};

use crate::dataset::Dataset;

/// Reshape wide rows into a long-form [`Dataset`].
///
/// Rows sharing a manufacturer and month are summed first, so the output
/// holds at most one record per `(manufacturer, category, year, month)`.
/// Records are ordered by period, then manufacturer, then category.
pub fn normalize(rows: &[RegistrationRow]) -> Dataset {
    let mut merged: BTreeMap<(MonthPeriod, &str), CategoryCounts> = BTreeMap::new();
    let mut duplicates = 0usize;

    for row in rows {
        let Some(period) = MonthPeriod::new(row.year, row.month) else {
            warn!(
                "Dropping row for {} with invalid period {}-{}",
                row.manufacturer, row.year, row.month
            );
            continue;
        };
        match merged.entry((period, row.manufacturer.as_str())) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(row.counts);
            }
            std::collections::btree_map::Entry::Occupied(mut slot) => {
                duplicates += 1;
                slot.get_mut().merge(&row.counts);
            }
        }
    }

    if duplicates > 0 {
        debug!("Merged {} duplicate manufacturer rows", duplicates);
    }

    let records: Vec<NormalizedRecord> = merged
        .into_iter()
        .flat_map(|((period, manufacturer), counts)| {
            Category::ALL.into_iter().filter_map(move |category| {
                NormalizedRecord::new(manufacturer, category, period, counts.get(category))
            })
        })
        .collect();

    debug!("Normalized {} rows into {} records", rows.len(), records.len());

    Dataset::new(records)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn row(maker: &str, year: i32, month: u32, two: i64, three: i64, four: i64) -> RegistrationRow {
        RegistrationRow {
            manufacturer: maker.to_string(),
            counts: CategoryCounts {
                two_wheeler: two,
                three_wheeler: three,
                four_wheeler: four,
            },
            year,
            month,
        }
    }

    #[test]
    fn test_zero_counts_dropped() {
        let ds = normalize(&[
            row("ManufacturerX", 2023, 1, 100, 0, 50),
            row("ManufacturerX", 2023, 2, 120, 0, 60),
        ]);
        assert_eq!(ds.len(), 4);
        assert!(ds
            .records()
            .iter()
            .all(|r| r.category != Category::ThreeWheeler));
    }

    #[test]
    fn test_negative_counts_dropped() {
        let ds = normalize(&[row("A", 2023, 1, -5, 3, 0)]);
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records()[0].category, Category::ThreeWheeler);
        assert!(ds.records().iter().all(|r| r.registrations > 0));
    }

    #[test]
    fn test_derived_date_and_quarter() {
        let ds = normalize(&[row("A", 2023, 11, 1, 0, 0)]);
        let r = &ds.records()[0];
        assert_eq!(r.date.to_string(), "2023-11-01");
        assert_eq!(r.quarter_number(), 4);
    }

    #[test]
    fn test_duplicate_rows_merged_into_unique_records() {
        let ds = normalize(&[
            row("A", 2023, 1, 10, 0, 1),
            row("A", 2023, 1, 5, 0, 0),
            row("B", 2023, 1, 7, 0, 0),
        ]);

        let keys: HashSet<(String, Category, MonthPeriod)> = ds
            .records()
            .iter()
            .map(|r| (r.manufacturer.clone(), r.category, r.period))
            .collect();
        assert_eq!(keys.len(), ds.len());

        let a_two = ds
            .records()
            .iter()
            .find(|r| r.manufacturer == "A" && r.category == Category::TwoWheeler)
            .unwrap();
        assert_eq!(a_two.registrations, 15);
    }

    #[test]
    fn test_negative_duplicate_row_does_not_reduce_count() {
        for rows in [
            [row("A", 2023, 1, 10, 0, 0), row("A", 2023, 1, -5, 0, 0)],
            [row("A", 2023, 1, -5, 0, 0), row("A", 2023, 1, 10, 0, 0)],
        ] {
            let ds = normalize(&rows);
            let counts: Vec<u64> = ds.records().iter().map(|r| r.registrations).collect();
            assert_eq!(counts, vec![10]);
        }
    }

    #[test]
    fn test_duplicate_rows_all_non_positive_dropped() {
        let ds = normalize(&[row("A", 2023, 1, 0, -3, 0), row("A", 2023, 1, -1, 0, 0)]);
        assert!(ds.is_empty());
    }

    #[test]
    fn test_output_ordering() {
        let ds = normalize(&[
            row("Z", 2023, 2, 1, 0, 0),
            row("A", 2023, 2, 1, 0, 1),
            row("M", 2023, 1, 1, 0, 0),
        ]);
        let order: Vec<(String, Category)> = ds
            .records()
            .iter()
            .map(|r| (r.manufacturer.clone(), r.category))
            .collect();
        assert_eq!(
            order,
            vec![
                ("M".to_string(), Category::TwoWheeler),
                ("A".to_string(), Category::TwoWheeler),
                ("A".to_string(), Category::FourWheeler),
                ("Z".to_string(), Category::TwoWheeler),
            ]
        );
    }

    #[test]
    fn test_empty_input_gives_empty_dataset() {
        assert!(normalize(&[]).is_empty());
    }
}
