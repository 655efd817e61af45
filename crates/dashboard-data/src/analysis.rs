//! Top-level load pipeline.
//!
//! Runs discovery, CSV loading and normalization in order and returns a
//! [`LoadResult`]. Loading never fails: an unreadable root, a directory with
//! no usable files or files with no positive counts all come back as an empty
//! dataset flagged [`LoadStatus::NoData`].

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use crate::dataset::Dataset;
use crate::discovery::{discover_files, DiscoveryReport};
use crate::normalizer::normalize;
use crate::reader::{load_all, FileLoadError, RowError};

// ── Public types ──────────────────────────────────────────────────────────────

/// Why a load pass produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoDataReason {
    /// The root, or a directory under it, could not be listed.
    DirectoryUnreadable(String),
    /// Discovery finished but no file loaded successfully.
    NoFilesLoaded,
    /// Files loaded but every count was zero or negative.
    NoRecords,
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataReason::DirectoryUnreadable(msg) => write!(f, "data directory unreadable: {}", msg),
            NoDataReason::NoFilesLoaded => write!(f, "no data files could be loaded"),
            NoDataReason::NoRecords => write!(f, "data files contain no registrations"),
        }
    }
}

/// Outcome of a load pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    NoData(NoDataReason),
}

impl LoadStatus {
    pub fn is_no_data(&self) -> bool {
        matches!(self, LoadStatus::NoData(_))
    }
}

/// Metadata produced alongside the dataset.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LoadMetadata {
    /// ISO-8601 timestamp when this result was generated.
    pub generated_at: String,
    pub root: PathBuf,
    /// Candidate `.csv` files seen by discovery.
    pub files_considered: usize,
    pub files_accepted: usize,
    pub files_loaded: usize,
    pub files_failed: usize,
    /// Data rows read across all loaded files.
    pub rows_read: usize,
    /// Data rows skipped because a cell could not be parsed.
    pub rows_skipped: usize,
    /// Normalized records in the dataset.
    pub records: usize,
    /// Wall-clock seconds for the whole pass.
    pub load_time_seconds: f64,
}

/// The complete output of [`load_dataset`].
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// Normalized records; empty whenever `status` is `NoData`.
    pub dataset: Dataset,
    pub status: LoadStatus,
    /// Per-file discovery verdicts. Empty when the root was unreadable.
    pub discovery: DiscoveryReport,
    /// Accepted files that failed to load.
    pub failures: Vec<FileLoadError>,
    /// Skipped rows inside otherwise loadable files.
    pub row_errors: Vec<RowError>,
    pub metadata: LoadMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full load pipeline against `root`.
///
/// 1. Discover `<root>/<YEAR>/<YEAR>-<MON>.csv` files.
/// 2. Parse every accepted file, skipping the ones that fail.
/// 3. Reshape the rows into long-form records.
/// 4. Return a [`LoadResult`] carrying the dataset and a status.
pub fn load_dataset(root: &Path) -> LoadResult {
    let start = std::time::Instant::now();

    // ── Step 1: Discover ──────────────────────────────────────────────────────
    let discovery = match discover_files(root) {
        Ok(report) => report,
        Err(e) => {
            warn!("Data directory {} unreadable: {}", root.display(), e);
            let status = LoadStatus::NoData(NoDataReason::DirectoryUnreadable(e.to_string()));
            return finish(
                root,
                start,
                Dataset::empty(),
                status,
                DiscoveryReport::default(),
                Vec::new(),
                Vec::new(),
                0,
                0,
            );
        }
    };

    // ── Step 2: Load files ────────────────────────────────────────────────────
    let outcome = load_all(&discovery.accepted);

    // ── Step 3: Normalize ─────────────────────────────────────────────────────
    let (dataset, status) = if outcome.files_loaded == 0 {
        (Dataset::empty(), LoadStatus::NoData(NoDataReason::NoFilesLoaded))
    } else {
        let dataset = normalize(&outcome.rows);
        if dataset.is_empty() {
            (dataset, LoadStatus::NoData(NoDataReason::NoRecords))
        } else {
            (dataset, LoadStatus::Loaded)
        }
    };

    if let LoadStatus::NoData(reason) = &status {
        warn!("No registration data under {}: {}", root.display(), reason);
    }

    // ── Step 4: Build result ──────────────────────────────────────────────────
    finish(
        root,
        start,
        dataset,
        status,
        discovery,
        outcome.failures,
        outcome.row_errors,
        outcome.files_loaded,
        outcome.rows_read,
    )
}

// ── Private helpers ───────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
fn finish(
    root: &Path,
    start: std::time::Instant,
    dataset: Dataset,
    status: LoadStatus,
    discovery: DiscoveryReport,
    failures: Vec<FileLoadError>,
    row_errors: Vec<RowError>,
    files_loaded: usize,
    rows_read: usize,
) -> LoadResult {
    let metadata = LoadMetadata {
        generated_at: Utc::now().to_rfc3339(),
        root: root.to_path_buf(),
        files_considered: discovery.considered.len(),
        files_accepted: discovery.accepted.len(),
        files_loaded,
        files_failed: failures.len(),
        rows_read,
        rows_skipped: row_errors.len(),
        records: dataset.len(),
        load_time_seconds: start.elapsed().as_secs_f64(),
    };

    info!(
        "Loaded {} records from {}/{} files in {:.3}s",
        metadata.records, metadata.files_loaded, metadata.files_accepted, metadata.load_time_seconds
    );

    LoadResult {
        dataset,
        status,
        discovery,
        failures,
        row_errors,
        metadata,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{PeriodKey, RegistrationAggregator};
    use dashboard_core::calendar::MonthPeriod;
    use dashboard_core::models::{Category, FilterSpec};
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    // ── load_dataset ──────────────────────────────────────────────────────────

    #[test]
    fn test_two_months_of_one_manufacturer() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "2023/2023-JAN.csv", "Maker,2W,3W,4W\nManufacturerX,100,0,50\n");
        write(dir.path(), "2023/2023-FEB.csv", "Maker,2W,3W,4W\nManufacturerX,120,0,60\n");

        let result = load_dataset(dir.path());
        assert_eq!(result.status, LoadStatus::Loaded);
        assert_eq!(result.dataset.len(), 4);
        assert_eq!(result.metadata.files_loaded, 2);
        assert_eq!(result.metadata.records, 4);

        let two_w = result
            .dataset
            .filter(&FilterSpec::overall(2023, 2023).with_categories([Category::TwoWheeler]));
        let feb = MonthPeriod::new(2023, 2).unwrap();
        assert_eq!(RegistrationAggregator::period_total(&two_w, PeriodKey::Month(feb)), 120);

        let spec = FilterSpec::monthly(2023, 2).with_categories([Category::TwoWheeler]);
        let growth = RegistrationAggregator::growth_metrics(&result.dataset, &spec).unwrap();
        assert!((growth.period_growth_pct - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_year_mismatch_contributes_nothing() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "2023/2024-JAN.csv", "Maker,2W,3W,4W\nA,10,0,0\n");

        let result = load_dataset(dir.path());
        assert!(result.dataset.is_empty());
        assert_eq!(result.status, LoadStatus::NoData(NoDataReason::NoFilesLoaded));
        assert_eq!(result.metadata.files_considered, 1);
        assert_eq!(result.discovery.rejected_count(), 1);
    }

    #[test]
    fn test_empty_root_signals_no_data() {
        let dir = TempDir::new().unwrap();
        let result = load_dataset(dir.path());
        assert!(result.dataset.is_empty());
        assert!(result.status.is_no_data());
    }

    #[test]
    fn test_missing_root_signals_no_data() {
        let dir = TempDir::new().unwrap();
        let result = load_dataset(&dir.path().join("missing"));
        assert!(result.dataset.is_empty());
        assert!(matches!(
            result.status,
            LoadStatus::NoData(NoDataReason::DirectoryUnreadable(_))
        ));
        assert!(result.discovery.considered.is_empty());
    }

    #[test]
    fn test_bad_file_skipped_others_loaded() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "2023/2023-JAN.csv", "Company,2W\nA,1\n");
        write(dir.path(), "2023/2023-FEB.csv", "Maker,2W,3W,4W\nA,5,0,0\n");

        let result = load_dataset(dir.path());
        assert_eq!(result.status, LoadStatus::Loaded);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.metadata.files_failed, 1);
        assert_eq!(result.dataset.len(), 1);
    }

    #[test]
    fn test_all_zero_counts_is_no_records() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "2023/2023-JAN.csv", "Maker,2W,3W,4W\nA,0,0,0\n");

        let result = load_dataset(dir.path());
        assert_eq!(result.status, LoadStatus::NoData(NoDataReason::NoRecords));
        assert_eq!(result.metadata.files_loaded, 1);
    }

    #[test]
    fn test_row_errors_counted() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "2023/2023-JAN.csv",
            "Maker,2W,3W,4W\nA,abc,0,0\nB,3,0,0\n",
        );

        let result = load_dataset(dir.path());
        assert_eq!(result.metadata.rows_read, 2);
        assert_eq!(result.metadata.rows_skipped, 1);
        assert_eq!(result.dataset.manufacturers(), vec!["B"]);
    }
}
