//! CSV loading for discovered monthly files.
//!
//! Each file is a wide table with a manufacturer column (`Maker`) and one
//! count column per vehicle category (`2W`, `3W`, `4W`). Rows become
//! [`RegistrationRow`]s tagged with the file's year and month.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use dashboard_core::models::{Category, CategoryCounts, RawFile, RegistrationRow};
use dashboard_core::{DashboardError, Result};
use tracing::{debug, warn};

/// Accepted spellings of the manufacturer column, lower-cased.
const MANUFACTURER_COLUMNS: [&str; 2] = ["maker", "manufacturer"];

// ── Public types ──────────────────────────────────────────────────────────────

/// A source row that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub path: PathBuf,
    /// 1-based line number in the file, header included.
    pub line: usize,
    pub message: String,
}

/// Rows parsed from one file.
#[derive(Debug, Clone, Default)]
pub struct FileRows {
    pub rows: Vec<RegistrationRow>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// A file that could not be loaded at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLoadError {
    pub path: PathBuf,
    pub message: String,
}

/// Combined output of loading every accepted file.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub rows: Vec<RegistrationRow>,
    /// Files that parsed successfully (possibly with skipped rows).
    pub files_loaded: usize,
    pub failures: Vec<FileLoadError>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse one discovered file into registration rows.
///
/// Fails when the file cannot be opened, the header is unreadable, a
/// required column is missing, or the CSV structure is broken. Rows with a
/// blank manufacturer or a non-numeric count are skipped and reported.
pub fn load_registration_rows(raw: &RawFile) -> Result<FileRows> {
    let path = raw.path.as_path();
    let file = File::open(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .clone();
    let columns = ColumnMap::resolve(path, &headers)?;

    let mut out = FileRows::default();

    for (idx, result) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        let record = result.map_err(|source| csv_error(path, source))?;
        out.rows_read += 1;

        match columns.parse_row(&record) {
            Ok((manufacturer, counts)) => out.rows.push(RegistrationRow {
                manufacturer,
                counts,
                year: raw.year,
                month: raw.month,
            }),
            Err(message) => {
                debug!("{}:{}: skipping row: {}", path.display(), line, message);
                out.row_errors.push(RowError {
                    path: path.to_path_buf(),
                    line,
                    message,
                });
            }
        }
    }

    debug!(
        "File {}: {} read, {} kept, {} skipped",
        path.display(),
        out.rows_read,
        out.rows.len(),
        out.row_errors.len()
    );

    Ok(out)
}

/// Load every file, excluding (and reporting) the ones that fail.
pub fn load_all(files: &[RawFile]) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();

    for raw in files {
        match load_registration_rows(raw) {
            Ok(file_rows) => {
                outcome.files_loaded += 1;
                outcome.rows_read += file_rows.rows_read;
                outcome.rows.extend(file_rows.rows);
                outcome.row_errors.extend(file_rows.row_errors);
            }
            Err(e) => {
                warn!("Error processing file {}: {}", raw.path.display(), e);
                outcome.failures.push(FileLoadError {
                    path: raw.path.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    outcome
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn csv_error(path: &Path, source: csv::Error) -> DashboardError {
    DashboardError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

/// Strip a UTF-8 BOM and surrounding spaces, then lower-case.
fn normalize_header_name(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

/// Column indexes of the fields a row needs.
struct ColumnMap {
    manufacturer: usize,
    categories: Vec<(Category, usize)>,
}

impl ColumnMap {
    fn resolve(path: &Path, headers: &StringRecord) -> Result<Self> {
        let by_name: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize_header_name(name), idx))
            .collect();

        let manufacturer = MANUFACTURER_COLUMNS
            .iter()
            .find_map(|name| by_name.get(*name).copied())
            .ok_or_else(|| DashboardError::MissingColumn {
                path: path.to_path_buf(),
                column: "Maker".to_string(),
            })?;

        let categories = Category::ALL
            .into_iter()
            .map(|category| {
                by_name
                    .get(&category.label().to_ascii_lowercase())
                    .map(|&idx| (category, idx))
                    .ok_or_else(|| DashboardError::MissingColumn {
                        path: path.to_path_buf(),
                        column: category.label().to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            manufacturer,
            categories,
        })
    }

    fn parse_row(&self, record: &StringRecord) -> std::result::Result<(String, CategoryCounts), String> {
        let manufacturer = record.get(self.manufacturer).unwrap_or("").trim();
        if manufacturer.is_empty() {
            return Err("missing manufacturer".to_string());
        }

        let mut counts = CategoryCounts::default();
        for &(category, idx) in &self.categories {
            let cell = record.get(idx).unwrap_or("");
            let value = parse_count(cell)
                .map_err(|e| format!("{} count for {}: {}", category, manufacturer, e))?;
            counts.set(category, value);
        }

        Ok((manufacturer.to_string(), counts))
    }
}

/// Parse a count cell. Blank cells count as zero; integral floats such as
/// `100.0` are accepted.
fn parse_count(cell: &str) -> std::result::Result<i64, String> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(0);
    }
    if let Ok(n) = cell.parse::<i64>() {
        return Ok(n);
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(format!("`{}` is not a whole number", cell)),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_csv(dir: &Path, year: i32, month_abbr: &str, month: u32, body: &str) -> RawFile {
        let folder = dir.join(year.to_string());
        std::fs::create_dir_all(&folder).unwrap();
        let path = folder.join(format!("{}-{}.csv", year, month_abbr));
        std::fs::write(&path, body).unwrap();
        RawFile {
            path,
            year,
            month,
            folder_year: year.to_string(),
        }
    }

    // ── load_registration_rows ────────────────────────────────────────────────

    #[test]
    fn test_load_basic_rows() {
        let dir = TempDir::new().unwrap();
        let raw = write_csv(
            dir.path(),
            2023,
            "JAN",
            1,
            "Maker,2W,3W,4W\nManufacturerX,100,0,50\nManufacturerY,10,20,30\n",
        );

        let out = load_registration_rows(&raw).unwrap();
        assert_eq!(out.rows_read, 2);
        assert_eq!(out.rows.len(), 2);
        assert!(out.row_errors.is_empty());

        let x = &out.rows[0];
        assert_eq!(x.manufacturer, "ManufacturerX");
        assert_eq!(x.counts.get(Category::TwoWheeler), 100);
        assert_eq!(x.counts.get(Category::ThreeWheeler), 0);
        assert_eq!(x.counts.get(Category::FourWheeler), 50);
        assert_eq!((x.year, x.month), (2023, 1));
    }

    #[test]
    fn test_load_headers_case_and_bom_insensitive() {
        let dir = TempDir::new().unwrap();
        let raw = write_csv(
            dir.path(),
            2023,
            "FEB",
            2,
            "\u{feff}maker , 4w,2w,3W\nA,1,2,3\n",
        );

        let out = load_registration_rows(&raw).unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].counts.get(Category::FourWheeler), 1);
        assert_eq!(out.rows[0].counts.get(Category::TwoWheeler), 2);
    }

    #[test]
    fn test_load_manufacturer_column_alias() {
        let dir = TempDir::new().unwrap();
        let raw = write_csv(dir.path(), 2023, "MAR", 3, "Manufacturer,2W,3W,4W\nA,1,0,0\n");
        let out = load_registration_rows(&raw).unwrap();
        assert_eq!(out.rows[0].manufacturer, "A");
    }

    #[test]
    fn test_load_missing_category_column_fails() {
        let dir = TempDir::new().unwrap();
        let raw = write_csv(dir.path(), 2023, "APR", 4, "Maker,2W,4W\nA,1,2\n");
        let err = load_registration_rows(&raw).unwrap_err();
        assert!(matches!(
            err,
            DashboardError::MissingColumn { ref column, .. } if column == "3W"
        ));
    }

    #[test]
    fn test_load_missing_manufacturer_column_fails() {
        let dir = TempDir::new().unwrap();
        let raw = write_csv(dir.path(), 2023, "APR", 4, "Brand,2W,3W,4W\nA,1,2,3\n");
        assert!(matches!(
            load_registration_rows(&raw),
            Err(DashboardError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_load_skips_blank_manufacturer_and_bad_numbers() {
        let dir = TempDir::new().unwrap();
        let raw = write_csv(
            dir.path(),
            2023,
            "MAY",
            5,
            "Maker,2W,3W,4W\n,5,5,5\nA,abc,0,0\nB,7,,2.0\n",
        );

        let out = load_registration_rows(&raw).unwrap();
        assert_eq!(out.rows_read, 3);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].manufacturer, "B");
        assert_eq!(out.rows[0].counts.get(Category::ThreeWheeler), 0);
        assert_eq!(out.rows[0].counts.get(Category::FourWheeler), 2);

        let lines: Vec<usize> = out.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![2, 3]);
    }

    #[test]
    fn test_load_ragged_csv_fails_file() {
        let dir = TempDir::new().unwrap();
        let raw = write_csv(dir.path(), 2023, "JUN", 6, "Maker,2W,3W,4W\nA,1,2,3,4,5\n");
        assert!(matches!(
            load_registration_rows(&raw),
            Err(DashboardError::Csv { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_file_read_error() {
        let raw = RawFile {
            path: PathBuf::from("/tmp/does-not-exist-dashboard/2023/2023-JAN.csv"),
            year: 2023,
            month: 1,
            folder_year: "2023".to_string(),
        };
        assert!(matches!(
            load_registration_rows(&raw),
            Err(DashboardError::FileRead { .. })
        ));
    }

    // ── load_all ──────────────────────────────────────────────────────────────

    #[test]
    fn test_load_all_excludes_failed_files() {
        let dir = TempDir::new().unwrap();
        let good = write_csv(dir.path(), 2023, "JAN", 1, "Maker,2W,3W,4W\nA,1,2,3\n");
        let bad = write_csv(dir.path(), 2023, "FEB", 2, "Maker,2W\nA,1\n");

        let outcome = load_all(&[good, bad.clone()]);
        assert_eq!(outcome.files_loaded, 1);
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].path, bad.path);
    }

    #[test]
    fn test_load_all_empty_input() {
        let outcome = load_all(&[]);
        assert_eq!(outcome.files_loaded, 0);
        assert!(outcome.rows.is_empty());
    }

    // ── parse_count ───────────────────────────────────────────────────────────

    #[test]
    fn test_parse_count_variants() {
        assert_eq!(parse_count(""), Ok(0));
        assert_eq!(parse_count(" 42 "), Ok(42));
        assert_eq!(parse_count("-3"), Ok(-3));
        assert_eq!(parse_count("100.0"), Ok(100));
        assert!(parse_count("1.5").is_err());
        assert!(parse_count("NaN").is_err());
        assert!(parse_count("ten").is_err());
    }
}
