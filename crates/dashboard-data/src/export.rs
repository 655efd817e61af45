//! Flat CSV export of a dataset view.
//!
//! One row per record. The derived date and numeric quarter are computation
//! aids and are not written; the quarter survives as its `2023Q1` label.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use dashboard_core::models::NormalizedRecord;
use dashboard_core::{DashboardError, Result};
use serde::Serialize;
use tracing::info;

/// Column layout of one exported row.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Maker")]
    manufacturer: &'a str,
    year: i32,
    month: u32,
    #[serde(rename = "Vehicle Category")]
    category: &'a str,
    #[serde(rename = "Registrations")]
    registrations: u64,
    #[serde(rename = "Quarter")]
    quarter: String,
}

impl<'a> From<&'a NormalizedRecord> for ExportRow<'a> {
    fn from(r: &'a NormalizedRecord) -> Self {
        Self {
            manufacturer: &r.manufacturer,
            year: r.year(),
            month: r.month(),
            category: r.category.label(),
            registrations: r.registrations,
            quarter: r.quarter.to_string(),
        }
    }
}

/// Write `records` as CSV with a header row to `writer`.
///
/// An empty slice still produces the header line.
pub fn write_csv<W: Write>(records: &[NormalizedRecord], writer: W) -> Result<()> {
    let mut out = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    out.write_record(EXPORT_HEADERS).map_err(export_error)?;
    for r in records {
        out.serialize(ExportRow::from(r)).map_err(export_error)?;
    }
    out.flush()?;
    Ok(())
}

/// CSV bytes for `records`, ready to hand to a download.
pub fn to_csv_bytes(records: &[NormalizedRecord]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    Ok(buf)
}

/// Write `records` to the file at `path`, replacing it if present.
pub fn export_to_path(records: &[NormalizedRecord], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(records, file)?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

/// Header row, in column order.
pub const EXPORT_HEADERS: [&str; 6] = [
    "Maker",
    "year",
    "month",
    "Vehicle Category",
    "Registrations",
    "Quarter",
];

fn export_error(source: csv::Error) -> DashboardError {
    DashboardError::Csv {
        path: "<export>".into(),
        source,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
