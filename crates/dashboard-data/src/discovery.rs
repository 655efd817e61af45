//! Discovery of monthly registration files under a data root.
//!
//! Files follow `<root>/<YEAR>/<YEAR>-<MON>.csv`. Every candidate (a `.csv`
//! name containing `-`) is classified as accepted or rejected; rejections are
//! logged and recorded, never fatal. Only a failure to list a directory ends
//! the pass.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use dashboard_core::calendar::{parse_month_abbr, MonthPeriod};
use dashboard_core::models::RawFile;
use dashboard_core::{DashboardError, Result};
use regex::Regex;
use tracing::{debug, warn};

// ── Classification ────────────────────────────────────────────────────────────

/// Why a candidate file was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Name is not `<digits>-<letters>.csv`.
    MalformedName,
    /// Month part is not a recognised three-letter abbreviation.
    UnknownMonth(String),
    /// Containing directory is not named after the filename year.
    FolderMismatch { folder: String, year: String },
    /// Another file already supplied this year and month.
    DuplicatePeriod { first: PathBuf },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MalformedName => write!(f, "unexpected name format"),
            RejectReason::UnknownMonth(m) => write!(f, "unknown month abbreviation `{}`", m),
            RejectReason::FolderMismatch { folder, year } => {
                write!(f, "folder `{}` does not match file year `{}`", folder, year)
            }
            RejectReason::DuplicatePeriod { first } => {
                write!(f, "period already loaded from {}", first.display())
            }
        }
    }
}

/// Outcome of inspecting one candidate path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Accepted(RawFile),
    Rejected(RejectReason),
}

/// A candidate file and what discovery decided about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsideredFile {
    pub path: PathBuf,
    pub verdict: Classification,
}

impl ConsideredFile {
    pub fn is_accepted(&self) -> bool {
        matches!(self.verdict, Classification::Accepted(_))
    }
}

/// Result of one discovery pass.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Accepted files, in walk order (sorted by path within each folder).
    pub accepted: Vec<RawFile>,
    /// Every candidate file considered, accepted or not.
    pub considered: Vec<ConsideredFile>,
}

impl DiscoveryReport {
    pub fn rejected_count(&self) -> usize {
        self.considered.iter().filter(|c| !c.is_accepted()).count()
    }
}

fn file_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<year>[0-9]+)-(?P<month>[A-Za-z]+)\.csv$").expect("regex is valid")
    })
}

/// `true` for names discovery should look at at all.
pub fn is_candidate(file_name: &str) -> bool {
    file_name.ends_with(".csv") && file_name.contains('-')
}

/// Classify one candidate path by its name and parent folder.
pub fn classify(path: &Path) -> Classification {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return Classification::Rejected(RejectReason::MalformedName);
    };
    let Some(caps) = file_name_pattern().captures(file_name) else {
        return Classification::Rejected(RejectReason::MalformedName);
    };
    let year_text = &caps["year"];
    let month_text = &caps["month"];

    let Some(month) = parse_month_abbr(month_text) else {
        return Classification::Rejected(RejectReason::UnknownMonth(month_text.to_string()));
    };

    let folder = path
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string();
    if folder != year_text {
        return Classification::Rejected(RejectReason::FolderMismatch {
            folder,
            year: year_text.to_string(),
        });
    }

    let Some(year) = year_text
        .parse::<i32>()
        .ok()
        .filter(|y| MonthPeriod::new(*y, month).is_some())
    else {
        return Classification::Rejected(RejectReason::MalformedName);
    };

    Classification::Accepted(RawFile {
        path: path.to_path_buf(),
        year,
        month,
        folder_year: folder,
    })
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Walk `root` recursively and classify every candidate data file.
///
/// Returns [`DashboardError::DirectoryUnreadable`] when `root` (or any
/// directory beneath it) cannot be listed.
pub fn discover_files(root: &Path) -> Result<DiscoveryReport> {
    if !root.is_dir() {
        return Err(DashboardError::DirectoryUnreadable {
            path: root.to_path_buf(),
            message: "not a readable directory".to_string(),
        });
    }

    let mut report = DiscoveryReport::default();
    let mut seen: HashMap<MonthPeriod, PathBuf> = HashMap::new();

    let walker = walkdir::WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|e| DashboardError::DirectoryUnreadable {
            path: e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf()),
            message: e.to_string(),
        })?;

        if !entry.file_type().is_file() {
            continue;
        }
        let is_candidate_name = entry
            .file_name()
            .to_str()
            .map(is_candidate)
            .unwrap_or(false);
        if !is_candidate_name {
            continue;
        }

        let path = entry.into_path();
        let verdict = match classify(&path) {
            Classification::Accepted(raw) => match raw.period() {
                Some(period) if seen.contains_key(&period) => {
                    Classification::Rejected(RejectReason::DuplicatePeriod {
                        first: seen[&period].clone(),
                    })
                }
                Some(period) => {
                    seen.insert(period, path.clone());
                    report.accepted.push(raw.clone());
                    Classification::Accepted(raw)
                }
                None => Classification::Rejected(RejectReason::MalformedName),
            },
            rejected => rejected,
        };

        match &verdict {
            Classification::Accepted(raw) => {
                debug!(file = %path.display(), year = raw.year, month = raw.month, "accepted data file");
            }
            Classification::Rejected(reason) => {
                warn!(file = %path.display(), reason = %reason, "skipping data file");
            }
        }

        report.considered.push(ConsideredFile { path, verdict });
    }

    debug!(
        "Discovery under {}: {} considered, {} accepted",
        root.display(),
        report.considered.len(),
        report.accepted.len()
    );

    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
