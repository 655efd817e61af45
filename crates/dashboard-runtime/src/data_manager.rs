//! Caller-owned cache of loaded datasets.
//!
//! Wraps [`load_dataset`] with a cache keyed by the data root and a signature
//! of its file listing. Callers use [`DataManager::get_data`] to obtain a
//! fresh-or-cached [`LoadResult`]; the manager re-lists the root on every
//! call and reloads only when a candidate file was added, removed, resized or
//! touched. Dashboard snapshots are memoised per query until the next reload.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use dashboard_core::Result;
use dashboard_data::analysis::{load_dataset, LoadResult, LoadStatus};
use dashboard_data::dataset::Dataset;
use dashboard_data::discovery::is_candidate;

use crate::snapshot::{build_snapshot, DashboardQuery, DashboardSnapshot};

// ── Listing signature ─────────────────────────────────────────────────────────

/// Identity of one candidate file as seen by the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStamp {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// Sorted stamps of every candidate file under a root, or `None` when the
/// root could not be listed.
pub type ListingSignature = Option<Vec<FileStamp>>;

/// Compute the current [`ListingSignature`] of `root`.
pub fn listing_signature(root: &Path) -> ListingSignature {
    if !root.is_dir() {
        return None;
    }
    let mut stamps = Vec::new();
    for entry in walkdir::WalkDir::new(root).follow_links(true) {
        let entry = entry.ok()?;
        if !entry.file_type().is_file() {
            continue;
        }
        if !entry.file_name().to_str().is_some_and(is_candidate) {
            continue;
        }
        let meta = entry.metadata().ok();
        stamps.push(FileStamp {
            len: meta.as_ref().map_or(0, |m| m.len()),
            modified: meta.and_then(|m| m.modified().ok()),
            path: entry.into_path(),
        });
    }
    stamps.sort_by(|a, b| a.path.cmp(&b.path));
    Some(stamps)
}

// ── DataManager ───────────────────────────────────────────────────────────────

struct CachedLoad {
    signature: ListingSignature,
    result: LoadResult,
    loaded_at: Instant,
}

/// Signature-keyed cache around the load pipeline.
///
/// # Example
/// ```no_run
/// use dashboard_runtime::data_manager::DataManager;
///
/// let mut mgr = DataManager::new("data");
/// let result = mgr.get_data(false);
/// println!("records: {}", result.dataset.len());
/// ```
pub struct DataManager {
    /// Root directory passed to discovery.
    root: PathBuf,
    /// Most recent load, with the signature it was taken under.
    cache: Option<CachedLoad>,
    /// Snapshots computed against the cached dataset.
    queries: HashMap<DashboardQuery, DashboardSnapshot>,
    /// Incremented on every reload.
    generation: u64,
    /// Why the most recent load produced no data, if it did not.
    last_error: Option<String>,
}

impl DataManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: None,
            queries: HashMap::new(),
            generation: 0,
            last_error: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the loaded data, reloading when the listing changed.
    ///
    /// When `force_refresh` is `true` the cache is bypassed. A reload drops
    /// every memoised snapshot.
    pub fn get_data(&mut self, force_refresh: bool) -> &LoadResult {
        let signature = listing_signature(&self.root);
        let needs_reload = force_refresh
            || self
                .cache
                .as_ref()
                .map_or(true, |cached| cached.signature != signature);

        if needs_reload {
            if self.cache.is_some() {
                tracing::debug!(root = %self.root.display(), "data listing changed; reloading");
            }
            self.cache = None;
            self.queries.clear();
            self.generation += 1;
        } else {
            tracing::debug!("returning cached dataset");
        }

        let root = &self.root;
        let last_error = &mut self.last_error;
        let cached = self.cache.get_or_insert_with(|| {
            let result = load_dataset(root);
            *last_error = match &result.status {
                LoadStatus::Loaded => None,
                LoadStatus::NoData(reason) => Some(reason.to_string()),
            };
            tracing::debug!(
                records = result.dataset.len(),
                files = result.metadata.files_loaded,
                "dataset cache updated"
            );
            CachedLoad {
                signature,
                result,
                loaded_at: Instant::now(),
            }
        });
        &cached.result
    }

    /// Snapshot for `query`, memoised until the dataset is reloaded.
    ///
    /// Loads the data first if nothing is cached yet; an existing cache is
    /// used as-is, call [`get_data`](Self::get_data) to pick up changes.
    pub fn snapshot(&mut self, query: &DashboardQuery) -> Result<DashboardSnapshot> {
        if self.cache.is_none() {
            self.get_data(false);
        }
        if let Some(hit) = self.queries.get(query) {
            tracing::debug!("returning memoised snapshot");
            return Ok(hit.clone());
        }

        let dataset = self
            .cache
            .as_ref()
            .map_or_else(Dataset::empty, |c| c.result.dataset.clone());
        let snapshot = build_snapshot(&dataset, query)?;
        self.queries.insert(query.clone(), snapshot.clone());
        Ok(snapshot)
    }

    /// Discard the cached load, forcing the next [`get_data`](Self::get_data)
    /// call to reload.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.queries.clear();
        tracing::debug!("cache invalidated");
    }

    /// Age of the current cache entry, or `None` if nothing is loaded.
    pub fn cache_age(&self) -> Option<std::time::Duration> {
        self.cache.as_ref().map(|c| c.loaded_at.elapsed())
    }

    /// Number of loads performed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn memoized_queries(&self) -> usize {
        self.queries.len()
    }

    /// Description of why the last load produced no data, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
