//! Cached analysis of a batch of files
//!
//! Ties the cache to its collaborators: modification times decide which
//! cached entries are still valid, the analyzer recomputes the rest, and
//! fresh results are merged back into the cache file.

use crate::cache::{collect_mtimes, CacheStore, CacheUpdate, MtimeSource, UpdateOutcome};
use crate::config::Config;
use crate::entry::Entry;
use crate::error::{CacheError, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Producer of analysis results for a single file
pub trait Analyzer: Sync {
    /// Analyze `filename`, returning [`Entry::Skipped`] when it cannot be checked
    fn analyze(&self, filename: &str) -> Entry;
}

/// Outcome of a cached run
#[derive(Debug)]
pub struct RunReport {
    /// Entries in the order the files were given
    pub entries: Vec<Entry>,
    /// Files answered from the cache
    pub cache_hits: usize,
    /// Files that had to be analyzed
    pub cache_misses: usize,
    /// How the cache file was updated; `None` if the update failed
    pub update: Option<UpdateOutcome>,
}

/// Lookup result for one requested file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupRow {
    /// Requested filename
    pub filename: String,
    /// Current modification time, if it could be read
    pub mtime: Option<i64>,
    /// Cached entry, present only when still valid
    pub entry: Option<Entry>,
    /// Why the modification time could not be read
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LookupRow {
    /// Whether the file can be answered from the cache
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.entry.is_some()
    }
}

fn build_pool(config: &Config) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build()
        .map_err(|e| CacheError::InvalidConfig(format!("Failed to create thread pool: {}", e)))
}

/// Report which of `files` the cache can answer without analysis.
///
/// Unlike [`run_cached`], an unusable cache is an error here.
pub fn lookup<S: MtimeSource>(
    store: &CacheStore,
    files: &[String],
    mtime_source: &S,
    config: &Config,
) -> Result<Vec<LookupRow>> {
    let pool = build_pool(config)?;
    let mtimes = pool.install(|| collect_mtimes(mtime_source, files));

    let requests = files
        .iter()
        .zip(&mtimes)
        .filter_map(|(file, mtime)| mtime.as_ref().ok().map(|m| (file.as_str(), *m)));
    let cached = store.load(requests)?;

    Ok(files
        .iter()
        .zip(mtimes)
        .map(|(file, mtime)| match mtime {
            Ok(m) => LookupRow {
                filename: file.clone(),
                mtime: Some(m),
                // Repeated files share the first lookup
                entry: cached.get(file).cloned(),
                error: None,
            },
            Err(e) => LookupRow {
                filename: file.clone(),
                mtime: None,
                entry: None,
                error: Some(e.to_string()),
            },
        })
        .collect())
}

/// Analyze `files`, reusing cached entries whose mtime is unchanged.
///
/// A corrupted cache is treated as empty and gets replaced by the update.
/// Files whose mtime cannot be read are analyzed but not cached. A failed
/// cache update is logged and reported in [`RunReport::update`].
pub fn run_cached<A, S>(
    store: &CacheStore,
    files: &[String],
    mtime_source: &S,
    analyzer: &A,
    config: &Config,
) -> Result<RunReport>
where
    A: Analyzer,
    S: MtimeSource,
{
    let pool = build_pool(config)?;

    let mtimes: Vec<Option<i64>> = pool
        .install(|| collect_mtimes(mtime_source, files))
        .into_iter()
        .zip(files)
        .map(|(mtime, file)| match mtime {
            Ok(m) => Some(m),
            Err(e) => {
                warn!("Not caching '{}': {}", file, e);
                None
            }
        })
        .collect();

    let requests = files
        .iter()
        .zip(&mtimes)
        .filter_map(|(file, mtime)| mtime.map(|m| (file.as_str(), m)));
    let cached: HashMap<String, Entry> = store.load(requests).unwrap_or_else(|e| {
        warn!(
            "Ignoring unusable cache '{}': {}",
            store.path().display(),
            e
        );
        HashMap::new()
    });

    let misses: Vec<usize> = (0..files.len())
        .filter(|&i| !cached.contains_key(&files[i]))
        .collect();
    let fresh: Vec<Entry> = pool.install(|| {
        misses
            .par_iter()
            .map(|&i| analyzer.analyze(&files[i]))
            .collect()
    });

    let updates: Vec<CacheUpdate> = misses
        .iter()
        .zip(&fresh)
        .filter_map(|(&i, entry)| {
            mtimes[i].map(|m| CacheUpdate::new(files[i].clone(), m, entry.clone()))
        })
        .collect();

    let update = match store.update(&updates) {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!("Failed to update cache '{}': {}", store.path().display(), e);
            None
        }
    };

    let mut fresh_by_index: HashMap<usize, Entry> = misses.iter().copied().zip(fresh).collect();
    let entries: Vec<Entry> = (0..files.len())
        .map(|i| {
            fresh_by_index
                .remove(&i)
                .or_else(|| cached.get(&files[i]).cloned())
                .unwrap_or(Entry::Skipped)
        })
        .collect();

    let cache_misses = misses.len();
    let cache_hits = files.len() - cache_misses;
    debug!("Cache: {} hits, {} misses", cache_hits, cache_misses);

    Ok(RunReport {
        entries,
        cache_hits,
        cache_misses,
        update,
    })
}
