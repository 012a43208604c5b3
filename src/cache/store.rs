//! Cache lookup and incremental update

use super::triplet::{open_triplets, read_triplets, write_triplets, Triplet};
use crate::entry::{parse, serialize, Entry};
use crate::error::{CacheError, Result};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Freshly computed result for one source file
#[derive(Debug, Clone, PartialEq)]
pub struct CacheUpdate {
    /// Source filename
    pub filename: String,
    /// Modification time the result was computed against
    pub mtime: i64,
    /// Result to store
    pub entry: Entry,
}

impl CacheUpdate {
    /// Create an update for one file
    pub fn new(filename: impl Into<String>, mtime: i64, entry: Entry) -> Self {
        Self {
            filename: filename.into(),
            mtime,
            entry,
        }
    }
}

/// How an update changed the cache file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Nothing to write; the file was left untouched
    Unchanged,
    /// New triplets were appended to the end of the file
    Appended,
    /// An existing triplet changed and the whole file was rewritten
    Rewritten,
}

impl UpdateOutcome {
    /// Whether the update left every existing triplet unmodified
    #[inline]
    pub fn is_append_only(self) -> bool {
        !matches!(self, UpdateOutcome::Rewritten)
    }
}

/// A fully validated entry read back from the cache file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedEntry {
    /// Source filename
    pub filename: String,
    /// Recorded modification time
    pub mtime: i64,
    /// Stored result
    pub entry: Entry,
}

/// Look up cached entries for a set of files.
///
/// `requests` pairs each filename with its current modification time; when
/// a filename is requested more than once, the last mtime given for it is
/// the one checked. Only the first triplet found for a filename is
/// considered, and its entry is returned only when the recorded mtime
/// matches. Files without a usable
/// entry are absent from the result. A missing cache file is an empty cache;
/// a malformed triplet or blob anywhere in the scanned part of the file
/// fails the whole lookup.
///
/// Scanning stops as soon as every requested filename has been seen.
pub fn load<'a, I>(path: &Path, requests: I) -> Result<HashMap<String, Entry>>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut pending: HashMap<&str, i64> = requests.into_iter().collect();

    let mut found = HashMap::new();
    if pending.is_empty() {
        return Ok(found);
    }

    let Some(reader) = open_triplets(path)? else {
        debug!("No cache file at '{}'", path.display());
        return Ok(found);
    };

    for triplet in reader {
        let triplet = triplet?;
        let Some(expected) = pending.remove(triplet.filename.as_str()) else {
            continue;
        };

        if triplet.mtime == expected {
            let entry = parse(&triplet.blob).map_err(|source| CacheError::InvalidBlob {
                filename: triplet.filename.clone(),
                source,
            })?;
            found.insert(triplet.filename, entry);
        } else {
            debug!(
                "Stale cache entry for '{}': cached mtime {}, current {}",
                triplet.filename, triplet.mtime, expected
            );
        }

        if pending.is_empty() {
            break;
        }
    }

    debug!(
        "Cache lookup in '{}': {} hits, {} not found",
        path.display(),
        found.len(),
        pending.len()
    );
    Ok(found)
}

/// Merge freshly computed results into the cache file.
///
/// Existing triplets for updated filenames are refreshed in place, which
/// forces a full rewrite; filenames not yet cached are added at the end,
/// once each, taking the first occurrence when a filename is repeated.
/// When no existing triplet changes, new triplets are appended without
/// touching the rest of the file.
///
/// A file with a malformed triplet is repaired by a full rewrite: the
/// triplets before the damage are kept and everything from the first bad
/// line on is dropped. Blobs are not validated here.
///
/// Rewrites go through a temporary file that replaces the cache only once
/// fully written, so a failed rewrite leaves the previous contents intact.
pub fn update(path: &Path, updates: &[CacheUpdate]) -> Result<UpdateOutcome> {
    if let Some(bad) = updates.iter().find(|u| u.filename.contains(['\n', '\r'])) {
        return Err(CacheError::InvalidFilename(bad.filename.clone()));
    }

    let (mut existing, mut rewrite) = read_valid_prefix(path)?;

    let mut first_index: HashMap<&str, usize> = HashMap::new();
    for (i, u) in updates.iter().enumerate() {
        first_index.entry(u.filename.as_str()).or_insert(i);
    }
    let mut blobs: HashMap<usize, String> = first_index
        .values()
        .map(|&i| (i, serialize(&updates[i].entry)))
        .collect();

    // Pass 1: refresh triplets already in the file
    let mut refreshed: HashSet<usize> = HashSet::new();
    for triplet in &mut existing {
        if let Some(&i) = first_index.get(triplet.filename.as_str()) {
            triplet.mtime = updates[i].mtime;
            triplet.blob = blobs[&i].clone();
            refreshed.insert(i);
            rewrite = true;
        }
    }

    // Pass 2: new files, first occurrence only
    let mut added = Vec::new();
    for (i, u) in updates.iter().enumerate() {
        if first_index[u.filename.as_str()] != i || refreshed.contains(&i) {
            continue;
        }
        added.push(Triplet {
            filename: u.filename.clone(),
            mtime: u.mtime,
            blob: blobs.remove(&i).unwrap_or_default(),
        });
    }

    if rewrite {
        debug!(
            "Rewriting cache '{}': {} refreshed, {} added",
            path.display(),
            refreshed.len(),
            added.len()
        );
        rewrite_file(path, existing.iter().chain(added.iter()))?;
        Ok(UpdateOutcome::Rewritten)
    } else if added.is_empty() {
        Ok(UpdateOutcome::Unchanged)
    } else {
        debug!("Appending {} entries to cache '{}'", added.len(), path.display());
        append_file(path, &added)?;
        Ok(UpdateOutcome::Appended)
    }
}

/// Triplets up to the first malformed one, and whether any damage was found
fn read_valid_prefix(path: &Path) -> Result<(Vec<Triplet>, bool)> {
    let mut triplets = Vec::new();
    let Some(reader) = open_triplets(path)? else {
        return Ok((triplets, false));
    };

    for triplet in reader {
        match triplet {
            Ok(triplet) => triplets.push(triplet),
            Err(e @ CacheError::MalformedTriplet { .. }) => {
                warn!(
                    "Dropping damaged tail of cache file '{}' ({} triplets kept): {}",
                    path.display(),
                    triplets.len(),
                    e
                );
                return Ok((triplets, true));
            }
            Err(e) => return Err(e),
        }
    }
    Ok((triplets, false))
}

fn write_error(path: &Path, e: impl std::fmt::Display) -> CacheError {
    CacheError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

fn append_file(path: &Path, triplets: &[Triplet]) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| write_error(path, e))?;

    let needs_newline = ends_without_newline(&mut file).map_err(|e| write_error(path, e))?;

    let mut writer = BufWriter::new(file);
    if needs_newline {
        writer.write_all(b"\n").map_err(|e| write_error(path, e))?;
    }
    write_triplets(&mut writer, triplets).map_err(|e| write_error(path, e))?;
    writer.flush().map_err(|e| write_error(path, e))
}

/// Whether a non-empty file lacks a trailing line break
fn ends_without_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

fn rewrite_file<'a, I>(path: &Path, triplets: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Triplet>,
{
    replace_file(path, |writer| write_triplets(writer, triplets))
}

/// Write new contents to a temporary sibling and rename it over `path`.
///
/// The temporary file takes the permissions of the file it replaces. It is
/// removed again if `write` or the rename fails.
fn replace_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> std::io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| write_error(path, e))?;

    if let Ok(metadata) = std::fs::metadata(path) {
        tmp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(|e| write_error(path, e))?;
    }

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer).map_err(|e| write_error(path, e))?;
        writer.flush().map_err(|e| write_error(path, e))?;
    }

    tmp.persist(path).map_err(|e| write_error(path, e.error))?;
    Ok(())
}

/// Cache file handle bound to one path
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    /// Create a store for the cache file at `path`; nothing is read yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// See [`load`]
    pub fn load<'a, I>(&self, requests: I) -> Result<HashMap<String, Entry>>
    where
        I: IntoIterator<Item = (&'a str, i64)>,
    {
        load(&self.path, requests)
    }

    /// See [`update`]
    pub fn update(&self, updates: &[CacheUpdate]) -> Result<UpdateOutcome> {
        update(&self.path, updates)
    }

    /// Every triplet in file order, with blobs parsed and validated
    pub fn entries(&self) -> Result<Vec<CachedEntry>> {
        read_triplets(&self.path)?
            .into_iter()
            .map(|t| {
                let entry = parse(&t.blob).map_err(|source| CacheError::InvalidBlob {
                    filename: t.filename.clone(),
                    source,
                })?;
                Ok(CachedEntry {
                    filename: t.filename,
                    mtime: t.mtime,
                    entry,
                })
            })
            .collect()
    }

    /// Validate the whole cache file, returning the number of triplets
    pub fn verify(&self) -> Result<usize> {
        self.entries().map(|entries| entries.len())
    }
}
