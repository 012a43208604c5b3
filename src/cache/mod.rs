//! Persistent result cache
//!
//! The cache file is a flat sequence of three-line triplets: source
//! filename, its modification time, and the serialized entry. Entries are
//! reused only while the recorded mtime still matches the file on disk.

mod mtime;
mod store;
mod triplet;

pub use mtime::{collect_mtimes, FsMtime, MtimeSource};
pub use store::{load, update, CacheStore, CacheUpdate, CachedEntry, UpdateOutcome};
pub use triplet::{read_triplets, Triplet};
