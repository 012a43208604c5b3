//! lintcache - persistent result cache for per-file analysis
//!
//! Results computed for a source file are stored in a single line-oriented
//! cache file together with the file's modification time, and are handed
//! back on later runs for as long as that time is unchanged.
//!
//! ```no_run
//! use lintcache::cache::{CacheStore, CacheUpdate};
//! use lintcache::entry::Entry;
//!
//! let store = CacheStore::new(".lintcache");
//! store.update(&[CacheUpdate::new("src/a.lua", 1700000000, Entry::Skipped)])?;
//! let found = store.load([("src/a.lua", 1700000000)])?;
//! assert_eq!(found["src/a.lua"], Entry::Skipped);
//! # Ok::<(), lintcache::error::CacheError>(())
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod export;
pub mod record;
pub mod runner;

pub use cache::{load, update, CacheStore, CacheUpdate, UpdateOutcome};
pub use entry::Entry;
pub use error::{CacheError, ParseError, Result};
pub use record::{Field, Record, Value};
