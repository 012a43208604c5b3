//! Cached per-file entries and their textual blob form
//!
//! A blob is a single-line literal expression: `return false` for a file
//! whose analysis was skipped, or `return { ... }` holding one positional
//! table per record.

mod parser;
mod serializer;

pub use parser::parse;
pub use serializer::serialize;

use crate::record::Record;
use serde::Serialize;

/// The complete cached outcome for one source file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "records", rename_all = "snake_case")]
pub enum Entry {
    /// Analysis was not run or produced no usable result
    Skipped,
    /// Findings for the file, possibly none
    Results(Vec<Record>),
}

impl Entry {
    /// Records of the entry, empty when skipped
    pub fn records(&self) -> &[Record] {
        match self {
            Entry::Skipped => &[],
            Entry::Results(records) => records,
        }
    }

    /// Whether the entry is the skipped sentinel
    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Entry::Skipped)
    }
}
