//! Error types for lintcache

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error types for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// I/O error while reading the cache file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A triplet is truncated or its mtime line is not an integer
    #[error("Malformed cache triplet at line {line}: {reason}")]
    MalformedTriplet { line: usize, reason: String },

    /// A stored blob failed to parse or has the wrong shape
    #[error("Invalid cached entry for '{filename}': {source}")]
    InvalidBlob {
        filename: String,
        #[source]
        source: ParseError,
    },

    /// Filename cannot be stored in a line-oriented file
    #[error("Filename {0:?} contains a line break and cannot be cached")]
    InvalidFilename(String),

    /// Cache file could not be written
    #[error("Failed to write cache file '{}': {reason}", path.display())]
    Write { path: PathBuf, reason: String },

    /// Modification time of a source file could not be determined
    #[error("Cannot read modification time of '{path}': {reason}")]
    Mtime { path: String, reason: String },

    /// Report could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failure to read a blob back into an entry
///
/// Every rejection of the literal reader ends up here: syntax errors,
/// constructs outside the grammar and records of the wrong shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("at offset {offset}: {reason}")]
pub struct ParseError {
    /// Byte offset into the blob where parsing stopped
    pub offset: usize,
    /// Human-readable reason
    pub reason: String,
}

impl ParseError {
    pub(crate) fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_blob_message_includes_filename_and_offset() {
        let err = CacheError::InvalidBlob {
            filename: "a.lua".to_string(),
            source: ParseError::new(7, "expected '}'"),
        };
        assert_eq!(
            err.to_string(),
            "Invalid cached entry for 'a.lua': at offset 7: expected '}'"
        );
    }

    #[test]
    fn test_malformed_triplet_message() {
        let err = CacheError::MalformedTriplet {
            line: 5,
            reason: "missing blob line".to_string(),
        };
        assert!(err.to_string().contains("line 5"));
    }
}
