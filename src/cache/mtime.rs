//! Source file modification times

use crate::error::{CacheError, Result};
use rayon::prelude::*;
use std::fs;
use std::time::UNIX_EPOCH;

/// Provider of modification times for source files.
///
/// Values are only ever compared for equality, so any stable integer
/// stamp works.
pub trait MtimeSource: Sync {
    /// Modification time of `filename`
    fn mtime(&self, filename: &str) -> Result<i64>;
}

/// Modification times from the filesystem, in whole seconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMtime;

impl MtimeSource for FsMtime {
    fn mtime(&self, filename: &str) -> Result<i64> {
        let modified = fs::metadata(filename)
            .and_then(|meta| meta.modified())
            .map_err(|e| CacheError::Mtime {
                path: filename.to_string(),
                reason: e.to_string(),
            })?;

        Ok(match modified.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_secs() as i64,
            Err(before) => -(before.duration().as_secs() as i64),
        })
    }
}

/// Query modification times for many files in parallel, preserving order
pub fn collect_mtimes<S: MtimeSource>(source: &S, files: &[String]) -> Vec<Result<i64>> {
    files.par_iter().map(|f| source.mtime(f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct FixedMtimes(HashMap<String, i64>);

    impl MtimeSource for FixedMtimes {
        fn mtime(&self, filename: &str) -> Result<i64> {
            self.0.get(filename).copied().ok_or_else(|| CacheError::Mtime {
                path: filename.to_string(),
                reason: "unknown".to_string(),
            })
        }
    }

    #[test]
    fn test_fs_mtime_of_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.lua");
        fs::write(&path, "local x = 1\n").unwrap();

        let mtime = FsMtime.mtime(path.to_str().unwrap()).unwrap();
        assert!(mtime > 0);
        assert_eq!(FsMtime.mtime(path.to_str().unwrap()).unwrap(), mtime);
    }

    #[test]
    fn test_fs_mtime_of_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.lua");
        let err = FsMtime.mtime(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, CacheError::Mtime { .. }));
    }

    #[test]
    fn test_collect_mtimes_preserves_order() {
        let source = FixedMtimes(HashMap::from([
            ("a".to_string(), 1),
            ("b".to_string(), 2),
        ]));
        let files = vec!["b".to_string(), "x".to_string(), "a".to_string()];

        let mtimes = collect_mtimes(&source, &files);
        assert_eq!(mtimes[0].as_ref().ok(), Some(&2));
        assert!(mtimes[1].is_err());
        assert_eq!(mtimes[2].as_ref().ok(), Some(&1));
    }
}
