//! Configuration types for lintcache

use crate::error::{CacheError, Result};
use std::path::PathBuf;

/// Default cache file name, relative to the working directory
pub const DEFAULT_CACHE_FILE: &str = ".lintcache";

/// Output format for listings and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable console output
    #[default]
    Console,
    /// JSON output with structured data
    Json,
}

/// Configuration options for lintcache
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the cache file
    pub cache_path: PathBuf,

    /// Number of threads for parallel stat and analysis (default: num_cpus)
    pub num_threads: usize,

    /// Output format (console or json)
    pub output_format: OutputFormat,

    /// Log scan and update decisions
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            num_threads: num_cpus::get(),
            output_format: OutputFormat::Console,
            verbose: false,
        }
    }
}

impl Config {
    /// Check option values that cannot be expressed in the types
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(CacheError::InvalidConfig(
                "thread count must be at least 1".to_string(),
            ));
        }
        if self.cache_path.as_os_str().is_empty() {
            return Err(CacheError::InvalidConfig(
                "cache path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
