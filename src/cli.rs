//! CLI argument parsing using clap

use crate::config::{Config, OutputFormat, DEFAULT_CACHE_FILE};
use crate::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Inspect an mtime-keyed analysis result cache
#[derive(Parser, Debug)]
#[command(name = "lintcache")]
#[command(version)]
#[command(about = "Inspect mtime-keyed analysis result caches", long_about = None)]
pub struct Cli {
    /// Cache file to operate on
    #[arg(
        short = 'c',
        long = "cache",
        value_name = "PATH",
        default_value = DEFAULT_CACHE_FILE,
        global = true
    )]
    pub cache: PathBuf,

    /// Number of threads for parallel stat calls
    #[arg(short = 'j', long = "threads", value_name = "N", global = true)]
    pub threads: Option<usize>,

    /// Output in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Log cache scan and update decisions
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Cache operations
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every cached entry
    Show,
    /// Report which files still have a valid cached entry
    Lookup {
        /// Source files to look up
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },
    /// Check that every triplet and entry in the cache is well formed
    Verify,
}

impl Cli {
    /// Build the run configuration from the parsed arguments
    pub fn config(&self) -> Result<Config> {
        let output_format = if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Console
        };

        let config = Config {
            cache_path: self.cache.clone(),
            num_threads: self.threads.unwrap_or_else(num_cpus::get),
            output_format,
            verbose: self.verbose,
        };
        config.validate()?;
        Ok(config)
    }
}
