//! lintcache - inspect mtime-keyed analysis result caches

use clap::Parser;
use lintcache::cache::{CacheStore, FsMtime};
use lintcache::cli::{Cli, Command};
use lintcache::config::Config;
use lintcache::error::{CacheError, Result};
use lintcache::export::{create_exporter, stdout_writer};
use lintcache::runner::lookup;
use std::io::Write;
use std::process::ExitCode;

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Whether an error means the cache file itself is unusable
fn is_corruption(e: &CacheError) -> bool {
    matches!(
        e,
        CacheError::MalformedTriplet { .. } | CacheError::InvalidBlob { .. }
    )
}

fn run(command: &Command, config: &Config, writer: &mut dyn Write) -> Result<ExitCode> {
    let store = CacheStore::new(&config.cache_path);
    let exporter = create_exporter(config.output_format);

    match command {
        Command::Show => {
            let entries = store.entries()?;
            exporter.export_listing(&entries, writer)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Lookup { files } => {
            let rows = lookup(&store, files, &FsMtime, config)?;
            exporter.export_lookup(&rows, writer)?;
            if rows.iter().all(|r| r.is_hit()) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(1)) // Some files need analysis
            }
        }
        Command::Verify => {
            let count = store.verify()?;
            writeln!(
                writer,
                "{}: {} entries OK",
                store.path().display(),
                count
            )?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    // Parse command line arguments
    let cli = Cli::parse();

    let config = match cli.config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    init_logging(config.verbose);

    let mut writer = stdout_writer();
    let code = match run(&cli.command, &config, &mut *writer) {
        Ok(code) => code,
        Err(e) if is_corruption(&e) => {
            eprintln!("Corrupt cache '{}': {}", config.cache_path.display(), e);
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = writer.flush() {
        eprintln!("Error flushing output: {}", e);
        return ExitCode::from(2);
    }

    code
}
