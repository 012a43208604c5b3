//! Export system for cache listings and lookup reports

mod console;
mod json;

use crate::cache::CachedEntry;
use crate::config::OutputFormat;
use crate::error::Result;
use crate::runner::LookupRow;
use std::io::{self, BufWriter, Write};

pub use console::ConsoleExporter;
pub use json::JsonExporter;

/// Trait for output formatting
pub trait Exporter {
    /// Write every cached entry
    fn export_listing(&self, entries: &[CachedEntry], writer: &mut dyn Write) -> Result<()>;

    /// Write the lookup result of each requested file
    fn export_lookup(&self, rows: &[LookupRow], writer: &mut dyn Write) -> Result<()>;
}

/// Create an appropriate exporter based on configuration
pub fn create_exporter(format: OutputFormat) -> Box<dyn Exporter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleExporter),
        OutputFormat::Json => Box::new(JsonExporter),
    }
}

/// Buffered writer for standard output
pub fn stdout_writer() -> Box<dyn Write> {
    Box::new(BufWriter::new(io::stdout()))
}
