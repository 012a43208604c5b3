//! Console (human-readable) exporter

use crate::cache::CachedEntry;
use crate::entry::Entry;
use crate::error::Result;
use crate::export::Exporter;
use crate::record::Record;
use crate::runner::LookupRow;
use std::io::Write;

/// Human-readable console output exporter
pub struct ConsoleExporter;

fn describe(entry: &Entry) -> String {
    match entry {
        Entry::Skipped => "skipped".to_string(),
        Entry::Results(records) if records.len() == 1 => "1 record".to_string(),
        Entry::Results(records) => format!("{} records", records.len()),
    }
}

fn write_record(writer: &mut dyn Write, record: &Record) -> Result<()> {
    let fields: Vec<String> = record
        .iter()
        .map(|(field, value)| format!("{}={}", field, value))
        .collect();
    writeln!(writer, "    {}", fields.join(" "))?;
    Ok(())
}

impl Exporter for ConsoleExporter {
    fn export_listing(&self, entries: &[CachedEntry], writer: &mut dyn Write) -> Result<()> {
        for cached in entries {
            writeln!(
                writer,
                "{} (mtime {}): {}",
                cached.filename,
                cached.mtime,
                describe(&cached.entry)
            )?;
            for record in cached.entry.records() {
                write_record(writer, record)?;
            }
        }

        writeln!(writer)?;
        writeln!(writer, "Summary:")?;
        writeln!(writer, "  Cached files: {}", entries.len())?;
        writeln!(
            writer,
            "  Records: {}",
            entries.iter().map(|e| e.entry.records().len()).sum::<usize>()
        )?;
        Ok(())
    }

    fn export_lookup(&self, rows: &[LookupRow], writer: &mut dyn Write) -> Result<()> {
        for row in rows {
            match (&row.entry, &row.error) {
                (Some(entry), _) => {
                    writeln!(writer, "{}: cached, {}", row.filename, describe(entry))?
                }
                (None, Some(error)) => writeln!(writer, "{}: {}", row.filename, error)?,
                (None, None) => writeln!(writer, "{}: needs analysis", row.filename)?,
            }
        }

        let hits = rows.iter().filter(|r| r.is_hit()).count();
        writeln!(writer)?;
        writeln!(writer, "Summary:")?;
        writeln!(writer, "  Cached: {}", hits)?;
        writeln!(writer, "  Needs analysis: {}", rows.len() - hits)?;
        Ok(())
    }
}
