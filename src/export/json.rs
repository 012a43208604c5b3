//! JSON exporter

use crate::cache::CachedEntry;
use crate::error::{CacheError, Result};
use crate::export::Exporter;
use crate::runner::LookupRow;
use serde::Serialize;
use std::io::Write;

/// JSON output exporter
pub struct JsonExporter;

#[derive(Serialize)]
struct JsonListing<'a> {
    entries: &'a [CachedEntry],
    summary: JsonListingSummary,
}

#[derive(Serialize)]
struct JsonListingSummary {
    cached_files: usize,
    records: usize,
}

#[derive(Serialize)]
struct JsonLookup<'a> {
    files: &'a [LookupRow],
    summary: JsonLookupSummary,
}

#[derive(Serialize)]
struct JsonLookupSummary {
    cached: usize,
    needs_analysis: usize,
}

fn write_json<T: Serialize>(value: &T, writer: &mut dyn Write) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
    writeln!(writer, "{}", json)?;
    Ok(())
}

impl Exporter for JsonExporter {
    fn export_listing(&self, entries: &[CachedEntry], writer: &mut dyn Write) -> Result<()> {
        let output = JsonListing {
            entries,
            summary: JsonListingSummary {
                cached_files: entries.len(),
                records: entries.iter().map(|e| e.entry.records().len()).sum(),
            },
        };
        write_json(&output, writer)
    }

    fn export_lookup(&self, rows: &[LookupRow], writer: &mut dyn Write) -> Result<()> {
        let cached = rows.iter().filter(|r| r.is_hit()).count();
        let output = JsonLookup {
            files: rows,
            summary: JsonLookupSummary {
                cached,
                needs_analysis: rows.len() - cached,
            },
        };
        write_json(&output, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use crate::record::{Field, Record};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_listing_json() {
        let entries = vec![CachedEntry {
            filename: "a.lua".to_string(),
            mtime: 100,
            entry: Entry::Results(vec![Record::new().with(Field::Code, "111")]),
        }];

        let mut out = Vec::new();
        JsonExporter.export_listing(&entries, &mut out).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(parsed["entries"][0]["filename"], "a.lua");
        assert_eq!(parsed["entries"][0]["mtime"], 100);
        assert_eq!(parsed["entries"][0]["entry"]["status"], "results");
        assert_eq!(parsed["entries"][0]["entry"]["records"][0]["code"], "111");
        assert_eq!(parsed["summary"]["records"], 1);
    }

    #[test]
    fn test_lookup_json_omits_missing_error() {
        let rows = vec![LookupRow {
            filename: "a.lua".to_string(),
            mtime: Some(5),
            entry: None,
            error: None,
        }];

        let mut out = Vec::new();
        JsonExporter.export_lookup(&rows, &mut out).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert!(parsed["files"][0].get("error").is_none());
        assert_eq!(parsed["files"][0]["entry"], serde_json::Value::Null);
        assert_eq!(parsed["summary"]["needs_analysis"], 1);
    }
}
