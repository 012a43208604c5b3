//! Entry to blob serialization

use super::Entry;
use crate::record::{compress, PositionalRecord, Value};

/// Serialize an entry into its one-line blob.
///
/// Output depends only on the entry, so equal entries always produce
/// identical bytes.
pub fn serialize(entry: &Entry) -> String {
    let records = match entry {
        Entry::Skipped => return "return false".to_string(),
        Entry::Results(records) => records,
    };

    let mut out = String::from("return {");
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_record(&mut out, &compress(record));
    }
    out.push('}');
    out
}

fn write_record(out: &mut String, record: &PositionalRecord) {
    out.push('{');
    // Next slot a positional item would fill
    let mut next_slot = 1;
    for (i, (slot, value)) in record.slots().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if slot != next_slot {
            out.push_str(&format!("[{}]=", slot));
        } else {
            next_slot += 1;
        }
        write_value(out, value);
    }
    out.push('}');
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Integer(n) => out.push_str(&n.to_string()),
        Value::Float(x) => write_float(out, *x),
        Value::Str(s) => write_string(out, s),
    }
}

fn write_float(out: &mut String, x: f64) {
    if x.is_nan() {
        out.push_str("nan");
    } else if x.is_infinite() {
        out.push_str(if x > 0.0 { "inf" } else { "-inf" });
    } else {
        // Debug keeps a '.' or exponent so the value reads back as a float
        out.push_str(&format!("{:?}", x));
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}
