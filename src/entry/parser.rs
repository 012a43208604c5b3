//! Blob to entry parsing
//!
//! Blobs are read with a small recursive-descent reader over a closed
//! literal grammar:
//!
//! ```text
//! chunk  := 'return' value EOF
//! value  := 'true' | 'false' | number | string | table
//! number := ['-'] (digits ['.' digits] [exp] | 'inf' | 'nan')
//! table  := '{' [item ((',' | ';') item)* [',' | ';']] '}'
//! item   := '[' integer ']' '=' value | value
//! ```
//!
//! There are no names, calls or operators in the grammar, so a corrupted or
//! hostile cache file can only ever produce a [`ParseError`].

use super::Entry;
use crate::error::ParseError;
use crate::record::{decompress, PositionalRecord, Value};
use std::collections::btree_map::{BTreeMap, Entry as MapEntry};

/// Maximum table nesting accepted before giving up
const MAX_DEPTH: usize = 64;

type ParseResult<T> = std::result::Result<T, ParseError>;

/// A literal read from a blob, before shape validation
#[derive(Debug)]
enum Literal {
    Scalar(Value),
    Table(Table),
}

/// Table literal; keys are 1-based indices
#[derive(Debug)]
struct Table {
    offset: usize,
    items: BTreeMap<u64, Literal>,
}

/// Parse a blob back into an entry
pub fn parse(blob: &str) -> ParseResult<Entry> {
    let mut reader = Reader::new(blob);
    reader.skip_ws();
    let start = reader.pos;
    if reader.word() != Some("return") {
        return Err(ParseError::new(start, "expected 'return'"));
    }
    let literal = reader.value(0)?;
    reader.skip_ws();
    if !reader.at_end() {
        return Err(reader.error("unexpected trailing input"));
    }
    into_entry(literal, start)
}

/// Check the shape of a literal and build the entry
fn into_entry(literal: Literal, offset: usize) -> ParseResult<Entry> {
    let table = match literal {
        Literal::Scalar(Value::Bool(false)) => return Ok(Entry::Skipped),
        Literal::Scalar(other) => {
            return Err(ParseError::new(
                offset,
                format!("expected 'false' or a table, found {}", other),
            ))
        }
        Literal::Table(table) => table,
    };

    let mut records = Vec::with_capacity(table.items.len());
    for (expected, (index, item)) in (1u64..).zip(table.items) {
        if index != expected {
            return Err(ParseError::new(
                table.offset,
                format!("record list has no element {}", expected),
            ));
        }
        let Literal::Table(record) = item else {
            return Err(ParseError::new(
                table.offset,
                format!("record {} is not a table", index),
            ));
        };
        records.push(decompress(&into_positional(record)?));
    }
    Ok(Entry::Results(records))
}

fn into_positional(table: Table) -> ParseResult<PositionalRecord> {
    let mut positional = PositionalRecord::new();
    for (slot, item) in table.items {
        let Literal::Scalar(value) = item else {
            return Err(ParseError::new(
                table.offset,
                format!("field {} is not a scalar", slot),
            ));
        };
        let in_schema = usize::try_from(slot)
            .map(|slot| positional.set(slot, value))
            .unwrap_or(false);
        if !in_schema {
            return Err(ParseError::new(
                table.offset,
                format!("field index {} is outside the schema", slot),
            ));
        }
    }
    Ok(positional)
}

/// Byte cursor over a blob
struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, reason: impl Into<String>) -> ParseError {
        ParseError::new(self.pos, reason)
    }

    #[inline]
    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> ParseResult<()> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", byte as char)))
        }
    }

    /// Read an identifier-like word, if one starts here
    fn word(&mut self) -> Option<&'a str> {
        let start = self.pos;
        if !matches!(self.peek(), Some(b) if b.is_ascii_alphabetic() || b == b'_') {
            return None;
        }
        while matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }
        let src = self.src;
        Some(&src[start..self.pos])
    }

    fn value(&mut self, depth: usize) -> ParseResult<Literal> {
        self.skip_ws();
        match self.peek() {
            Some(b'{') => {
                if depth >= MAX_DEPTH {
                    return Err(self.error("tables nested too deeply"));
                }
                self.table(depth + 1).map(Literal::Table)
            }
            Some(b'"' | b'\'') => self.string().map(|s| Literal::Scalar(Value::Str(s))),
            Some(b'-' | b'.' | b'0'..=b'9') => self.number().map(Literal::Scalar),
            Some(b) if b.is_ascii_alphabetic() || b == b'_' => {
                let start = self.pos;
                match self.word() {
                    Some("true") => Ok(Literal::Scalar(Value::Bool(true))),
                    Some("false") => Ok(Literal::Scalar(Value::Bool(false))),
                    Some("inf") => Ok(Literal::Scalar(Value::Float(f64::INFINITY))),
                    Some("nan") => Ok(Literal::Scalar(Value::Float(f64::NAN))),
                    Some(other) => Err(ParseError::new(
                        start,
                        format!("unexpected name '{}'", other),
                    )),
                    None => Err(ParseError::new(start, "expected a value")),
                }
            }
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn table(&mut self, depth: usize) -> ParseResult<Table> {
        let offset = self.pos;
        self.expect(b'{')?;
        let mut items = BTreeMap::new();
        let mut next_positional = 1u64;

        loop {
            self.skip_ws();
            if self.peek() == Some(b'}') {
                self.pos += 1;
                break;
            }

            let key_pos = self.pos;
            let key = if self.peek() == Some(b'[') {
                self.pos += 1;
                let key = self.index()?;
                self.expect(b']')?;
                self.expect(b'=')?;
                key
            } else {
                next_positional += 1;
                next_positional - 1
            };

            let value = self.value(depth)?;
            match items.entry(key) {
                MapEntry::Vacant(slot) => {
                    slot.insert(value);
                }
                MapEntry::Occupied(_) => {
                    return Err(ParseError::new(
                        key_pos,
                        format!("index {} assigned twice", key),
                    ))
                }
            }

            self.skip_ws();
            match self.bump() {
                Some(b',' | b';') => continue,
                Some(b'}') => break,
                Some(_) => {
                    self.pos -= 1;
                    return Err(self.error("expected ',' or '}'"));
                }
                None => return Err(self.error("unfinished table")),
            }
        }

        Ok(Table { offset, items })
    }

    fn index(&mut self) -> ParseResult<u64> {
        self.skip_ws();
        let start = self.pos;
        match self.number()? {
            Value::Integer(n) if n >= 1 => Ok(n as u64),
            _ => Err(ParseError::new(
                start,
                "table index must be a positive integer",
            )),
        }
    }

    fn number(&mut self) -> ParseResult<Value> {
        let start = self.pos;
        let negative = self.peek() == Some(b'-');
        if negative {
            self.pos += 1;
        }

        if let Some(word) = self.word() {
            let magnitude = match word {
                "inf" => f64::INFINITY,
                "nan" => f64::NAN,
                _ => return Err(ParseError::new(start, "malformed number")),
            };
            return Ok(Value::Float(if negative { -magnitude } else { magnitude }));
        }

        let mut digits = 0;
        let mut is_float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' => digits += 1,
                b'.' if !is_float => is_float = true,
                _ => break,
            }
            self.pos += 1;
        }
        if digits == 0 {
            return Err(ParseError::new(start, "malformed number"));
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            is_float = true;
            self.pos += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return Err(ParseError::new(start, "malformed number"));
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b) if b.is_ascii_alphanumeric() || b == b'_' || b == b'.') {
            return Err(ParseError::new(start, "malformed number"));
        }

        let text = &self.src[start..self.pos];
        if is_float {
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| ParseError::new(start, "malformed number"))
        } else {
            text.parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| ParseError::new(start, "integer out of range"))
        }
    }

    fn string(&mut self) -> ParseResult<String> {
        let start = self.pos;
        let quote = self.bump().ok_or_else(|| self.error("expected string"))?;
        let mut bytes = Vec::new();

        loop {
            match self.bump() {
                None | Some(b'\n' | b'\r') => {
                    return Err(ParseError::new(start, "unfinished string"))
                }
                Some(b) if b == quote => break,
                Some(b'\\') => self.escape(&mut bytes)?,
                Some(b) => bytes.push(b),
            }
        }

        String::from_utf8(bytes).map_err(|_| ParseError::new(start, "string is not valid UTF-8"))
    }

    fn escape(&mut self, out: &mut Vec<u8>) -> ParseResult<()> {
        let at = self.pos - 1;
        let byte = match self.bump() {
            Some(b'n') => b'\n',
            Some(b'r') => b'\r',
            Some(b't') => b'\t',
            Some(b'a') => 0x07,
            Some(b'b') => 0x08,
            Some(b'f') => 0x0c,
            Some(b'v') => 0x0b,
            Some(b'\\') => b'\\',
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            Some(b @ b'0'..=b'9') => {
                let mut code = u32::from(b - b'0');
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'9') => {
                            code = code * 10 + u32::from(d - b'0');
                            self.pos += 1;
                        }
                        _ => break,
                    }
                }
                u8::try_from(code)
                    .map_err(|_| ParseError::new(at, "decimal escape too large"))?
            }
            Some(b'x') => {
                let hi = self.hex_digit(at)?;
                let lo = self.hex_digit(at)?;
                (hi << 4 | lo) as u8
            }
            Some(b'u') => {
                if self.bump() != Some(b'{') {
                    return Err(ParseError::new(at, "missing '{' in \\u{xxxx}"));
                }
                let mut code = 0u32;
                let mut count = 0;
                while self.peek() != Some(b'}') {
                    code = code * 16 + self.hex_digit(at)?;
                    if code > 0x10FFFF {
                        return Err(ParseError::new(at, "invalid \\u escape"));
                    }
                    count += 1;
                }
                self.pos += 1;
                let c = char::from_u32(code)
                    .filter(|_| count > 0)
                    .ok_or_else(|| ParseError::new(at, "invalid \\u escape"))?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                return Ok(());
            }
            _ => return Err(ParseError::new(at, "invalid escape sequence")),
        };
        out.push(byte);
        Ok(())
    }

    fn hex_digit(&mut self, at: usize) -> ParseResult<u32> {
        self.bump()
            .and_then(|b| (b as char).to_digit(16))
            .ok_or_else(|| ParseError::new(at, "invalid hexadecimal escape"))
    }
}
