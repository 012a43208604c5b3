//! Analysis result records and their positional encoding
//!
//! A record is one finding produced by the analyzer. On disk it is stored
//! positionally against a fixed field schema, so the order of [`Field`]
//! variants is part of the cache file format.

mod codec;
mod schema;
mod value;

pub use codec::{compress, decompress, PositionalRecord};
pub use schema::{Field, FIELD_COUNT};
pub use value::Value;

use serde::Serialize;
use std::collections::BTreeMap;

/// One analysis finding: a sparse mapping from schema field to value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<Field, Value>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the record with `field` set to `value`
    pub fn with(mut self, field: Field, value: impl Into<Value>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    /// Value of a field, if present
    pub fn get(&self, field: Field) -> Option<&Value> {
        self.fields.get(&field)
    }

    /// Present fields in schema order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &Value)> {
        self.fields.iter().map(|(field, value)| (*field, value))
    }

    /// Number of present fields
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is present
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(Field, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (Field, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
