//! Conversion between records and their positional form

use super::{Field, Record, Value, FIELD_COUNT};
use bitvec::prelude::*;

/// Marker of which schema slots are populated
type SlotMask = BitArr!(for FIELD_COUNT, in u32, Lsb0);

/// Compressed form of a record.
///
/// Holds only the populated values, in slot order, together with a mask of
/// which slots they belong to. Absent slots take no space and are never
/// confused with an explicit null.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionalRecord {
    populated: SlotMask,
    values: Vec<Value>,
}

impl Default for PositionalRecord {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionalRecord {
    /// Create a record with every slot absent
    pub fn new() -> Self {
        Self {
            populated: BitArray::ZERO,
            values: Vec::new(),
        }
    }

    /// Store a value in a 1-based slot.
    ///
    /// Returns false, leaving the record untouched, when the slot is outside
    /// the schema.
    pub fn set(&mut self, slot: usize, value: Value) -> bool {
        if slot == 0 || slot > FIELD_COUNT {
            return false;
        }
        let bit = slot - 1;
        let pos = self.populated[..bit].count_ones();
        if self.populated[bit] {
            self.values[pos] = value;
        } else {
            self.populated.set(bit, true);
            self.values.insert(pos, value);
        }
        true
    }

    /// Value in a 1-based slot, if populated
    pub fn get(&self, slot: usize) -> Option<&Value> {
        if slot == 0 || slot > FIELD_COUNT || !self.populated[slot - 1] {
            return None;
        }
        self.values.get(self.populated[..slot - 1].count_ones())
    }

    /// Populated slots in ascending order as `(slot, value)`
    pub fn slots(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.populated
            .iter_ones()
            .zip(self.values.iter())
            .map(|(bit, value)| (bit + 1, value))
    }

    /// Number of populated slots
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no slot is populated
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Encode a record against the schema
pub fn compress(record: &Record) -> PositionalRecord {
    let mut positional = PositionalRecord::new();
    for (field, value) in record.iter() {
        positional.set(field.index(), value.clone());
    }
    positional
}

/// Decode a positional record into named fields
pub fn decompress(positional: &PositionalRecord) -> Record {
    positional
        .slots()
        .filter_map(|(slot, value)| Field::from_index(slot).map(|f| (f, value.clone())))
        .collect()
}
