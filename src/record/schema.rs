//! Fixed field schema for records

use serde::{Serialize, Serializer};
use std::fmt;

/// Number of fields in the schema
pub const FIELD_COUNT: usize = 22;

/// A named record field.
///
/// Variant order is the on-disk slot order. Reordering, inserting or
/// removing a variant silently changes the meaning of existing cache files,
/// which must then be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Code,
    Name,
    Line,
    Column,
    PrevLine,
    PrevColumn,
    Secondary,
    Func,
    Vararg,
    Filtered,
    Top,
    Invalid,
    Unpaired,
    ReadOnly,
    Global,
    Filtered111,
    Filtered121,
    Filtered131,
    Filtered112,
    Filtered122,
    Definition,
    InModule,
}

impl Field {
    /// All fields in slot order
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Code,
        Field::Name,
        Field::Line,
        Field::Column,
        Field::PrevLine,
        Field::PrevColumn,
        Field::Secondary,
        Field::Func,
        Field::Vararg,
        Field::Filtered,
        Field::Top,
        Field::Invalid,
        Field::Unpaired,
        Field::ReadOnly,
        Field::Global,
        Field::Filtered111,
        Field::Filtered121,
        Field::Filtered131,
        Field::Filtered112,
        Field::Filtered122,
        Field::Definition,
        Field::InModule,
    ];

    /// 1-based slot of the field in a positional record
    #[inline]
    pub fn index(self) -> usize {
        self as usize + 1
    }

    /// Field stored in the given 1-based slot
    pub fn from_index(index: usize) -> Option<Field> {
        index.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    /// Field with the given name
    pub fn from_name(name: &str) -> Option<Field> {
        Self::ALL.iter().copied().find(|f| f.name() == name)
    }

    /// Name of the field
    pub fn name(self) -> &'static str {
        match self {
            Field::Code => "code",
            Field::Name => "name",
            Field::Line => "line",
            Field::Column => "column",
            Field::PrevLine => "prev_line",
            Field::PrevColumn => "prev_column",
            Field::Secondary => "secondary",
            Field::Func => "func",
            Field::Vararg => "vararg",
            Field::Filtered => "filtered",
            Field::Top => "top",
            Field::Invalid => "invalid",
            Field::Unpaired => "unpaired",
            Field::ReadOnly => "read_only",
            Field::Global => "global",
            Field::Filtered111 => "filtered_111",
            Field::Filtered121 => "filtered_121",
            Field::Filtered131 => "filtered_131",
            Field::Filtered112 => "filtered_112",
            Field::Filtered122 => "filtered_122",
            Field::Definition => "definition",
            Field::InModule => "in_module",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
