//! Row identifiers

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Identifier of a table row.
///
/// Backend records use either string ids (`_id`) or numeric ids, so both are
/// accepted. Two ids are equal only if they have the same variant and value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    /// Numeric id.
    Num(i64),
    /// String id.
    Str(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{}", n),
            Self::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for RowId {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for RowId {
    fn from(value: i64) -> Self {
        Self::Num(value)
    }
}

/// A record that can be shown as a table row.
pub trait Row {
    /// Unique id of this record within the current page.
    fn row_id(&self) -> RowId;
}
