//! Column definitions for entities.

use serde::{Deserialize, Serialize};

/// Byte width of a fixed-width integer column.
pub const INT_WIDTH: u32 = 4;

/// Byte width of a fixed-width big integer column.
pub const BIGINT_WIDTH: u32 = 8;

/// A column definition within an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name (unique within its entity).
    pub name: String,
    /// Bytes this column contributes to every transferred row.
    pub byte_width: u32,
}

impl ColumnDef {
    /// Create a column with an explicit byte width.
    pub fn new(name: impl Into<String>, byte_width: u32) -> Self {
        Self {
            name: name.into(),
            byte_width,
        }
    }

    /// A fixed-width 4 byte integer column.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, INT_WIDTH)
    }

    /// A fixed-width 8 byte integer column.
    pub fn bigint(name: impl Into<String>) -> Self {
        Self::new(name, BIGINT_WIDTH)
    }

    /// A fixed-width `char(n)` column.
    pub fn char(name: impl Into<String>, n: u32) -> Self {
        Self::new(name, n)
    }
}
