//! Entity definitions.

use super::column::ColumnDef;
use serde::{Deserialize, Serialize};

/// An entity definition (table shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    /// Entity name (unique within schema).
    pub name: String,
    /// Name of the primary key column.
    pub primary_key: String,
    /// Ordered column definitions.
    pub columns: Vec<ColumnDef>,
}

impl EntityDef {
    /// Create a new entity definition with no columns.
    pub fn new(name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            columns: Vec::new(),
        }
    }

    /// Add a column to the entity.
    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// Add multiple columns.
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnDef>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get the primary key column definition.
    pub fn get_primary_key(&self) -> Option<&ColumnDef> {
        self.get_column(&self.primary_key)
    }

    /// Width of a full row: the sum of every column width.
    pub fn full_width(&self) -> u64 {
        self.columns.iter().map(|c| u64::from(c.byte_width)).sum()
    }
}
