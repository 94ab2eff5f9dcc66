//! Schema model for the analyzer.
//!
//! The catalog describes entities, their width-typed columns, and the
//! navigation edges between them. It is built once through [`SchemaBuilder`]
//! and then frozen into a read-only [`Schema`] shared by every analysis.

mod column;
mod entity;
mod relation;
mod schema;

pub use column::ColumnDef;
pub use entity::EntityDef;
pub use relation::{Cardinality, RelationDef};
pub(crate) use relation::is_valid_fanout;
pub use schema::{Schema, SchemaBuilder, SchemaDef};
