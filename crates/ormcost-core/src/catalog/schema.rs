//! Schema construction and the frozen, read-only schema.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::relation::is_valid_fanout;
use super::{EntityDef, RelationDef};
use crate::error::{Error, Result};

/// Mutable schema under construction.
///
/// Every `add_*` call validates its argument against what is already
/// declared. A failed call leaves the builder unchanged.
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    entities: BTreeMap<String, EntityDef>,
    relations: BTreeMap<String, RelationDef>,
}

impl SchemaBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an entity.
    pub fn add_entity(&mut self, entity: EntityDef) -> Result<&mut Self> {
        if self.entities.contains_key(&entity.name) {
            return Err(Error::DuplicateEntity {
                entity: entity.name,
            });
        }

        let mut seen = HashSet::with_capacity(entity.columns.len());
        for column in &entity.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(Error::DuplicateColumn {
                    entity: entity.name.clone(),
                    column: column.name.clone(),
                });
            }
            if column.byte_width == 0 {
                return Err(Error::InvalidColumnWidth {
                    entity: entity.name.clone(),
                    column: column.name.clone(),
                });
            }
        }

        if entity.get_primary_key().is_none() {
            return Err(Error::UnknownColumn {
                entity: entity.name.clone(),
                column: entity.primary_key.clone(),
            });
        }

        self.entities.insert(entity.name.clone(), entity);
        Ok(self)
    }

    /// Declare a relation between two already declared entities.
    pub fn add_relation(&mut self, relation: RelationDef) -> Result<&mut Self> {
        if self.relations.contains_key(&relation.name) {
            return Err(Error::DuplicateRelation {
                relation: relation.name,
            });
        }

        let parent = self
            .entities
            .get(&relation.parent)
            .ok_or_else(|| Error::UnknownEntity {
                relation: relation.name.clone(),
                entity: relation.parent.clone(),
            })?;

        if !self.entities.contains_key(&relation.child) {
            return Err(Error::UnknownEntity {
                relation: relation.name.clone(),
                entity: relation.child.clone(),
            });
        }

        if parent.get_column(&relation.foreign_key).is_none() {
            return Err(Error::UnknownColumn {
                entity: relation.parent.clone(),
                column: relation.foreign_key.clone(),
            });
        }

        if let Some(fanout) = relation.average_fanout {
            if !is_valid_fanout(fanout) {
                return Err(Error::InvalidFanout {
                    relation: relation.name,
                    fanout,
                });
            }
        }

        self.relations.insert(relation.name.clone(), relation);
        Ok(self)
    }

    /// Add an entity, consuming and returning the builder.
    pub fn with_entity(mut self, entity: EntityDef) -> Result<Self> {
        self.add_entity(entity)?;
        Ok(self)
    }

    /// Add a relation, consuming and returning the builder.
    pub fn with_relation(mut self, relation: RelationDef) -> Result<Self> {
        self.add_relation(relation)?;
        Ok(self)
    }

    /// Finish construction. The returned schema cannot be mutated.
    pub fn freeze(self) -> Schema {
        debug!(
            entities = self.entities.len(),
            relations = self.relations.len(),
            "Schema frozen"
        );
        Schema {
            entities: self.entities,
            relations: self.relations,
        }
    }
}

/// A frozen schema, shared read-only by every analysis.
#[derive(Debug, Clone)]
pub struct Schema {
    entities: BTreeMap<String, EntityDef>,
    relations: BTreeMap<String, RelationDef>,
}

impl Schema {
    /// Look up an entity by name.
    pub fn resolve(&self, entity: &str) -> Result<&EntityDef> {
        self.entities
            .get(entity)
            .ok_or_else(|| Error::entity_not_found(entity))
    }

    /// Look up a relation by name.
    pub fn resolve_relation(&self, name: &str) -> Result<&RelationDef> {
        self.relations
            .get(name)
            .ok_or_else(|| Error::relation_not_found(name))
    }

    /// Sum of the byte widths of `columns`, or of every column when `None`.
    ///
    /// Each column may be named once.
    pub fn row_width(&self, entity: &str, columns: Option<&[String]>) -> Result<u64> {
        let def = self.resolve(entity)?;
        let Some(columns) = columns else {
            return Ok(def.full_width());
        };

        let mut seen = HashSet::new();
        columns.iter().try_fold(0u64, |width, name| {
            let column = def.get_column(name).ok_or_else(|| Error::UnknownColumn {
                entity: def.name.clone(),
                column: name.clone(),
            })?;
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicateColumn {
                    entity: def.name.clone(),
                    column: name.clone(),
                });
            }
            Ok(width + u64::from(column.byte_width))
        })
    }

    /// All relations navigating out of `entity`, ordered by name.
    pub fn relations_from(&self, entity: &str) -> Vec<&RelationDef> {
        self.relations
            .values()
            .filter(|r| r.parent == entity)
            .collect()
    }

    /// List all entity names.
    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.keys().map(|s| s.as_str()).collect()
    }

    /// Export the schema as a serializable document.
    pub fn to_def(&self) -> SchemaDef {
        SchemaDef {
            entities: self.entities.values().cloned().collect(),
            relations: self.relations.values().cloned().collect(),
        }
    }
}

/// Serializable schema document.
///
/// Loading goes through [`SchemaBuilder`], so a document is subject to the
/// same validation as programmatic construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDef {
    /// Entity declarations, in declaration order.
    #[serde(default)]
    pub entities: Vec<EntityDef>,
    /// Relation declarations, in declaration order.
    #[serde(default)]
    pub relations: Vec<RelationDef>,
}

impl SchemaDef {
    /// Validate the document and freeze it into a schema.
    pub fn build(&self) -> Result<Schema> {
        let mut builder = SchemaBuilder::new();
        for entity in &self.entities {
            builder.add_entity(entity.clone())?;
        }
        for relation in &self.relations {
            builder.add_relation(relation.clone())?;
        }
        Ok(builder.freeze())
    }
}
