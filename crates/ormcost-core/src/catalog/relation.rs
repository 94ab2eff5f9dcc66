//! Relation definitions between entities.

use serde::{Deserialize, Serialize};

/// Cardinality of a navigation edge, seen from the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// At most one child per parent row (reference navigation).
    OneToOne,
    /// Any number of children per parent row (collection navigation).
    OneToMany,
}

/// A directed navigation edge `parent -> child`.
///
/// `foreign_key` is a column of the parent whose value is matched against the
/// child's primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDef {
    /// Relation name (unique within schema).
    pub name: String,
    /// Entity the navigation starts from.
    pub parent: String,
    /// Entity the navigation reaches.
    pub child: String,
    /// Key column on the parent entity.
    pub foreign_key: String,
    /// Relation cardinality.
    pub cardinality: Cardinality,
    /// Average children per parent for one-to-many edges, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_fanout: Option<f64>,
}

impl RelationDef {
    /// Create a one-to-one relation.
    pub fn one_to_one(
        name: impl Into<String>,
        parent: impl Into<String>,
        foreign_key: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            child: child.into(),
            foreign_key: foreign_key.into(),
            cardinality: Cardinality::OneToOne,
            average_fanout: None,
        }
    }

    /// Create a one-to-many relation.
    pub fn one_to_many(
        name: impl Into<String>,
        parent: impl Into<String>,
        foreign_key: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            child: child.into(),
            foreign_key: foreign_key.into(),
            cardinality: Cardinality::OneToMany,
            average_fanout: None,
        }
    }

    /// Set the observed or estimated average fan-out.
    pub fn with_fanout(mut self, fanout: f64) -> Self {
        self.average_fanout = Some(fanout);
        self
    }

    /// Check if this is a one-to-many relation.
    pub fn is_one_to_many(&self) -> bool {
        self.cardinality == Cardinality::OneToMany
    }

    /// Check if parent and child are the same entity.
    pub fn is_self_referencing(&self) -> bool {
        self.parent == self.child
    }
}

/// Whether a fan-out value can be used for row arithmetic.
pub(crate) fn is_valid_fanout(fanout: f64) -> bool {
    fanout.is_finite() && fanout > 0.0
}
