//! Core error types.

use thiserror::Error;

/// What kind of schema item a lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// An entity (table).
    Entity,
    /// A relation (navigation edge).
    Relation,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Entity => write!(f, "entity"),
            ItemKind::Relation => write!(f, "relation"),
        }
    }
}

/// Analyzer errors.
///
/// Schema-build errors are fatal to the single `add_*` call that raised them;
/// the builder is left untouched so the caller can correct and retry.
/// Resolution and planning errors are fatal to one access pattern only.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// An entity with this name is already declared.
    #[error("entity '{entity}' is already declared")]
    DuplicateEntity { entity: String },

    /// Two columns of one entity share a name.
    #[error("column '{column}' is declared twice on entity '{entity}'")]
    DuplicateColumn { entity: String, column: String },

    /// A relation with this name is already declared.
    #[error("relation '{relation}' is already declared")]
    DuplicateRelation { relation: String },

    /// A column was declared with a zero byte width.
    #[error("column '{column}' on entity '{entity}' must have a positive byte width")]
    InvalidColumnWidth { entity: String, column: String },

    /// A relation endpoint names an entity that was never declared.
    #[error("relation '{relation}' references undeclared entity '{entity}'")]
    UnknownEntity { relation: String, entity: String },

    /// A column is not part of the entity it was looked up on.
    #[error("entity '{entity}' has no column '{column}'")]
    UnknownColumn { entity: String, column: String },

    /// A fan-out estimate that is not a finite positive number.
    #[error("relation '{relation}' has invalid fan-out {fanout}")]
    InvalidFanout { relation: String, fanout: f64 },

    /// An access pattern referenced something missing from the schema.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: ItemKind, name: String },

    /// A navigation step does not start from the entity reached so far.
    #[error(
        "step {step}: relation '{relation}' starts at '{found}', but the chain is at '{expected}'"
    )]
    InvalidNavigation {
        step: usize,
        relation: String,
        expected: String,
        found: String,
    },

    /// The navigation chain is longer than the configured maximum.
    #[error("navigation depth {depth} exceeds maximum allowed depth {max}")]
    DepthLimitExceeded { depth: usize, max: usize },

    /// A projected step selects no columns.
    #[error("step {step}: projection over relation '{relation}' selects no columns")]
    EmptyProjection { step: usize, relation: String },

    /// A scenario document could not be read or decoded.
    #[error("scenario error: {0}")]
    Scenario(String),
}

impl Error {
    /// Missing entity at resolution time.
    pub fn entity_not_found(name: impl Into<String>) -> Self {
        Error::NotFound {
            kind: ItemKind::Entity,
            name: name.into(),
        }
    }

    /// Missing relation at resolution time.
    pub fn relation_not_found(name: impl Into<String>) -> Self {
        Error::NotFound {
            kind: ItemKind::Relation,
            name: name.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Scenario(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Scenario(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_names_the_item() {
        let err = Error::relation_not_found("MenuIcon");
        assert_eq!(err.to_string(), "relation 'MenuIcon' not found");

        let err = Error::entity_not_found("Navigation");
        assert_eq!(err.to_string(), "entity 'Navigation' not found");
    }

    #[test]
    fn test_depth_error_reports_depth() {
        let err = Error::DepthLimitExceeded { depth: 9, max: 8 };
        assert!(err.to_string().contains("depth 9"));
        assert!(err.to_string().contains("depth 8"));
    }
}
