//! Declared access patterns.
//!
//! An access pattern says what a caller intends to do: list a root entity,
//! then for each row follow a chain of navigation steps. Each step carries
//! the loading strategy that decides when its round trips are issued.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// When a navigation step's data is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStrategy {
    /// One lookup per parent row, on first access.
    Lazy,
    /// Joined into the enclosing query, full child rows.
    EagerInclude,
    /// Joined into the enclosing query, only projected child columns.
    EagerProjected,
}

impl LoadStrategy {
    /// All strategies, in ranking order for ties.
    pub const ALL: [LoadStrategy; 3] = [
        LoadStrategy::Lazy,
        LoadStrategy::EagerInclude,
        LoadStrategy::EagerProjected,
    ];
}

impl std::fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStrategy::Lazy => write!(f, "lazy"),
            LoadStrategy::EagerInclude => write!(f, "eager_include"),
            LoadStrategy::EagerProjected => write!(f, "eager_projected"),
        }
    }
}

/// How foreign-key values repeat across the parent rows of a step.
///
/// Only consulted when repeated lazy keys are deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyProfile {
    /// A sample of the key values seen on parent rows.
    Observed(Vec<i64>),
    /// Estimated number of distinct key values.
    Distinct(u64),
}

impl KeyProfile {
    /// Number of distinct keys among `rows` parent rows.
    ///
    /// An observed sample is scaled by its distinct ratio, so a sample that
    /// covers every parent row yields its exact distinct count.
    pub fn distinct_keys(&self, rows: u64) -> u64 {
        if rows == 0 {
            return 0;
        }
        let distinct = match self {
            KeyProfile::Observed(values) if values.is_empty() => rows,
            KeyProfile::Observed(values) => {
                let unique = values.iter().collect::<HashSet<_>>().len() as u128;
                let len = values.len() as u128;
                let scaled = (rows as u128 * unique).div_ceil(len);
                u64::try_from(scaled).unwrap_or(u64::MAX)
            }
            KeyProfile::Distinct(count) => *count,
        };
        distinct.clamp(1, rows)
    }
}

/// One edge traversal within an access pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationStep {
    /// Name of the relation to follow.
    pub relation: String,
    /// Loading strategy for this step.
    pub strategy: LoadStrategy,
    /// Child columns to fetch for a projected step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Vec<String>>,
    /// Fan-out for this traversal, overriding the relation's estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fanout: Option<f64>,
    /// Key repetition profile for lazy deduplication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<KeyProfile>,
}

impl NavigationStep {
    /// Create a step with the given strategy.
    pub fn new(relation: impl Into<String>, strategy: LoadStrategy) -> Self {
        Self {
            relation: relation.into(),
            strategy,
            projection: None,
            fanout: None,
            keys: None,
        }
    }

    /// A lazily loaded step.
    pub fn lazy(relation: impl Into<String>) -> Self {
        Self::new(relation, LoadStrategy::Lazy)
    }

    /// An eagerly included step.
    pub fn include(relation: impl Into<String>) -> Self {
        Self::new(relation, LoadStrategy::EagerInclude)
    }

    /// An eagerly included step fetching only `columns`.
    pub fn projected<I, S>(relation: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(relation, LoadStrategy::EagerProjected).with_projection(columns)
    }

    /// Set the projected child columns.
    pub fn with_projection<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Override the fan-out for this traversal.
    pub fn with_fanout(mut self, fanout: f64) -> Self {
        self.fanout = Some(fanout);
        self
    }

    /// Attach a key repetition profile.
    pub fn with_keys(mut self, keys: KeyProfile) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Attach observed foreign-key values.
    pub fn with_observed_keys(self, values: impl IntoIterator<Item = i64>) -> Self {
        self.with_keys(KeyProfile::Observed(values.into_iter().collect()))
    }

    /// Check if this step declares a projection.
    pub fn has_projection(&self) -> bool {
        self.projection.is_some()
    }
}

/// What a caller intends to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessPattern {
    /// Entity listed at the root.
    pub root_entity: String,
    /// Estimated or measured number of root rows.
    pub root_row_count: u64,
    /// Navigation chain; step `i + 1` starts from the child of step `i`.
    #[serde(default)]
    pub steps: Vec<NavigationStep>,
}

impl AccessPattern {
    /// Create a pattern listing `root_row_count` rows of `root_entity`.
    pub fn new(root_entity: impl Into<String>, root_row_count: u64) -> Self {
        Self {
            root_entity: root_entity.into(),
            root_row_count,
            steps: Vec::new(),
        }
    }

    /// Append a navigation step to the chain.
    pub fn navigate(mut self, step: NavigationStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Navigation depth (number of steps).
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// Check if any step supplies a projection.
    pub fn has_projection(&self) -> bool {
        self.steps.iter().any(NavigationStep::has_projection)
    }

    /// Dot-separated navigation path, e.g. `Navigation.MenuIcon`.
    pub fn path(&self) -> String {
        std::iter::once(self.root_entity.as_str())
            .chain(self.steps.iter().map(|s| s.relation.as_str()))
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_builder() {
        let pattern = AccessPattern::new("Navigation", 4)
            .navigate(NavigationStep::lazy("MenuIcon").with_observed_keys([1, 2, 3, 3]));

        assert_eq!(pattern.depth(), 1);
        assert_eq!(pattern.path(), "Navigation.MenuIcon");
        assert!(!pattern.has_projection());
    }

    #[test]
    fn test_projected_step() {
        let step = NavigationStep::projected("MenuIcon", ["FontAwesomeGlyph"]);

        assert_eq!(step.strategy, LoadStrategy::EagerProjected);
        assert_eq!(step.projection, Some(vec!["FontAwesomeGlyph".to_string()]));
        assert!(step.has_projection());
    }

    #[test]
    fn test_observed_keys_collapse_repeats() {
        let keys = KeyProfile::Observed(vec![1, 2, 3, 3]);
        assert_eq!(keys.distinct_keys(4), 3);
    }

    #[test]
    fn test_observed_keys_scale_to_row_count() {
        let keys = KeyProfile::Observed(vec![1, 1, 2, 2]);
        assert_eq!(keys.distinct_keys(100), 50);
        assert_eq!(keys.distinct_keys(1), 1);
    }

    #[test]
    fn test_distinct_keys_bounded_by_rows() {
        assert_eq!(KeyProfile::Distinct(500).distinct_keys(20), 20);
        assert_eq!(KeyProfile::Distinct(0).distinct_keys(20), 1);
        assert_eq!(KeyProfile::Distinct(7).distinct_keys(0), 0);
        assert_eq!(KeyProfile::Observed(vec![]).distinct_keys(9), 9);
    }

    #[test]
    fn test_step_json_shape() {
        let json = r#"{
            "relation": "MenuIcon",
            "strategy": "lazy",
            "keys": { "observed": [1, 2, 3, 3] }
        }"#;
        let step: NavigationStep = serde_json::from_str(json).unwrap();

        assert_eq!(step.strategy, LoadStrategy::Lazy);
        assert_eq!(step.keys, Some(KeyProfile::Observed(vec![1, 2, 3, 3])));
        assert!(step.projection.is_none());
    }
}
