//! Analyzer configuration.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::query::CostEstimate;

/// Default maximum navigation depth.
pub const DEFAULT_MAX_NAVIGATION_DEPTH: usize = 8;

/// Fan-out assumed for one-to-many edges without an estimate.
pub const DEFAULT_ONE_TO_MANY_FANOUT: f64 = 10.0;

/// Objective used to rank candidate plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Minimize bytes transferred, then round trips.
    BytesThenQueries,
    /// Minimize round trips, then bytes transferred.
    #[default]
    QueriesThenBytes,
}

impl TieBreak {
    /// Order two estimates under this objective.
    pub fn compare(self, a: &CostEstimate, b: &CostEstimate) -> Ordering {
        match self {
            TieBreak::QueriesThenBytes => a
                .query_count
                .cmp(&b.query_count)
                .then(a.total_bytes.cmp(&b.total_bytes)),
            TieBreak::BytesThenQueries => a
                .total_bytes
                .cmp(&b.total_bytes)
                .then(a.query_count.cmp(&b.query_count)),
        }
    }
}

/// Global analyzer settings.
///
/// `dedupe_repeated_lazy_keys` stands in for ORM change tracking: whether a
/// key already loaded at the same navigation depth is served without a new
/// round trip. It is an explicit assumption, off by default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Collapse repeated foreign-key values at one lazy depth into one lookup.
    pub dedupe_repeated_lazy_keys: bool,
    /// Longest navigation chain accepted.
    pub max_navigation_depth: usize,
    /// Ranking objective for the advisor.
    pub tie_break: TieBreak,
    /// Fan-out used for one-to-many edges with no estimate.
    pub default_one_to_many_fanout: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            dedupe_repeated_lazy_keys: false,
            max_navigation_depth: DEFAULT_MAX_NAVIGATION_DEPTH,
            tie_break: TieBreak::default(),
            default_one_to_many_fanout: DEFAULT_ONE_TO_MANY_FANOUT,
        }
    }
}

impl AnalyzerConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle collapsing of repeated lazy keys.
    pub fn with_dedupe(mut self, enabled: bool) -> Self {
        self.dedupe_repeated_lazy_keys = enabled;
        self
    }

    /// Set the maximum navigation depth.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_navigation_depth = depth;
        self
    }

    /// Set the ranking objective.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Set the fallback one-to-many fan-out.
    pub fn with_default_fanout(mut self, fanout: f64) -> Self {
        self.default_one_to_many_fanout = fanout;
        self
    }
}
