//! Loading strategy advisor.
//!
//! Builds the same access pattern under each loading strategy, estimates
//! every plan, and ranks them. The whole comparison is returned, not just the
//! winner: which strategy is "best" depends on whether round trips or bytes
//! dominate in the caller's environment.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::catalog::Schema;
use crate::config::{AnalyzerConfig, TieBreak};
use crate::error::Result;

use super::access::{AccessPattern, LoadStrategy};
use super::cost::{CostEstimate, CostEstimator, CostResult};
use super::planner::{ExecutionPlan, PlanBuilder};

/// Lazy round trips above which an N+1 hint is raised.
pub const N_PLUS_ONE_QUERY_THRESHOLD: u64 = 100;

/// Join row growth (relative to the root set) at which a cartesian
/// explosion hint is raised.
pub const CARTESIAN_GROWTH_THRESHOLD: u64 = 100;

/// Difference between the runner-up and the recommended strategy.
///
/// Positive values are what the recommendation saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostDelta {
    /// The runner-up strategy.
    pub strategy: LoadStrategy,
    /// Runner-up round trips minus recommended round trips.
    pub queries: i64,
    /// Runner-up bytes minus recommended bytes.
    pub bytes: i64,
}

impl CostDelta {
    fn between(recommended: &CostResult, runner_up: &CostResult) -> Self {
        Self {
            strategy: runner_up.strategy,
            queries: signed_delta(recommended.query_count(), runner_up.query_count()),
            bytes: signed_delta(recommended.total_bytes(), runner_up.total_bytes()),
        }
    }
}

/// A pathology spotted while comparing plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Hint {
    /// Lazy loading issues one round trip per row.
    NPlusOne {
        /// Round trips under lazy loading.
        queries: u64,
    },
    /// Eager joins over one-to-many edges multiply the row count.
    CartesianExplosion {
        /// Joined rows per root row.
        growth: u64,
    },
}

/// The advisor's verdict for one access pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advice {
    /// Navigation path analyzed, e.g. `Navigation.MenuIcon`.
    pub path: String,
    /// Every evaluated strategy, best first.
    pub candidates: Vec<CostResult>,
    /// Cheapest strategy under the configured objective.
    pub recommended: LoadStrategy,
    /// What the recommendation saves over the second-best strategy.
    pub runner_up: Option<CostDelta>,
    /// Ranking objective used.
    pub tie_break: TieBreak,
    /// Whether repeated lazy keys were assumed to collapse.
    pub dedupe_assumed: bool,
    /// Pathologies found in the candidate plans.
    pub hints: Vec<Hint>,
}

impl Advice {
    /// The recommended candidate.
    ///
    /// Advisor output always holds at least the lazy and eager include
    /// candidates.
    pub fn best(&self) -> &CostResult {
        &self.candidates[0]
    }

    /// The candidate for `strategy`, if it was evaluated.
    pub fn get(&self, strategy: LoadStrategy) -> Option<&CostResult> {
        self.candidates.iter().find(|c| c.strategy == strategy)
    }
}

/// Compares loading strategies for access patterns over one schema.
pub struct PlanAdvisor<'a> {
    schema: &'a Schema,
    config: AnalyzerConfig,
}

impl<'a> PlanAdvisor<'a> {
    /// Create an advisor over a frozen schema.
    pub fn new(schema: &'a Schema, config: AnalyzerConfig) -> Self {
        Self { schema, config }
    }

    /// The configuration in effect.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn builder(&self) -> PlanBuilder<'_> {
        PlanBuilder::new(self.schema, &self.config)
    }

    /// Build the plan for `pattern` under `strategy`.
    pub fn plan(&self, pattern: &AccessPattern, strategy: LoadStrategy) -> Result<ExecutionPlan> {
        self.builder().build_uniform(pattern, strategy)
    }

    /// Cost of the pattern with its declared, possibly mixed, strategies.
    pub fn estimate_declared(&self, pattern: &AccessPattern) -> Result<CostEstimate> {
        let plan = self.builder().build(pattern)?;
        Ok(CostEstimator::estimate(&plan))
    }

    /// Rank lazy, eager include and (when a projection is supplied) eager
    /// projected loading for `pattern`.
    #[instrument(level = "debug", skip_all, fields(path = %pattern.path()))]
    pub fn advise(&self, pattern: &AccessPattern) -> Result<Advice> {
        let builder = self.builder();
        let mut candidates = Vec::with_capacity(LoadStrategy::ALL.len());
        let mut hints = Vec::new();

        for strategy in LoadStrategy::ALL {
            if strategy == LoadStrategy::EagerProjected && !pattern.has_projection() {
                continue;
            }
            let plan = builder.build_uniform(pattern, strategy)?;
            if let Some(hint) = detect_hint(&plan, pattern.root_row_count) {
                hints.push(hint);
            }
            candidates.push(CostResult::new(strategy, CostEstimator::estimate(&plan)));
        }

        let tie_break = self.config.tie_break;
        candidates.sort_by(|a, b| a.compare(b, tie_break));

        let recommended = candidates[0].strategy;
        let runner_up = candidates
            .get(1)
            .map(|second| CostDelta::between(&candidates[0], second));

        for hint in &hints {
            warn!(path = %pattern.path(), ?hint, "Access pattern pathology");
        }
        debug!(
            %recommended,
            queries = candidates[0].query_count(),
            bytes = candidates[0].total_bytes(),
            "Recommended loading strategy"
        );

        Ok(Advice {
            path: pattern.path(),
            candidates,
            recommended,
            runner_up,
            tie_break,
            dedupe_assumed: self.config.dedupe_repeated_lazy_keys,
            hints,
        })
    }

    /// Advise on many patterns in parallel. Errors stay per pattern.
    pub fn advise_all(&self, patterns: &[AccessPattern]) -> Vec<Result<Advice>> {
        patterns.par_iter().map(|p| self.advise(p)).collect()
    }
}

/// Spot N+1 fan-out in lazy plans and row explosion in joined plans.
fn detect_hint(plan: &ExecutionPlan, root_rows: u64) -> Option<Hint> {
    match plan.strategy {
        Some(LoadStrategy::Lazy) => {
            let queries = plan.query_count();
            (queries > N_PLUS_ONE_QUERY_THRESHOLD).then_some(Hint::NPlusOne { queries })
        }
        Some(LoadStrategy::EagerInclude) => {
            let reached = plan.rows_by_depth.last().copied().unwrap_or(0);
            let growth = reached.checked_div(root_rows)?;
            (growth >= CARTESIAN_GROWTH_THRESHOLD).then_some(Hint::CartesianExplosion { growth })
        }
        _ => None,
    }
}

fn signed_delta(from: u64, to: u64) -> i64 {
    let delta = i128::from(to) - i128::from(from);
    delta.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnDef, EntityDef, RelationDef, SchemaBuilder};
    use crate::error::Error;
    use crate::query::{KeyProfile, NavigationStep};

    fn create_test_schema() -> Schema {
        SchemaBuilder::new()
            .with_entity(
                EntityDef::new("Navigation", "NavigationId")
                    .with_column(ColumnDef::int("NavigationId"))
                    .with_column(ColumnDef::int("MenuIconId"))
                    .with_column(ColumnDef::char("Name", 200)),
            )
            .unwrap()
            .with_entity(
                EntityDef::new("MenuIcon", "MenuIconId")
                    .with_column(ColumnDef::int("MenuIconId"))
                    .with_column(ColumnDef::char("FontAwesomeGlyph", 200)),
            )
            .unwrap()
            .with_entity(
                EntityDef::new("Order", "OrderId")
                    .with_column(ColumnDef::int("OrderId"))
                    .with_column(ColumnDef::char("Customer", 60)),
            )
            .unwrap()
            .with_entity(
                EntityDef::new("Line", "LineId")
                    .with_column(ColumnDef::int("LineId"))
                    .with_column(ColumnDef::char("Sku", 28)),
            )
            .unwrap()
            .with_entity(
                EntityDef::new("Serial", "SerialId")
                    .with_column(ColumnDef::int("SerialId"))
                    .with_column(ColumnDef::char("Code", 12)),
            )
            .unwrap()
            .with_relation(RelationDef::one_to_one(
                "MenuIcon",
                "Navigation",
                "MenuIconId",
                "MenuIcon",
            ))
            .unwrap()
            .with_relation(
                RelationDef::one_to_many("Lines", "Order", "OrderId", "Line").with_fanout(20.0),
            )
            .unwrap()
            .with_relation(
                RelationDef::one_to_many("Serials", "Line", "LineId", "Serial").with_fanout(10.0),
            )
            .unwrap()
            .freeze()
    }

    fn menu_pattern() -> AccessPattern {
        AccessPattern::new("Navigation", 4).navigate(
            NavigationStep::lazy("MenuIcon")
                .with_projection(["FontAwesomeGlyph"])
                .with_observed_keys([1, 2, 3, 3]),
        )
    }

    #[test]
    fn test_join_recommended_by_default() {
        let schema = create_test_schema();
        let advisor = PlanAdvisor::new(&schema, AnalyzerConfig::default());

        let advice = advisor.advise(&menu_pattern()).unwrap();

        assert_eq!(advice.candidates.len(), 3);
        assert_eq!(advice.recommended, LoadStrategy::EagerProjected);
        assert_eq!(advice.best().query_count(), 1);
        assert_eq!(advice.best().total_bytes(), 1632);

        let runner_up = advice.runner_up.unwrap();
        assert_eq!(runner_up.strategy, LoadStrategy::EagerInclude);
        assert_eq!(runner_up.queries, 0);
        assert_eq!(runner_up.bytes, 16);

        let lazy = advice.get(LoadStrategy::Lazy).unwrap();
        assert_eq!(lazy.query_count(), 5);
        assert_eq!(lazy.total_bytes(), 1648);
    }

    #[test]
    fn test_projection_skipped_without_projection() {
        let schema = create_test_schema();
        let advisor = PlanAdvisor::new(&schema, AnalyzerConfig::default());

        let pattern =
            AccessPattern::new("Navigation", 4).navigate(NavigationStep::lazy("MenuIcon"));
        let advice = advisor.advise(&pattern).unwrap();

        assert_eq!(advice.candidates.len(), 2);
        assert!(advice.get(LoadStrategy::EagerProjected).is_none());
        assert_eq!(advice.recommended, LoadStrategy::EagerInclude);
    }

    #[test]
    fn test_bytes_objective_prefers_lean_lazy() {
        let schema = create_test_schema();
        let config = AnalyzerConfig::default()
            .with_dedupe(true)
            .with_tie_break(TieBreak::BytesThenQueries);
        let advisor = PlanAdvisor::new(&schema, config);

        // 1000 navigation rows sharing 2 icons: the join repeats the icon
        // on every row, while deduplicated lazy loading fetches each once.
        let pattern = AccessPattern::new("Navigation", 1000)
            .navigate(NavigationStep::lazy("MenuIcon").with_keys(KeyProfile::Distinct(2)));
        let advice = advisor.advise(&pattern).unwrap();

        assert_eq!(advice.recommended, LoadStrategy::Lazy);
        assert!(advice.dedupe_assumed);
        assert_eq!(advice.best().query_count(), 1 + 2);
        assert_eq!(advice.best().total_bytes(), 1000 * 208 + 2 * 204);

        let delta = advice.runner_up.unwrap();
        assert_eq!(delta.strategy, LoadStrategy::EagerInclude);
        assert!(delta.queries < 0);
        assert!(delta.bytes > 0);
    }

    #[test]
    fn test_hints_flag_both_pathologies() {
        let schema = create_test_schema();
        let advisor = PlanAdvisor::new(&schema, AnalyzerConfig::default());

        let pattern = AccessPattern::new("Order", 50)
            .navigate(NavigationStep::lazy("Lines"))
            .navigate(NavigationStep::lazy("Serials"));
        let advice = advisor.advise(&pattern).unwrap();

        assert!(advice
            .hints
            .contains(&Hint::NPlusOne { queries: 1 + 50 + 1000 }));
        assert!(advice
            .hints
            .contains(&Hint::CartesianExplosion { growth: 200 }));
    }

    #[test]
    fn test_no_hints_for_small_pattern() {
        let schema = create_test_schema();
        let advisor = PlanAdvisor::new(&schema, AnalyzerConfig::default());

        assert!(advisor.advise(&menu_pattern()).unwrap().hints.is_empty());
    }

    #[test]
    fn test_advise_is_idempotent() {
        let schema = create_test_schema();
        let advisor = PlanAdvisor::new(&schema, AnalyzerConfig::default().with_dedupe(true));

        let first = advisor.advise(&menu_pattern()).unwrap();
        let second = advisor.advise(&menu_pattern()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_estimate_declared_mixed_chain() {
        let schema = create_test_schema();
        let advisor = PlanAdvisor::new(&schema, AnalyzerConfig::default());

        let pattern = AccessPattern::new("Order", 5)
            .navigate(NavigationStep::include("Lines"))
            .navigate(NavigationStep::lazy("Serials"));
        let cost = advisor.estimate_declared(&pattern).unwrap();

        // one joined scan, then a lookup per joined line row
        assert_eq!(cost.query_count, 1 + 100);
    }

    #[test]
    fn test_plan_uses_advisor_config() {
        let schema = create_test_schema();
        let advisor = PlanAdvisor::new(&schema, AnalyzerConfig::default().with_dedupe(true));
        assert!(advisor.config().dedupe_repeated_lazy_keys);

        let plan = advisor.plan(&menu_pattern(), LoadStrategy::Lazy).unwrap();
        assert_eq!(plan.strategy, Some(LoadStrategy::Lazy));
        assert_eq!(plan.query_count(), 4);
    }

    #[test]
    fn test_advise_all_matches_sequential() {
        let schema = create_test_schema();
        let advisor = PlanAdvisor::new(&schema, AnalyzerConfig::default());

        let patterns: Vec<AccessPattern> = (1..=16)
            .map(|rows| {
                AccessPattern::new("Order", rows)
                    .navigate(NavigationStep::lazy("Lines"))
                    .navigate(NavigationStep::include("Serials"))
            })
            .chain(std::iter::once(
                AccessPattern::new("Order", 1).navigate(NavigationStep::lazy("Missing")),
            ))
            .collect();

        let parallel = advisor.advise_all(&patterns);
        assert_eq!(parallel.len(), patterns.len());

        for (pattern, result) in patterns.iter().zip(&parallel) {
            assert_eq!(result, &advisor.advise(pattern));
        }
        assert_eq!(
            parallel.last().unwrap().as_ref().unwrap_err(),
            &Error::relation_not_found("Missing")
        );
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(signed_delta(5, 1), -4);
        assert_eq!(signed_delta(1, 5), 4);
        assert_eq!(signed_delta(0, u64::MAX), i64::MAX);
    }
}
