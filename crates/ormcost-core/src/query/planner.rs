//! Execution plan builder.
//!
//! Compiles an access pattern into the ordered list of logical round trips
//! an ORM would issue for it. Lazy steps expand into per-row lookups (the
//! N+1 rule); eager steps fold into the query they are joined to, widening
//! its rows and, across one-to-many edges, multiplying them (the fan-out
//! rule behind cartesian explosion).

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::catalog::{is_valid_fanout, Cardinality, EntityDef, RelationDef, Schema};
use crate::config::AnalyzerConfig;
use crate::error::{Error, Result};

use super::access::{AccessPattern, LoadStrategy, NavigationStep};

/// Shape of a logical round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Scan of the root entity set.
    RootScan,
    /// Root scan with eager joins folded in.
    Join,
    /// Lookup issued once per parent row by a lazy step.
    Lookup,
}

/// One logical query shape in a plan.
///
/// `executions` counts identical round trips of this shape: a lazy step over
/// `n` parent rows yields one op with `executions == n` rather than `n`
/// separate ops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOp {
    /// Kind of round trip.
    pub kind: QueryKind,
    /// Navigation depth that issued this query (0 for the root).
    pub depth: usize,
    /// Entities read by this query, in join order.
    pub entities: Vec<String>,
    /// Number of round trips of this shape.
    pub executions: u64,
    /// Rows returned by each round trip.
    pub rows_per_execution: u64,
    /// Bytes per returned row.
    pub row_width: u64,
}

impl QueryOp {
    fn root_scan(entity: &EntityDef, rows: u64) -> Self {
        Self {
            kind: QueryKind::RootScan,
            depth: 0,
            entities: vec![entity.name.clone()],
            executions: 1,
            rows_per_execution: rows,
            row_width: entity.full_width(),
        }
    }

    fn lookup(entity: &EntityDef, depth: usize, executions: u64, rows: u64) -> Self {
        Self {
            kind: QueryKind::Lookup,
            depth,
            entities: vec![entity.name.clone()],
            executions,
            rows_per_execution: rows,
            row_width: entity.full_width(),
        }
    }

    /// Fold a joined entity into this query. A left join keeps every row it
    /// joins onto, so the row count never drops below the parent's.
    fn join(&mut self, entity: &str, width: u64, fanout: Option<f64>) {
        if self.kind == QueryKind::RootScan {
            self.kind = QueryKind::Join;
        }
        self.entities.push(entity.to_string());
        self.row_width = self.row_width.saturating_add(width);
        if let Some(fanout) = fanout {
            self.rows_per_execution =
                scale_rows(self.rows_per_execution, fanout).max(self.rows_per_execution);
        }
    }

    /// Total rows returned across all executions.
    pub fn rows(&self) -> u64 {
        self.executions.saturating_mul(self.rows_per_execution)
    }

    /// Total bytes returned across all executions.
    pub fn bytes(&self) -> u64 {
        self.rows().saturating_mul(self.row_width)
    }

    /// Check if this query joins more than one entity.
    pub fn is_joined(&self) -> bool {
        self.entities.len() > 1
    }
}

/// An ordered list of logical queries for one access pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Root entity of the pattern.
    pub root_entity: String,
    /// Strategy forced on every step, or `None` for the declared strategies.
    pub strategy: Option<LoadStrategy>,
    /// Queries in issue order.
    pub ops: Vec<QueryOp>,
    /// Rows reached at each navigation depth; index 0 is the root set.
    pub rows_by_depth: Vec<u64>,
}

impl ExecutionPlan {
    /// Number of round trips.
    pub fn query_count(&self) -> u64 {
        self.ops
            .iter()
            .fold(0u64, |acc, op| acc.saturating_add(op.executions))
    }

    /// Rows transferred across all queries.
    pub fn total_rows(&self) -> u64 {
        self.ops
            .iter()
            .fold(0u64, |acc, op| acc.saturating_add(op.rows()))
    }

    /// Bytes transferred across all queries.
    pub fn total_bytes(&self) -> u64 {
        self.ops
            .iter()
            .fold(0u64, |acc, op| acc.saturating_add(op.bytes()))
    }

    /// Navigation depth the plan covers.
    pub fn depth(&self) -> usize {
        self.rows_by_depth.len().saturating_sub(1)
    }
}

/// A navigation step resolved against the schema.
struct ResolvedStep<'a> {
    relation: &'a RelationDef,
    child: &'a EntityDef,
    fanout: f64,
    projected_width: Option<u64>,
}

impl ResolvedStep<'_> {
    /// Row multiplier across this edge; `None` when the edge cannot grow rows.
    fn growth(&self) -> Option<f64> {
        match self.relation.cardinality {
            Cardinality::OneToOne => None,
            Cardinality::OneToMany => Some(self.fanout),
        }
    }

    /// Rows a single lazy lookup over this edge returns.
    fn rows_per_lookup(&self) -> u64 {
        self.growth().map_or(1, |fanout| scale_rows(1, fanout))
    }
}

/// Builder that turns access patterns into execution plans.
pub struct PlanBuilder<'a> {
    schema: &'a Schema,
    config: &'a AnalyzerConfig,
}

impl<'a> PlanBuilder<'a> {
    /// Create a new builder over a frozen schema.
    pub fn new(schema: &'a Schema, config: &'a AnalyzerConfig) -> Self {
        Self { schema, config }
    }

    /// Build a plan using each step's declared strategy.
    pub fn build(&self, pattern: &AccessPattern) -> Result<ExecutionPlan> {
        self.build_with(pattern, None)
    }

    /// Build a plan with every step forced to `strategy`.
    ///
    /// Under a forced `EagerProjected`, steps without a projection are joined
    /// at full width.
    pub fn build_uniform(
        &self,
        pattern: &AccessPattern,
        strategy: LoadStrategy,
    ) -> Result<ExecutionPlan> {
        self.build_with(pattern, Some(strategy))
    }

    #[instrument(
        level = "debug",
        skip_all,
        fields(root = %pattern.root_entity, strategy = ?forced)
    )]
    fn build_with(
        &self,
        pattern: &AccessPattern,
        forced: Option<LoadStrategy>,
    ) -> Result<ExecutionPlan> {
        let depth = pattern.depth();
        if depth > self.config.max_navigation_depth {
            return Err(Error::DepthLimitExceeded {
                depth,
                max: self.config.max_navigation_depth,
            });
        }

        let root = self.schema.resolve(&pattern.root_entity)?;

        let mut ops = vec![QueryOp::root_scan(root, pattern.root_row_count)];
        let mut rows_by_depth = Vec::with_capacity(depth + 1);
        rows_by_depth.push(pattern.root_row_count);

        // Eager steps fold into the anchor: the root scan, or the lookup
        // issued by the most recent lazy step.
        let mut anchor = 0;
        let mut current = root;
        let mut rows = pattern.root_row_count;

        for (index, step) in pattern.steps.iter().enumerate() {
            let step_no = index + 1;
            let resolved = self.resolve_step(step_no, step, current)?;
            let strategy = forced.unwrap_or(step.strategy);

            match strategy {
                LoadStrategy::Lazy => {
                    let lookups = self.lazy_lookups(step, rows);
                    ops.push(QueryOp::lookup(
                        resolved.child,
                        step_no,
                        lookups,
                        resolved.rows_per_lookup(),
                    ));
                    anchor = ops.len() - 1;
                }
                LoadStrategy::EagerInclude | LoadStrategy::EagerProjected => {
                    let width = match (strategy, resolved.projected_width) {
                        (LoadStrategy::EagerProjected, Some(width)) => width,
                        _ => resolved.child.full_width(),
                    };
                    ops[anchor].join(&resolved.child.name, width, resolved.growth());
                }
            }

            rows = ops[anchor].rows();
            rows_by_depth.push(rows);
            current = resolved.child;
        }

        let plan = ExecutionPlan {
            root_entity: root.name.clone(),
            strategy: forced,
            ops,
            rows_by_depth,
        };

        debug!(
            path = %pattern.path(),
            queries = plan.query_count(),
            bytes = plan.total_bytes(),
            "Built execution plan"
        );

        Ok(plan)
    }

    /// Number of lookups a lazy step issues over `rows` parent rows.
    fn lazy_lookups(&self, step: &NavigationStep, rows: u64) -> u64 {
        if !self.config.dedupe_repeated_lazy_keys {
            return rows;
        }
        step.keys
            .as_ref()
            .map_or(rows, |keys| keys.distinct_keys(rows))
    }

    /// Resolve and validate one step against the entity reached so far.
    fn resolve_step(
        &self,
        step_no: usize,
        step: &NavigationStep,
        current: &EntityDef,
    ) -> Result<ResolvedStep<'a>> {
        let relation = self.schema.resolve_relation(&step.relation)?;

        if relation.parent != current.name {
            return Err(Error::InvalidNavigation {
                step: step_no,
                relation: relation.name.clone(),
                expected: current.name.clone(),
                found: relation.parent.clone(),
            });
        }

        let child = self.schema.resolve(&relation.child)?;

        let projected_width = match &step.projection {
            Some(columns) if columns.is_empty() => {
                return Err(Error::EmptyProjection {
                    step: step_no,
                    relation: relation.name.clone(),
                });
            }
            Some(columns) => Some(self.schema.row_width(&child.name, Some(columns))?),
            None if step.strategy == LoadStrategy::EagerProjected => {
                return Err(Error::EmptyProjection {
                    step: step_no,
                    relation: relation.name.clone(),
                });
            }
            None => None,
        };

        let fanout = step
            .fanout
            .or(relation.average_fanout)
            .unwrap_or(self.config.default_one_to_many_fanout);
        if !is_valid_fanout(fanout) {
            return Err(Error::InvalidFanout {
                relation: relation.name.clone(),
                fanout,
            });
        }

        Ok(ResolvedStep {
            relation,
            child,
            fanout,
            projected_width,
        })
    }
}

/// Multiply a row count by a fan-out, rounding partial rows up.
fn scale_rows(rows: u64, fanout: f64) -> u64 {
    // `as` saturates for out-of-range floats.
    (rows as f64 * fanout).ceil() as u64
}
