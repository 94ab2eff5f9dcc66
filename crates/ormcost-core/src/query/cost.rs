//! Cost model for execution plans.
//!
//! Two costs are tracked independently: round trips (`query_count`), which
//! dominate on high-latency links, and bytes transferred (`total_bytes`),
//! which approximate the time spent marshalling rows into objects.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::TieBreak;

use super::access::LoadStrategy;
use super::planner::ExecutionPlan;

/// Cost estimate for a plan or sub-plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Logical round trips issued.
    pub query_count: u64,
    /// Rows transferred.
    pub total_rows: u64,
    /// Bytes transferred (rows x row width).
    pub total_bytes: u64,
}

impl CostEstimate {
    /// Create a new cost estimate.
    pub fn new(query_count: u64, total_rows: u64, total_bytes: u64) -> Self {
        Self {
            query_count,
            total_rows,
            total_bytes,
        }
    }

    /// Create a zero-cost estimate.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Add another cost estimate to this one.
    pub fn add(&self, other: &CostEstimate) -> CostEstimate {
        CostEstimate::new(
            self.query_count.saturating_add(other.query_count),
            self.total_rows.saturating_add(other.total_rows),
            self.total_bytes.saturating_add(other.total_bytes),
        )
    }
}

/// Stateless estimator over execution plans.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostEstimator;

impl CostEstimator {
    /// Estimate the cost of a full plan.
    pub fn estimate(plan: &ExecutionPlan) -> CostEstimate {
        plan.ops.iter().fold(CostEstimate::zero(), |total, op| {
            total.add(&CostEstimate::new(op.executions, op.rows(), op.bytes()))
        })
    }
}

/// The cost of one candidate strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CostResult {
    /// Strategy applied to every step.
    pub strategy: LoadStrategy,
    /// Estimated cost under that strategy.
    #[serde(flatten)]
    pub estimate: CostEstimate,
}

impl CostResult {
    /// Pair a strategy with its estimate.
    pub fn new(strategy: LoadStrategy, estimate: CostEstimate) -> Self {
        Self { strategy, estimate }
    }

    /// Round trips under this strategy.
    pub fn query_count(&self) -> u64 {
        self.estimate.query_count
    }

    /// Bytes transferred under this strategy.
    pub fn total_bytes(&self) -> u64 {
        self.estimate.total_bytes
    }

    /// Total order under `tie_break`; full ties fall back to strategy order.
    pub fn compare(&self, other: &CostResult, tie_break: TieBreak) -> Ordering {
        tie_break
            .compare(&self.estimate, &other.estimate)
            .then(self.strategy.cmp(&other.strategy))
    }
}
