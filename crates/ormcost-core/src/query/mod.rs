//! Access-pattern analysis.
//!
//! This module compiles declared access patterns into execution plans,
//! estimates their cost, and compares loading strategies.

mod access;
mod advisor;
mod cost;
mod planner;

pub use access::{AccessPattern, KeyProfile, LoadStrategy, NavigationStep};
pub use advisor::{
    Advice, CostDelta, Hint, PlanAdvisor, CARTESIAN_GROWTH_THRESHOLD, N_PLUS_ONE_QUERY_THRESHOLD,
};
pub use cost::{CostEstimate, CostEstimator, CostResult};
pub use planner::{ExecutionPlan, PlanBuilder, QueryKind, QueryOp};
