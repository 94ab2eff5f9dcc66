//! ormcost core - ORM access-pattern cost analysis.
//!
//! Models an entity-relationship schema and estimates, before any database
//! runs, how many round trips and how many bytes an access pattern costs
//! under lazy loading, eager includes, and projected includes.
//!
//! ```
//! use ormcost_core::{
//!     AccessPattern, AnalyzerConfig, ColumnDef, EntityDef, LoadStrategy, NavigationStep,
//!     PlanAdvisor, RelationDef, SchemaBuilder,
//! };
//!
//! let schema = SchemaBuilder::new()
//!     .with_entity(
//!         EntityDef::new("Navigation", "NavigationId")
//!             .with_column(ColumnDef::int("NavigationId"))
//!             .with_column(ColumnDef::int("MenuIconId"))
//!             .with_column(ColumnDef::char("Name", 200)),
//!     )?
//!     .with_entity(
//!         EntityDef::new("MenuIcon", "MenuIconId")
//!             .with_column(ColumnDef::int("MenuIconId"))
//!             .with_column(ColumnDef::char("FontAwesomeGlyph", 200)),
//!     )?
//!     .with_relation(RelationDef::one_to_one(
//!         "MenuIcon",
//!         "Navigation",
//!         "MenuIconId",
//!         "MenuIcon",
//!     ))?
//!     .freeze();
//!
//! let pattern = AccessPattern::new("Navigation", 4)
//!     .navigate(NavigationStep::lazy("MenuIcon"));
//!
//! let advice = PlanAdvisor::new(&schema, AnalyzerConfig::default()).advise(&pattern)?;
//! assert_eq!(advice.recommended, LoadStrategy::EagerInclude);
//! assert_eq!(advice.get(LoadStrategy::Lazy).unwrap().query_count(), 5);
//! # Ok::<(), ormcost_core::Error>(())
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod query;
pub mod scenario;

pub use catalog::{Cardinality, ColumnDef, EntityDef, RelationDef, Schema, SchemaBuilder, SchemaDef};
pub use config::{AnalyzerConfig, TieBreak};
pub use error::{Error, ItemKind, Result};
pub use query::{
    AccessPattern, Advice, CostDelta, CostEstimate, CostEstimator, CostResult, ExecutionPlan, Hint,
    KeyProfile, LoadStrategy, NavigationStep, PlanAdvisor, PlanBuilder, QueryKind, QueryOp,
};
pub use scenario::Scenario;
