//! Subcommand execution.

use clap::ValueEnum;
use ormcost_core::{
    Advice, AnalyzerConfig, CostEstimate, CostEstimator, ExecutionPlan, LoadStrategy, PlanBuilder,
    Scenario,
};
use serde::Serialize;
use tracing::info;

use crate::error::CliError;
use crate::{Command, ConfigOverrides};

/// Which strategy assignment to plan under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlanChoice {
    /// Each step's own strategy
    Declared,
    /// Every step lazy
    Lazy,
    /// Every step eagerly included
    EagerInclude,
    /// Every step eagerly included with its projection
    EagerProjected,
}

impl PlanChoice {
    fn forced(self) -> Option<LoadStrategy> {
        match self {
            PlanChoice::Declared => None,
            PlanChoice::Lazy => Some(LoadStrategy::Lazy),
            PlanChoice::EagerInclude => Some(LoadStrategy::EagerInclude),
            PlanChoice::EagerProjected => Some(LoadStrategy::EagerProjected),
        }
    }
}

/// Per-pattern output entry.
#[derive(Debug, Serialize)]
struct PatternReport<T: Serialize> {
    pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> PatternReport<T> {
    fn new(pattern: String, outcome: ormcost_core::Result<T>) -> Self {
        match outcome {
            Ok(result) => Self {
                pattern,
                result: Some(result),
                error: None,
            },
            Err(e) => Self {
                pattern,
                result: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct PlanReport {
    plan: ExecutionPlan,
    cost: CostEstimate,
}

/// Run a subcommand and return its JSON output.
pub fn run(command: Command) -> Result<String, CliError> {
    match command {
        Command::Advise {
            file,
            overrides,
            pretty,
        } => {
            let mut scenario = Scenario::from_path(&file)?;
            apply_overrides(&mut scenario.config, &overrides);
            render(&advise(&scenario)?, pretty)
        }
        Command::Plan {
            file,
            strategy,
            overrides,
            pretty,
        } => {
            let mut scenario = Scenario::from_path(&file)?;
            apply_overrides(&mut scenario.config, &overrides);
            render(&plan(&scenario, strategy)?, pretty)
        }
    }
}

fn apply_overrides(config: &mut AnalyzerConfig, overrides: &ConfigOverrides) {
    if overrides.dedupe {
        config.dedupe_repeated_lazy_keys = true;
    }
    if let Some(depth) = overrides.max_depth {
        config.max_navigation_depth = depth;
    }
    if let Some(tie_break) = overrides.tie_break {
        config.tie_break = tie_break.into();
    }
}

fn advise(scenario: &Scenario) -> Result<Vec<PatternReport<Advice>>, CliError> {
    let results = scenario.advise()?;
    let failed = results.iter().filter(|r| r.is_err()).count();
    info!(patterns = results.len(), failed, "Analyzed access patterns");

    Ok(scenario
        .patterns
        .iter()
        .zip(results)
        .map(|(pattern, result)| PatternReport::new(pattern.path(), result))
        .collect())
}

fn plan(
    scenario: &Scenario,
    choice: PlanChoice,
) -> Result<Vec<PatternReport<PlanReport>>, CliError> {
    let schema = scenario.build_schema()?;
    let builder = PlanBuilder::new(&schema, &scenario.config);

    Ok(scenario
        .patterns
        .iter()
        .map(|pattern| {
            let built = match choice.forced() {
                Some(strategy) => builder.build_uniform(pattern, strategy),
                None => builder.build(pattern),
            };
            let report = built.map(|plan| PlanReport {
                cost: CostEstimator::estimate(&plan),
                plan,
            });
            PatternReport::new(pattern.path(), report)
        })
        .collect())
}

fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}
