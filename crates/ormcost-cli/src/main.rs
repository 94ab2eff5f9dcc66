//! ormcost command-line front end.
//!
//! Loads a JSON scenario (schema, access patterns, config) and prints the
//! strategy advice or the execution plans as JSON.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use ormcost_core::TieBreak;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::PlanChoice;

/// ORM access-pattern cost analyzer
#[derive(Parser, Debug)]
#[command(name = "ormcost")]
#[command(version, about = "Estimate round trips and bytes for ORM loading strategies")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compare loading strategies for every pattern in a scenario
    Advise {
        /// Scenario file (JSON)
        file: PathBuf,

        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the execution plan of every pattern in a scenario
    Plan {
        /// Scenario file (JSON)
        file: PathBuf,

        /// Strategy to plan under
        #[arg(long, default_value = "declared", value_enum)]
        strategy: PlanChoice,

        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

/// Flags that override the scenario's analyzer config.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ConfigOverrides {
    /// Assume repeated lazy keys at one depth are loaded once
    #[arg(long)]
    pub dedupe: bool,

    /// Maximum navigation depth
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Ranking objective
    #[arg(long, value_enum)]
    pub tie_break: Option<TieBreakArg>,
}

/// Ranking objective as a CLI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TieBreakArg {
    /// Fewest round trips first
    Queries,
    /// Fewest bytes first
    Bytes,
}

impl From<TieBreakArg> for TieBreak {
    fn from(arg: TieBreakArg) -> Self {
        match arg {
            TieBreakArg::Queries => TieBreak::QueriesThenBytes,
            TieBreakArg::Bytes => TieBreak::BytesThenQueries,
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ormcost_cli=info,ormcost_core=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match commands::run(args.command) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
