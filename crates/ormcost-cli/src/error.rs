//! CLI error types.

use thiserror::Error;

/// Errors surfaced by the command-line front end.
#[derive(Debug, Error)]
pub enum CliError {
    /// The analyzer rejected the scenario.
    #[error(transparent)]
    Analyzer(#[from] ormcost_core::Error),

    /// Output could not be encoded.
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}
