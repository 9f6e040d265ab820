//! Error types for the atpgctl CLI.

use thiserror::Error;

/// Per-file errors of a CLI run. Each file is attempted independently; the
/// process exits non-zero if any file failed.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("netlist error: {0}")]
    Netlist(#[from] opentpg_netlist::NetlistError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
