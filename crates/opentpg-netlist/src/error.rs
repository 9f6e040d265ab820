//! Error types for netlist reading and fault-list handling.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for netlist construction and parsing.
#[derive(Debug, Error)]
pub enum NetlistError {
    /// The netlist file could not be read at all.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A syntax error in a netlist file.
    #[error("parse error at line {line}: {msg}")]
    Parse {
        /// 1-based source line.
        line: usize,
        /// Human-readable description.
        msg: String,
    },

    /// A net is referenced but never driven and never declared as an input.
    #[error("undefined net `{0}`")]
    UndefinedNet(String),

    /// A net is driven by more than one gate.
    #[error("net `{0}` has multiple drivers")]
    MultipleDrivers(String),

    /// The combinational core contains a cycle.
    #[error("combinational cycle through net `{0}`")]
    CombinationalCycle(String),

    /// An unknown fault-reduction mode string was supplied.
    #[error("unknown fault-reduction mode `{0}`")]
    UnknownReduction(String),
}

impl NetlistError {
    pub(crate) fn parse(line: usize, msg: impl Into<String>) -> Self {
        NetlistError::Parse {
            line,
            msg: msg.into(),
        }
    }
}
