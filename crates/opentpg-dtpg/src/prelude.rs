//! Prelude for the test-generation crate.

pub use crate::driver::{Dtpg, DtpgMode};
pub use crate::engine::{
    DEFAULT_CONFLICT_BUDGET, DtpgEngine, SolveKOutcome, SolveOutcome,
};
pub use crate::status::{FaultStatus, FaultStatusMgr};
