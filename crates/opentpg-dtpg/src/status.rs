//! The fault-status registry.

use serde::{Deserialize, Serialize};
use std::fmt;

use opentpg_netlist::FaultId;

/// Classification of one fault.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultStatus {
    /// Not yet classified (the initial state).
    #[default]
    Undetected,
    /// A test vector detecting the fault exists.
    Detected,
    /// Proven untestable (redundant).
    Untestable,
    /// The solver gave up within its budget.
    Aborted,
}

impl FaultStatus {
    /// Terminal statuses never transition away.
    pub fn is_terminal(self) -> bool {
        matches!(self, FaultStatus::Detected | FaultStatus::Untestable)
    }
}

impl fmt::Display for FaultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultStatus::Undetected => write!(f, "undetected"),
            FaultStatus::Detected => write!(f, "detected"),
            FaultStatus::Untestable => write!(f, "untestable"),
            FaultStatus::Aborted => write!(f, "aborted"),
        }
    }
}

/// Per-fault status store with monotonic transitions.
#[derive(Clone, Debug)]
pub struct FaultStatusMgr {
    statuses: Vec<FaultStatus>,
}

impl FaultStatusMgr {
    /// A registry for `nfaults` faults, all `Undetected`.
    pub fn new(nfaults: usize) -> Self {
        Self {
            statuses: vec![FaultStatus::Undetected; nfaults],
        }
    }

    /// Current status of a fault.
    #[inline]
    pub fn get(&self, f: FaultId) -> FaultStatus {
        self.statuses[f.index()]
    }

    /// Record a classification.
    ///
    /// Setting the same terminal status twice is a no-op; any other
    /// transition out of a terminal status is an internal invariant
    /// violation.
    ///
    /// # Panics
    ///
    /// Panics on a monotonicity violation, i.e. an attempt to move a fault
    /// out of `Detected` or `Untestable`.
    pub fn set(&mut self, f: FaultId, status: FaultStatus) {
        let current = self.statuses[f.index()];
        if current == status {
            return;
        }
        assert!(
            !current.is_terminal(),
            "monotonicity violation: {f} is {current}, refusing {status}"
        );
        self.statuses[f.index()] = status;
    }

    /// Number of faults per status, in `(undetected, detected, untestable,
    /// aborted)` order.
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let mut c = (0, 0, 0, 0);
        for s in &self.statuses {
            match s {
                FaultStatus::Undetected => c.0 += 1,
                FaultStatus::Detected => c.1 += 1,
                FaultStatus::Untestable => c.2 += 1,
                FaultStatus::Aborted => c.3 += 1,
            }
        }
        c
    }
}
