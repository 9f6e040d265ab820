//! Deterministic Test Pattern Generation for OpenTPG
//!
//! This crate is the heart of the pipeline: it turns one fault at a time
//! into a satisfiability question and a growing list of test vectors.
//!
//! # Overview
//!
//! - [`status`]: the per-fault classification registry with monotonic
//!   transitions (once `Detected` or `Untestable`, a fault never goes back).
//! - [`engine`]: the per-unit SAT engine. A unit (a single output cone, an
//!   FFR or an MFFC) is encoded once; each fault of the unit then adds its
//!   faulty cone, an activation constraint and an output miter to a clone of
//!   the base solver.
//! - [`driver`]: the ATPG loop. Iterates units in network order, skips
//!   faults that are no longer undetected, classifies solver outcomes and
//!   optionally drops faults that fault simulation finds covered for free.
//!
//! # Example
//!
//! ```
//! use opentpg_dtpg::{Dtpg, DtpgMode};
//! use opentpg_netlist::{FaultType, Network, NetlistFormat};
//!
//! let network = Network::parse(
//!     "INPUT(a)\nINPUT(b)\nOUTPUT(y)\ny = AND(a, b)\n",
//!     NetlistFormat::Iscas89,
//! )?;
//! let mut dtpg = Dtpg::new(&network, FaultType::StuckAt);
//! let (ndet, nunt, nabt) = dtpg.run(DtpgMode::Single, false);
//! assert_eq!(nunt, 0);
//! assert_eq!(nabt, 0);
//! assert_eq!(dtpg.tvlist().len(), ndet);
//! # Ok::<(), opentpg_netlist::NetlistError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod driver;
pub mod engine;
pub mod prelude;
pub mod status;

pub use driver::{Dtpg, DtpgMode};
pub use engine::{DtpgEngine, SolveKOutcome, SolveOutcome};
pub use status::{FaultStatus, FaultStatusMgr};
