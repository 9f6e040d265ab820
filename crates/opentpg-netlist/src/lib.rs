//! Gate-Level Netlist Model for OpenTPG
//!
//! This crate owns everything the ATPG pipeline needs to know about the
//! circuit under test:
//!
//! - **Network model**: primitive gates stored in topological order, with
//!   primary and pseudo-primary inputs/outputs (full-scan view of state
//!   elements).
//! - **Readers**: BLIF and ISCAS89 (`.bench`) parsers. BLIF `.names` covers
//!   are lowered to primitive AND/OR/NOT trees at parse time so the rest of
//!   the pipeline only ever sees primitive gates.
//! - **Structural analysis**: fanout-free regions (FFR) and maximal
//!   fanout-free cones (MFFC), the fault-partitioning units of the
//!   test-generation driver.
//! - **Fault machinery**: stuck-at / transition-delay fault enumeration,
//!   structural equivalence collapsing into representative faults, and
//!   fault-list reduction passes used by the compaction pipelines.
//!
//! # Example
//!
//! ```
//! use opentpg_netlist::{FaultType, Network, NetlistFormat};
//!
//! let src = "\
//! INPUT(a)
//! INPUT(b)
//! OUTPUT(y)
//! y = AND(a, b)
//! ";
//! let network = Network::parse(src, NetlistFormat::Iscas89)?;
//! assert_eq!(network.input_count(), 2);
//!
//! let faults = network.gen_faults(FaultType::StuckAt);
//! assert!(faults.representatives().count() > 0);
//! # Ok::<(), opentpg_netlist::NetlistError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod blif;
pub mod error;
pub mod fault;
pub mod gate;
pub mod iscas89;
pub mod network;
pub mod prelude;
pub mod reader;
pub mod reduce;
pub mod structure;

pub use error::NetlistError;
pub use fault::{Fault, FaultId, FaultList, FaultSite, FaultType};
pub use gate::GateKind;
pub use network::{Network, NetworkBuilder, Node, NodeId};
pub use reader::NetlistFormat;
pub use reduce::{ReductionModes, reduce_faults};
pub use structure::{Ffr, Mffc};
