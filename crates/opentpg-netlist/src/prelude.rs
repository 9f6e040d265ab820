//! Prelude for the netlist crate.
//!
//! # Example
//!
//! ```
//! use opentpg_netlist::prelude::*;
//!
//! let n = Network::parse("INPUT(a)\nOUTPUT(y)\ny = NOT(a)\n", NetlistFormat::Iscas89)?;
//! let faults = n.gen_faults(FaultType::StuckAt);
//! assert_eq!(faults.rep_count(), 2);
//! # Ok::<(), NetlistError>(())
//! ```

pub use crate::error::NetlistError;
pub use crate::fault::{Fault, FaultId, FaultList, FaultSite, FaultType};
pub use crate::gate::GateKind;
pub use crate::network::{Network, NetworkBuilder, Node, NodeId};
pub use crate::reader::NetlistFormat;
pub use crate::reduce::{ReductionModes, reduce_faults};
pub use crate::structure::{Ffr, Mffc};
