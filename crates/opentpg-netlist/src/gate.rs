//! Primitive gate kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The primitive gate alphabet of the network model.
///
/// Readers lower every construct of their source format (BLIF `.names`
/// covers, `.bench` gate lines) onto this alphabet, so downstream encoders
/// and simulators only deal with these kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GateKind {
    /// Primary or pseudo-primary input; no fanins.
    Input,
    /// Identity.
    Buf,
    /// Inverter.
    Not,
    /// N-ary AND.
    And,
    /// N-ary NAND.
    Nand,
    /// N-ary OR.
    Or,
    /// N-ary NOR.
    Nor,
    /// N-ary XOR (odd parity).
    Xor,
    /// N-ary XNOR (even parity).
    Xnor,
    /// Constant zero.
    Const0,
    /// Constant one.
    Const1,
}

impl GateKind {
    /// The input value that forces the (pre-inversion) output, if any.
    ///
    /// AND/NAND are controlled by `0`, OR/NOR by `1`; parity gates and
    /// single-input gates have no controlling value.
    pub fn controlling_value(self) -> Option<bool> {
        match self {
            GateKind::And | GateKind::Nand => Some(false),
            GateKind::Or | GateKind::Nor => Some(true),
            _ => None,
        }
    }

    /// Whether the gate inverts its AND/OR/parity core.
    pub fn inverting(self) -> bool {
        matches!(
            self,
            GateKind::Not | GateKind::Nand | GateKind::Nor | GateKind::Xnor
        )
    }

    /// True for source nodes that take no fanins.
    pub fn is_source(self) -> bool {
        matches!(self, GateKind::Input | GateKind::Const0 | GateKind::Const1)
    }

    /// Two-valued evaluation over concrete fanin values.
    ///
    /// Source kinds evaluate to their constant (`Input` is never evaluated
    /// through this path and yields `false`).
    pub fn eval2(self, ins: &[bool]) -> bool {
        match self {
            GateKind::Input | GateKind::Const0 => false,
            GateKind::Const1 => true,
            GateKind::Buf => ins.first().copied().unwrap_or(false),
            GateKind::Not => !ins.first().copied().unwrap_or(false),
            GateKind::And => ins.iter().all(|&b| b),
            GateKind::Nand => !ins.iter().all(|&b| b),
            GateKind::Or => ins.iter().any(|&b| b),
            GateKind::Nor => !ins.iter().any(|&b| b),
            GateKind::Xor => ins.iter().fold(false, |acc, &b| acc ^ b),
            GateKind::Xnor => !ins.iter().fold(false, |acc, &b| acc ^ b),
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GateKind::Input => "input",
            GateKind::Buf => "buf",
            GateKind::Not => "not",
            GateKind::And => "and",
            GateKind::Nand => "nand",
            GateKind::Or => "or",
            GateKind::Nor => "nor",
            GateKind::Xor => "xor",
            GateKind::Xnor => "xnor",
            GateKind::Const0 => "const0",
            GateKind::Const1 => "const1",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval2_basic_gates() {
        assert!(GateKind::And.eval2(&[true, true]));
        assert!(!GateKind::And.eval2(&[true, false]));
        assert!(GateKind::Nand.eval2(&[true, false]));
        assert!(GateKind::Or.eval2(&[false, true]));
        assert!(!GateKind::Nor.eval2(&[false, true]));
        assert!(GateKind::Xor.eval2(&[true, false, false]));
        assert!(GateKind::Xnor.eval2(&[true, true, false]));
        assert!(GateKind::Not.eval2(&[false]));
        assert!(GateKind::Buf.eval2(&[true]));
        assert!(GateKind::Const1.eval2(&[]));
    }

    #[test]
    fn test_controlling_values() {
        assert_eq!(GateKind::And.controlling_value(), Some(false));
        assert_eq!(GateKind::Nand.controlling_value(), Some(false));
        assert_eq!(GateKind::Or.controlling_value(), Some(true));
        assert_eq!(GateKind::Nor.controlling_value(), Some(true));
        assert_eq!(GateKind::Xor.controlling_value(), None);
        assert_eq!(GateKind::Buf.controlling_value(), None);
    }
}
