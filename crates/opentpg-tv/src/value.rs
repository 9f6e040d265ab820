//! The ternary value domain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One position of a three-valued test vector.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Val3 {
    /// Logic zero.
    Zero,
    /// Logic one.
    One,
    /// Don't care.
    X,
}

impl Val3 {
    /// True when the position is specified (not `X`).
    #[inline]
    pub fn is_cared(self) -> bool {
        !matches!(self, Val3::X)
    }

    /// The binary value, or `None` for `X`.
    #[inline]
    pub fn to_bool(self) -> Option<bool> {
        match self {
            Val3::Zero => Some(false),
            Val3::One => Some(true),
            Val3::X => None,
        }
    }

    /// Lift a binary value.
    #[inline]
    pub fn from_bool(b: bool) -> Self {
        if b { Val3::One } else { Val3::Zero }
    }
}

impl From<bool> for Val3 {
    fn from(b: bool) -> Self {
        Val3::from_bool(b)
    }
}

impl fmt::Display for Val3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Val3::Zero => '0',
            Val3::One => '1',
            Val3::X => 'X',
        };
        write!(f, "{c}")
    }
}
