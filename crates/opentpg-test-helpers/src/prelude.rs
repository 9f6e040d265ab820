//! Convenience re-exports for test modules.

pub use crate::circuits::{
    AND2_BENCH, AND2_BLIF, C17_BENCH, INVERTER_BENCH, REDUNDANT_OR_BENCH, and2, c17, inverter,
    redundant_or,
};
pub use crate::must::{must, must_some};
