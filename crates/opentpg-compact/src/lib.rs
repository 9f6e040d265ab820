//! Static Test-Set Compaction for OpenTPG
//!
//! After test generation, many vectors are partially specified and can be
//! folded into each other. This crate shrinks the vector list two ways and
//! composes them into pipelines:
//!
//! - **Coloring**: build the compatibility graph (edges join vectors that
//!   conflict on a specified position) and color it; each color class is
//!   pairwise compatible and merges into one pattern. Heuristics: DSATUR,
//!   independent-set extraction (ISX), and TabuCol local search.
//! - **Min-cover**: fault-simulate the vectors (PPSFP) into a
//!   fault×pattern matrix and pick a small column subset covering every
//!   fault.
//! - **Hybrids**: `mincov+dsatur`, `dsatur+mincov`, the `coloring2..6`
//!   variants with fault-list pre-reduction, and friends.
//!
//! Everything is deterministic for a fixed seed.

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![deny(unused_must_use)]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod coloring;
pub mod error;
pub mod graph;
pub mod mincov;
pub mod pipeline;
pub mod prelude;

pub use coloring::{Coloring, ColoringKind, color_graph};
pub use error::CompactError;
pub use graph::{UdGraph, gen_compat_graph};
pub use mincov::MinCov;
pub use pipeline::{
    CompactionAlgorithm, CompactionConfig, Compactor, MergeFill, compact, mincov_compact,
};
