//! Prelude for the compaction crate.

pub use crate::coloring::{Coloring, ColoringKind, color_graph};
pub use crate::error::CompactError;
pub use crate::graph::{UdGraph, gen_compat_graph};
pub use crate::mincov::MinCov;
pub use crate::pipeline::{
    CompactionAlgorithm, CompactionConfig, Compactor, MergeFill, compact, mincov_compact,
};
