//! Compaction pipelines: coloring, min-cover, hybrids.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use opentpg_fsim::{Fsim3, PPSFP_BLOCK};
use opentpg_netlist::{FaultId, FaultType, Network, ReductionModes, reduce_faults};
use opentpg_tv::Tv;

use crate::coloring::{ColoringKind, color_graph};
use crate::error::CompactError;
use crate::graph::gen_compat_graph;
use crate::mincov::MinCov;

/// How merged patterns treat positions no class member specifies.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MergeFill {
    /// Leave them `X` (the default).
    #[default]
    LeaveX,
    /// Fill them with seeded random bits.
    Random,
}

/// Seed and fill policy of a compaction run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CompactionConfig {
    /// RNG seed for coloring tie-breaking and random fill.
    pub seed: u64,
    /// X-fill policy for merged patterns.
    pub fill: MergeFill,
}

/// A recognized compaction pipeline (the closed tag set).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompactionAlgorithm {
    /// Pure coloring: `dsatur`, `isx` or `tabucol`.
    Color(ColoringKind),
    /// Pure min-cover over the fault×pattern matrix.
    MinCov,
    /// Min-cover first, then coloring on the surviving patterns.
    MinCovThenColor(ColoringKind),
    /// Coloring first, then min-cover on the merged patterns.
    ColorThenMinCov(ColoringKind),
    /// `coloring2..6`: fault-list pre-reduction, min-cover, DSATUR merge.
    ColoringVariant {
        /// The variant digit, kept for round-tripping the tag.
        level: u8,
        /// Fault-reduction modes applied before matrix construction.
        reductions: ReductionModes,
    },
}

impl FromStr for CompactionAlgorithm {
    type Err = CompactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coloring_variant = |level: u8, modes: &str| {
            let reductions = modes
                .parse::<ReductionModes>()
                .map_err(|_| CompactError::UnknownAlgorithm(s.to_string()))?;
            Ok(CompactionAlgorithm::ColoringVariant { level, reductions })
        };
        match s {
            "dsatur" => Ok(Self::Color(ColoringKind::Dsatur)),
            "isx" => Ok(Self::Color(ColoringKind::Isx)),
            "tabucol" => Ok(Self::Color(ColoringKind::TabuCol)),
            "mincov" => Ok(Self::MinCov),
            "mincov+dsatur" => Ok(Self::MinCovThenColor(ColoringKind::Dsatur)),
            "mincov+isx" => Ok(Self::MinCovThenColor(ColoringKind::Isx)),
            "dsatur+mincov" => Ok(Self::ColorThenMinCov(ColoringKind::Dsatur)),
            "isx+mincov" => Ok(Self::ColorThenMinCov(ColoringKind::Isx)),
            "coloring2" => coloring_variant(2, ""),
            "coloring3" => coloring_variant(3, "red1"),
            "coloring4" => coloring_variant(4, "red2"),
            "coloring5" => coloring_variant(5, "red1,red2"),
            "coloring6" => coloring_variant(6, "red1:narrowing"),
            other => Err(CompactError::UnknownAlgorithm(other.to_string())),
        }
    }
}

impl fmt::Display for CompactionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Color(kind) => write!(f, "{kind}"),
            Self::MinCov => write!(f, "mincov"),
            Self::MinCovThenColor(kind) => write!(f, "mincov+{kind}"),
            Self::ColorThenMinCov(kind) => write!(f, "{kind}+mincov"),
            Self::ColoringVariant { level, .. } => write!(f, "coloring{level}"),
        }
    }
}

/// Coloring-based compaction of a vector list.
///
/// Builds the compatibility graph, colors it, merges every color class
/// into one pattern (class order follows the colors, so the result is
/// deterministic). Merging never weakens a care bit, so every fault some
/// input vector detects stays detected by the merged list.
pub fn compact(tvs: &[Tv], kind: ColoringKind, config: &CompactionConfig) -> Vec<Tv> {
    if tvs.is_empty() {
        return Vec::new();
    }
    let graph = gen_compat_graph(tvs);
    let coloring = color_graph(&graph, kind, config.seed);
    info!(
        initial = tvs.len(),
        reduced = coloring.num_colors,
        kind = %kind,
        "coloring compaction"
    );
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut out = Vec::with_capacity(coloring.num_colors);
    for class in coloring.classes() {
        if class.is_empty() {
            continue;
        }
        let members: Vec<Tv> = class.iter().map(|&i| tvs[i].clone()).collect();
        let merged = match Tv::merge(&members) {
            Ok(m) => m,
            // A color class is an independent set of the incompatibility
            // graph; a conflict here is a corrupted coloring.
            Err(e) => panic!("color class must be pairwise compatible: {e}"),
        };
        out.push(match config.fill {
            MergeFill::LeaveX => merged,
            MergeFill::Random => merged.random_fill(&mut rng),
        });
    }
    out
}

/// Min-cover compaction: PPSFP-simulate the vectors into a fault×pattern
/// matrix over `detected`, solve the cover, keep the selected vectors in
/// their original order.
///
/// Fault ids must come from the same collapsed fault universe the network
/// generates (fault enumeration is deterministic, so any `FaultList` of
/// this network and fault model agrees on ids).
pub fn mincov_compact(
    detected: &[FaultId],
    tvs: &[Tv],
    network: &Network,
    fault_type: FaultType,
) -> Vec<Tv> {
    if tvs.is_empty() || detected.is_empty() {
        return tvs.to_vec();
    }
    let matrix = build_cover_matrix(detected, tvs, network, fault_type);
    let (cost, solution) = matrix.heuristic();
    info!(initial = tvs.len(), reduced = cost, "min-cover compaction");
    solution.into_iter().map(|c| tvs[c].clone()).collect()
}

/// The fault×pattern incidence matrix, built block-wise with PPSFP.
fn build_cover_matrix(
    detected: &[FaultId],
    tvs: &[Tv],
    network: &Network,
    fault_type: FaultType,
) -> MinCov {
    let row_of: HashMap<FaultId, usize> = detected
        .iter()
        .enumerate()
        .map(|(i, &f)| (f, i))
        .collect();
    let mut matrix = MinCov::new(detected.len(), tvs.len());
    let mut sim = Fsim3::new(network, fault_type);
    for (block_idx, block) in tvs.chunks(PPSFP_BLOCK).enumerate() {
        let base = block_idx * PPSFP_BLOCK;
        for (fault, mut mask) in sim.ppsfp(block) {
            let Some(&row) = row_of.get(&fault) else {
                continue;
            };
            while mask != 0 {
                let p = mask.trailing_zeros() as usize;
                mask &= mask - 1;
                matrix.insert_elem(row, base + p);
            }
        }
    }
    debug!(
        rows = detected.len(),
        cols = tvs.len(),
        "cover matrix built"
    );
    matrix
}

/// Runs any pipeline of the closed tag set against one ATPG run's outputs.
#[derive(Debug)]
pub struct Compactor<'a> {
    network: &'a Network,
    fault_type: FaultType,
    detected: Vec<FaultId>,
    config: CompactionConfig,
}

impl<'a> Compactor<'a> {
    /// A compactor for the detected faults of one run.
    pub fn new(network: &'a Network, fault_type: FaultType, detected: &[FaultId]) -> Self {
        Self {
            network,
            fault_type,
            detected: detected.to_vec(),
            config: CompactionConfig::default(),
        }
    }

    /// Override seed and fill policy.
    pub fn with_config(mut self, config: CompactionConfig) -> Self {
        self.config = config;
        self
    }

    /// Run one pipeline. Takes the vector list by reference and returns a
    /// fresh list; the caller's state is never mutated.
    pub fn run(&self, algorithm: &CompactionAlgorithm, tvs: &[Tv]) -> Vec<Tv> {
        match algorithm {
            CompactionAlgorithm::Color(kind) => compact(tvs, *kind, &self.config),
            CompactionAlgorithm::MinCov => {
                mincov_compact(&self.detected, tvs, self.network, self.fault_type)
            }
            CompactionAlgorithm::MinCovThenColor(kind) => {
                let kept = mincov_compact(&self.detected, tvs, self.network, self.fault_type);
                compact(&kept, *kind, &self.config)
            }
            CompactionAlgorithm::ColorThenMinCov(kind) => {
                let merged = compact(tvs, *kind, &self.config);
                mincov_compact(&self.detected, &merged, self.network, self.fault_type)
            }
            CompactionAlgorithm::ColoringVariant { reductions, .. } => {
                let faults = self.network.gen_faults(self.fault_type);
                let reduced =
                    reduce_faults(&self.detected, &faults, self.network, *reductions);
                let kept = mincov_compact(&reduced, tvs, self.network, self.fault_type);
                compact(&kept, ColoringKind::Dsatur, &self.config)
            }
        }
    }
}
