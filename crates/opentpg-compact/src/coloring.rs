//! Vertex-coloring heuristics: DSATUR, ISX, TabuCol.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::graph::UdGraph;

/// Tabu tenure of TabuCol moves.
const TABU_TENURE: u64 = 10;

/// Iteration cap per TabuCol k-reduction attempt.
const TABU_ITER_CAP: u64 = 20_000;

/// Which coloring heuristic to run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColoringKind {
    /// Saturation-degree greedy.
    Dsatur,
    /// Independent-set extraction.
    Isx,
    /// Tabu-search local improvement seeded from DSATUR.
    TabuCol,
}

impl FromStr for ColoringKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dsatur" => Ok(ColoringKind::Dsatur),
            "isx" => Ok(ColoringKind::Isx),
            "tabucol" => Ok(ColoringKind::TabuCol),
            other => Err(format!("unknown coloring heuristic `{other}`")),
        }
    }
}

impl fmt::Display for ColoringKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColoringKind::Dsatur => write!(f, "dsatur"),
            ColoringKind::Isx => write!(f, "isx"),
            ColoringKind::TabuCol => write!(f, "tabucol"),
        }
    }
}

/// A (partial) vertex coloring: colors are 1-based and contiguous, color 0
/// marks an uncolored vertex (consumers drop those).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coloring {
    /// Number of colors used.
    pub num_colors: usize,
    /// Per-vertex color in `[0..=num_colors]`.
    pub color: Vec<usize>,
}

impl Coloring {
    /// Vertex indices grouped per color, colors ascending; uncolored
    /// vertices are omitted.
    pub fn classes(&self) -> Vec<Vec<usize>> {
        let mut classes = vec![Vec::new(); self.num_colors];
        for (v, &c) in self.color.iter().enumerate() {
            if c > 0 {
                classes[c - 1].push(v);
            }
        }
        classes
    }

    /// True when no edge of `g` is monochromatic and all colors are in
    /// range.
    pub fn is_proper(&self, g: &UdGraph) -> bool {
        self.color.iter().all(|&c| c <= self.num_colors)
            && (0..g.node_count()).all(|v| {
                self.color[v] == 0
                    || g.neighbors(v).all(|u| self.color[u] != self.color[v] || u == v)
            })
    }
}

/// Color a graph with the chosen heuristic.
///
/// Ordering and tie-breaks are deterministic for a fixed `seed`, because
/// downstream compaction results depend on them.
pub fn color_graph(g: &UdGraph, kind: ColoringKind, seed: u64) -> Coloring {
    let coloring = match kind {
        ColoringKind::Dsatur => dsatur(g),
        ColoringKind::Isx => isx(g),
        ColoringKind::TabuCol => tabucol(g, seed),
    };
    debug_assert!(coloring.is_proper(g));
    debug!(kind = %kind, vertices = g.node_count(), colors = coloring.num_colors, "colored");
    coloring
}

/// DSATUR: repeatedly color the uncolored vertex with maximum saturation
/// degree (distinct neighbor colors), breaking ties by maximum uncolored
/// degree, then lowest index; assign the smallest color unused among its
/// neighbors.
fn dsatur(g: &UdGraph) -> Coloring {
    let n = g.node_count();
    let mut color = vec![0usize; n];
    let mut neighbor_colors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    let mut num_colors = 0;

    for _ in 0..n {
        let mut best: Option<(usize, usize, usize)> = None;
        for v in 0..n {
            if color[v] != 0 {
                continue;
            }
            let sat = neighbor_colors[v].len();
            let udeg = g.neighbors(v).filter(|&u| color[u] == 0).count();
            let better = match best {
                None => true,
                Some((bs, bd, _)) => sat > bs || (sat == bs && udeg > bd),
            };
            if better {
                best = Some((sat, udeg, v));
            }
        }
        let Some((_, _, v)) = best else { break };
        let mut c = 1;
        while neighbor_colors[v].contains(&c) {
            c += 1;
        }
        color[v] = c;
        num_colors = num_colors.max(c);
        for u in g.neighbors(v) {
            neighbor_colors[u].insert(c);
        }
    }
    Coloring { num_colors, color }
}

/// ISX: repeatedly extract a maximal independent set (greedy by ascending
/// residual degree, lowest index first), give it a fresh color, remove it.
fn isx(g: &UdGraph) -> Coloring {
    let n = g.node_count();
    let mut color = vec![0usize; n];
    let mut remaining = vec![true; n];
    let mut left = n;
    let mut num_colors = 0;

    while left > 0 {
        num_colors += 1;
        let mut order: Vec<usize> = (0..n).filter(|&v| remaining[v]).collect();
        let rdeg: Vec<usize> = (0..n)
            .map(|v| {
                if remaining[v] {
                    g.neighbors(v).filter(|&u| remaining[u]).count()
                } else {
                    0
                }
            })
            .collect();
        order.sort_by_key(|&v| (rdeg[v], v));

        let mut in_set = vec![false; n];
        for &v in &order {
            if g.neighbors(v).all(|u| !in_set[u]) {
                in_set[v] = true;
            }
        }
        for v in 0..n {
            if in_set[v] {
                color[v] = num_colors;
                remaining[v] = false;
                left -= 1;
            }
        }
    }
    Coloring { num_colors, color }
}

/// TabuCol: start from the DSATUR coloring and repeatedly attempt a
/// (k-1)-coloring by local search. One move recolors one vertex; a move
/// back to a vertex's previous color is tabu for [`TABU_TENURE`]
/// iterations unless it beats the best conflict count seen in the attempt
/// (aspiration). An attempt succeeds on zero monochromatic edges and gives
/// up at [`TABU_ITER_CAP`] iterations.
fn tabucol(g: &UdGraph, seed: u64) -> Coloring {
    let n = g.node_count();
    let mut best = dsatur(g);
    let mut rng = StdRng::seed_from_u64(seed);

    while best.num_colors > 1 {
        let k = best.num_colors - 1;
        match try_k_coloring(g, &best, k, &mut rng) {
            Some(color) => {
                best = Coloring {
                    num_colors: k,
                    color,
                };
                debug!(colors = k, vertices = n, "tabucol improved");
            }
            None => break,
        }
    }
    best
}

/// One tabu-search attempt at a proper `k`-coloring.
fn try_k_coloring(
    g: &UdGraph,
    seed_coloring: &Coloring,
    k: usize,
    rng: &mut StdRng,
) -> Option<Vec<usize>> {
    let n = g.node_count();
    // Project the seed coloring into [1..=k]; overflowing colors scatter.
    let mut color: Vec<usize> = seed_coloring
        .color
        .iter()
        .map(|&c| {
            if (1..=k).contains(&c) {
                c
            } else {
                rng.random_range(1..=k)
            }
        })
        .collect();

    // adj[v][c-1] = neighbors of v currently colored c.
    let mut adj: Vec<Vec<usize>> = (0..n)
        .map(|v| {
            let mut counts = vec![0usize; k];
            for u in g.neighbors(v) {
                counts[color[u] - 1] += 1;
            }
            counts
        })
        .collect();
    let mut conflicts: usize = (0..n).map(|v| adj[v][color[v] - 1]).sum::<usize>() / 2;
    let mut best_conflicts = conflicts;
    let mut tabu_until = vec![vec![0u64; k]; n];

    let mut iter: u64 = 0;
    while conflicts > 0 && iter < TABU_ITER_CAP {
        iter += 1;
        // Best admissible move: most negative conflict delta; ties go to
        // the lowest (vertex, color) pair for determinism.
        let mut chosen: Option<(isize, usize, usize)> = None;
        for v in 0..n {
            let cur = color[v];
            if adj[v][cur - 1] == 0 {
                continue;
            }
            for c in 1..=k {
                if c == cur {
                    continue;
                }
                let delta = adj[v][c - 1] as isize - adj[v][cur - 1] as isize;
                let resulting = conflicts as isize + delta;
                let tabu = tabu_until[v][c - 1] > iter;
                if tabu && resulting >= best_conflicts as isize {
                    continue;
                }
                if chosen.is_none_or(|(bd, _, _)| delta < bd) {
                    chosen = Some((delta, v, c));
                }
            }
        }
        let (delta, v, c) = chosen?;
        let old = color[v];
        color[v] = c;
        tabu_until[v][old - 1] = iter + TABU_TENURE;
        for u in g.neighbors(v) {
            adj[u][old - 1] -= 1;
            adj[u][c - 1] += 1;
        }
        conflicts = (conflicts as isize + delta) as usize;
        best_conflicts = best_conflicts.min(conflicts);
    }

    if conflicts == 0 { Some(color) } else { None }
}
