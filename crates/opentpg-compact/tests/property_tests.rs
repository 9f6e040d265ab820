//! Property-based tests for the coloring and min-cover engines.

use opentpg_compact::{ColoringKind, MinCov, UdGraph, color_graph};
use proptest::prelude::*;

fn arb_graph() -> impl Strategy<Value = UdGraph> {
    (2usize..40).prop_flat_map(|n| {
        proptest::collection::vec(proptest::bool::ANY, n * (n - 1) / 2).prop_map(move |edges| {
            let mut g = UdGraph::new(n);
            let mut idx = 0;
            for i in 0..n {
                for j in (i + 1)..n {
                    if edges[idx] {
                        g.add_edge(i, j);
                    }
                    idx += 1;
                }
            }
            g
        })
    })
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(128))]

    /// Every heuristic must return a proper contiguous coloring.
    #[test]
    fn prop_colorings_are_proper(g in arb_graph(), seed in any::<u64>()) {
        for kind in [ColoringKind::Dsatur, ColoringKind::Isx, ColoringKind::TabuCol] {
            let c = color_graph(&g, kind, seed);
            prop_assert!(c.is_proper(&g), "{kind} returned an improper coloring");
            prop_assert!(c.num_colors >= 1);
            // Every vertex colored, colors within range.
            for &col in &c.color {
                prop_assert!(col >= 1 && col <= c.num_colors);
            }
        }
    }

    /// TabuCol never does worse than its DSATUR seed.
    #[test]
    fn prop_tabucol_no_worse_than_dsatur(g in arb_graph(), seed in any::<u64>()) {
        let d = color_graph(&g, ColoringKind::Dsatur, seed);
        let t = color_graph(&g, ColoringKind::TabuCol, seed);
        prop_assert!(t.num_colors <= d.num_colors);
    }

    /// The cover solution covers every coverable row and is locally
    /// minimal.
    #[test]
    fn prop_mincov_covers_and_is_minimal(
        elems in proptest::collection::vec((0usize..12, 0usize..10), 1..60)
    ) {
        let mut mc = MinCov::new(12, 10);
        for &(r, c) in &elems {
            mc.insert_elem(r, c);
        }
        let (cost, solution) = mc.heuristic();
        prop_assert_eq!(cost, solution.len());

        let covered = |sol: &[usize], r: usize| {
            elems.iter().any(|&(er, ec)| er == r && sol.contains(&ec))
        };
        let coverable = |r: usize| elems.iter().any(|&(er, _)| er == r);
        for r in 0..12 {
            if coverable(r) {
                prop_assert!(covered(&solution, r), "row {} uncovered", r);
            }
        }
        // Locally minimal: no chosen column is redundant.
        for skip in &solution {
            let reduced: Vec<usize> =
                solution.iter().copied().filter(|c| c != skip).collect();
            let all_covered = (0..12)
                .filter(|&r| coverable(r))
                .all(|r| covered(&reduced, r));
            prop_assert!(!all_covered, "column {} is redundant", skip);
        }
    }
}
