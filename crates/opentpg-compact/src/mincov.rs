//! Heuristic minimum set cover over the fault×pattern matrix.

use std::collections::BTreeSet;
use tracing::debug;

/// A set-cover instance: rows are faults, columns are candidate patterns,
/// an element marks "this pattern detects this fault".
///
/// Rows that no column covers are unsatisfiable and silently dropped; they
/// cannot occur when the matrix is built from faults the pattern set was
/// generated for.
#[derive(Clone, Debug)]
pub struct MinCov {
    nrows: usize,
    ncols: usize,
    row_cols: Vec<BTreeSet<usize>>,
    col_rows: Vec<BTreeSet<usize>>,
}

impl MinCov {
    /// An empty `nrows` × `ncols` instance.
    pub fn new(nrows: usize, ncols: usize) -> Self {
        Self {
            nrows,
            ncols,
            row_cols: vec![BTreeSet::new(); nrows],
            col_rows: vec![BTreeSet::new(); ncols],
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    pub fn col_count(&self) -> usize {
        self.ncols
    }

    /// Mark that `col` covers `row`.
    ///
    /// # Panics
    ///
    /// Panics when either index is out of range.
    pub fn insert_elem(&mut self, row: usize, col: usize) {
        assert!(row < self.nrows && col < self.ncols, "element out of range");
        self.row_cols[row].insert(col);
        self.col_rows[col].insert(row);
    }

    /// Solve heuristically: essential-column extraction and dominance
    /// reductions to a fixpoint, then greedy cover of the remainder.
    ///
    /// Returns `(cost, solution)` with the solution columns ascending;
    /// `cost == solution.len()`.
    pub fn heuristic(&self) -> (usize, Vec<usize>) {
        let mut live_rows: BTreeSet<usize> = (0..self.nrows)
            .filter(|&r| !self.row_cols[r].is_empty())
            .collect();
        let mut live_cols: BTreeSet<usize> = (0..self.ncols).collect();
        let mut solution: BTreeSet<usize> = BTreeSet::new();

        loop {
            let mut changed = false;

            // 1. Essential columns: a live row covered by exactly one live
            //    column forces that column.
            loop {
                let mut forced: Option<usize> = None;
                for &r in &live_rows {
                    let mut covering =
                        self.row_cols[r].iter().filter(|c| live_cols.contains(*c));
                    if let (Some(&only), None) = (covering.next(), covering.next()) {
                        forced = Some(only);
                        break;
                    }
                }
                let Some(col) = forced else { break };
                solution.insert(col);
                live_cols.remove(&col);
                for &r in &self.col_rows[col] {
                    live_rows.remove(&r);
                }
                changed = true;
            }

            // 2. Column dominance: drop a live column whose live-row set is
            //    contained in another's (the lower index survives a tie).
            let cols: Vec<usize> = live_cols.iter().copied().collect();
            for &a in &cols {
                let a_rows: BTreeSet<usize> = self.col_rows[a]
                    .iter()
                    .copied()
                    .filter(|r| live_rows.contains(r))
                    .collect();
                for &b in &cols {
                    if a == b || !live_cols.contains(&b) || !live_cols.contains(&a) {
                        continue;
                    }
                    let b_rows: BTreeSet<usize> = self.col_rows[b]
                        .iter()
                        .copied()
                        .filter(|r| live_rows.contains(r))
                        .collect();
                    if a_rows.is_subset(&b_rows) && (a_rows != b_rows || a > b) {
                        live_cols.remove(&a);
                        changed = true;
                        break;
                    }
                }
            }

            // 3. Row dominance: when one row's covering columns contain
            //    another row's, the larger row is implied and dropped.
            let rows: Vec<usize> = live_rows.iter().copied().collect();
            for &r1 in &rows {
                if !live_rows.contains(&r1) {
                    continue;
                }
                let r1_cols: BTreeSet<usize> = self.row_cols[r1]
                    .iter()
                    .copied()
                    .filter(|c| live_cols.contains(c))
                    .collect();
                for &r2 in &rows {
                    if r1 == r2 || !live_rows.contains(&r2) {
                        continue;
                    }
                    let r2_cols: BTreeSet<usize> = self.row_cols[r2]
                        .iter()
                        .copied()
                        .filter(|c| live_cols.contains(c))
                        .collect();
                    if r2_cols.is_subset(&r1_cols) && (r1_cols != r2_cols || r2 < r1) {
                        live_rows.remove(&r1);
                        changed = true;
                        break;
                    }
                }
            }

            if !changed {
                break;
            }
        }

        // 4. Greedy: pick the column covering the most uncovered rows,
        //    lowest index on ties.
        while !live_rows.is_empty() {
            let mut best: Option<(usize, usize)> = None;
            for &c in &live_cols {
                let gain = self.col_rows[c]
                    .iter()
                    .filter(|r| live_rows.contains(*r))
                    .count();
                if gain == 0 {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((bg, _)) => gain > bg,
                };
                if better {
                    best = Some((gain, c));
                }
            }
            let Some((_, col)) = best else {
                // Remaining rows are uncoverable; drop them.
                break;
            };
            solution.insert(col);
            live_cols.remove(&col);
            for &r in &self.col_rows[col] {
                live_rows.remove(&r);
            }
        }

        // 5. Redundancy elimination: a greedy pick can become superfluous
        //    once later picks land; the reported solution must be locally
        //    minimal.
        let mut cover_count = vec![0usize; self.nrows];
        for &c in &solution {
            for &r in &self.col_rows[c] {
                cover_count[r] += 1;
            }
        }
        let chosen: Vec<usize> = solution.iter().copied().collect();
        for c in chosen {
            let needed = self.col_rows[c].iter().any(|&r| cover_count[r] == 1);
            if !needed {
                solution.remove(&c);
                for &r in &self.col_rows[c] {
                    cover_count[r] -= 1;
                }
            }
        }

        let solution: Vec<usize> = solution.into_iter().collect();
        debug!(
            rows = self.nrows,
            cols = self.ncols,
            cost = solution.len(),
            "min-cover heuristic"
        );
        (solution.len(), solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covers(mc: &MinCov, solution: &[usize]) -> bool {
        (0..mc.row_count()).all(|r| {
            mc.row_cols[r].is_empty() || solution.iter().any(|c| mc.row_cols[r].contains(c))
        })
    }

    #[test]
    fn test_essential_extraction_forces_both_columns() {
        // f1 only by v0, f2 only by v1, f3 by both.
        let mut mc = MinCov::new(3, 2);
        mc.insert_elem(0, 0);
        mc.insert_elem(1, 1);
        mc.insert_elem(2, 0);
        mc.insert_elem(2, 1);
        let (cost, solution) = mc.heuristic();
        assert_eq!(cost, 2);
        assert_eq!(solution, vec![0, 1]);
    }

    #[test]
    fn test_dominated_column_is_dropped() {
        // col 0 covers {0}, col 1 covers {0, 1}: col 0 is dominated.
        let mut mc = MinCov::new(2, 2);
        mc.insert_elem(0, 0);
        mc.insert_elem(0, 1);
        mc.insert_elem(1, 1);
        let (cost, solution) = mc.heuristic();
        assert_eq!(cost, 1);
        assert_eq!(solution, vec![1]);
    }

    #[test]
    fn test_greedy_prefers_wide_column() {
        let mut mc = MinCov::new(4, 3);
        // col 0 covers everything; cols 1-2 cover halves.
        for r in 0..4 {
            mc.insert_elem(r, 0);
        }
        mc.insert_elem(0, 1);
        mc.insert_elem(1, 1);
        mc.insert_elem(2, 2);
        mc.insert_elem(3, 2);
        let (cost, solution) = mc.heuristic();
        assert_eq!(cost, 1);
        assert_eq!(solution, vec![0]);
        assert!(covers(&mc, &solution));
    }

    #[test]
    fn test_solution_is_locally_minimal() {
        let mut mc = MinCov::new(5, 4);
        mc.insert_elem(0, 0);
        mc.insert_elem(1, 0);
        mc.insert_elem(1, 1);
        mc.insert_elem(2, 1);
        mc.insert_elem(3, 2);
        mc.insert_elem(4, 3);
        mc.insert_elem(3, 3);
        let (cost, solution) = mc.heuristic();
        assert!(covers(&mc, &solution));
        assert_eq!(cost, solution.len());
        // Removing any chosen column uncovers at least one row.
        for skip in &solution {
            let reduced: Vec<usize> =
                solution.iter().copied().filter(|c| c != skip).collect();
            assert!(!covers(&mc, &reduced), "column {skip} is redundant");
        }
    }

    #[test]
    fn test_uncoverable_rows_are_dropped() {
        let mut mc = MinCov::new(2, 1);
        mc.insert_elem(0, 0);
        // Row 1 has no covering column at all.
        let (cost, solution) = mc.heuristic();
        assert_eq!(cost, 1);
        assert_eq!(solution, vec![0]);
    }

    #[test]
    fn test_empty_instance() {
        let mc = MinCov::new(0, 0);
        assert_eq!(mc.heuristic(), (0, Vec::new()));
    }
}
