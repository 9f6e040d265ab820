//! The DPLL search core.

use tracing::trace;

use crate::types::{Lit, Model, SatResult, Var};

/// A clause-set plus search state.
///
/// Clauses can only be added, never removed; `solve` may be called
/// repeatedly and restarts the search from scratch each time, so callers
/// can iterate "solve, block the model, solve again". Cloning the solver
/// clones the clause database, which the test-generation engine uses to
/// share one encoded circuit cone across many fault targets.
#[derive(Clone, Debug, Default)]
pub struct Solver {
    num_vars: u32,
    clauses: Vec<Vec<Lit>>,
    watches: Vec<Vec<u32>>,
    units: Vec<Lit>,
    has_empty_clause: bool,
    conflict_budget: Option<u64>,

    assign: Vec<Option<bool>>,
    trail: Vec<Lit>,
    qhead: usize,
    decisions: Vec<Decision>,
}

#[derive(Clone, Debug)]
struct Decision {
    var: Var,
    trail_start: usize,
    flipped: bool,
}

impl Solver {
    /// An empty solver with no conflict budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the search to `budget` conflicts; exceeding it yields
    /// [`SatResult::Unknown`].
    pub fn set_conflict_budget(&mut self, budget: u64) {
        self.conflict_budget = Some(budget);
    }

    /// Allocate a fresh variable.
    pub fn new_var(&mut self) -> Var {
        let v = Var(self.num_vars);
        self.num_vars += 1;
        self.watches.push(Vec::new());
        self.watches.push(Vec::new());
        v
    }

    /// Number of allocated variables.
    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    /// Add a clause (a disjunction of literals).
    ///
    /// Tautologies are dropped, duplicate literals collapsed. An empty
    /// clause marks the whole formula unsatisfiable.
    ///
    /// # Panics
    ///
    /// Panics if a literal references a variable that was never allocated.
    pub fn add_clause(&mut self, lits: &[Lit]) {
        for l in lits {
            assert!(
                l.var().0 < self.num_vars,
                "literal {l} references unallocated variable"
            );
        }
        let mut c: Vec<Lit> = lits.to_vec();
        c.sort_unstable();
        c.dedup();
        // After sorting by code, a variable's positive and negative literal
        // are adjacent.
        if c.windows(2).any(|w| w[0] == !w[1]) {
            return;
        }
        match c.len() {
            0 => self.has_empty_clause = true,
            1 => self.units.push(c[0]),
            _ => {
                let ci = self.clauses.len() as u32;
                self.watches[c[0].code()].push(ci);
                self.watches[c[1].code()].push(ci);
                self.clauses.push(c);
            }
        }
    }

    /// Run the search.
    pub fn solve(&mut self) -> SatResult {
        if self.has_empty_clause {
            return SatResult::Unsat;
        }
        self.assign = vec![None; self.num_vars as usize];
        self.trail.clear();
        self.qhead = 0;
        self.decisions.clear();

        let units = self.units.clone();
        for u in units {
            if !self.enqueue(u) {
                return SatResult::Unsat;
            }
        }

        let mut conflicts: u64 = 0;
        loop {
            if self.propagate() {
                conflicts += 1;
                if self.conflict_budget.is_some_and(|b| conflicts >= b) {
                    trace!(conflicts, "conflict budget exhausted");
                    return SatResult::Unknown;
                }
                if !self.backtrack() {
                    trace!(conflicts, "unsatisfiable");
                    return SatResult::Unsat;
                }
            } else {
                match self.next_unassigned() {
                    None => {
                        trace!(conflicts, "satisfiable");
                        let values = self.assign.iter().map(|o| o.unwrap_or(false)).collect();
                        return SatResult::Sat(Model::new(values));
                    }
                    Some(var) => {
                        self.decisions.push(Decision {
                            var,
                            trail_start: self.trail.len(),
                            flipped: false,
                        });
                        // Zero-first keeps models reproducible.
                        let ok = self.enqueue(Lit::neg(var));
                        debug_assert!(ok, "decision variable already assigned");
                    }
                }
            }
        }
    }

    /// Unit propagation; true on conflict.
    fn propagate(&mut self) -> bool {
        while self.qhead < self.trail.len() {
            let p = self.trail[self.qhead];
            self.qhead += 1;
            let false_lit = !p;

            let watchers = std::mem::take(&mut self.watches[false_lit.code()]);
            let mut keep: Vec<u32> = Vec::with_capacity(watchers.len());
            let mut conflict = false;

            for (wi, &ci) in watchers.iter().enumerate() {
                let (first, moved_to) = {
                    let c = &mut self.clauses[ci as usize];
                    if c[0] == false_lit {
                        c.swap(0, 1);
                    }
                    let first = c[0];
                    if lit_value(&self.assign, first) == Some(true) {
                        keep.push(ci);
                        continue;
                    }
                    let replacement = (2..c.len())
                        .find(|&k| lit_value(&self.assign, c[k]) != Some(false));
                    match replacement {
                        Some(k) => {
                            c.swap(1, k);
                            (first, Some(c[1]))
                        }
                        None => (first, None),
                    }
                };
                match moved_to {
                    Some(w) => self.watches[w.code()].push(ci),
                    None => {
                        keep.push(ci);
                        match lit_value(&self.assign, first) {
                            None => {
                                let ok = self.enqueue(first);
                                debug_assert!(ok, "implied literal must be enqueueable");
                            }
                            Some(false) => {
                                // Conflict: keep the untouched tail watchers.
                                keep.extend_from_slice(&watchers[wi + 1..]);
                                conflict = true;
                            }
                            Some(true) => {}
                        }
                        if conflict {
                            break;
                        }
                    }
                }
            }

            self.watches[false_lit.code()] = keep;
            if conflict {
                return true;
            }
        }
        false
    }

    /// Chronological backtracking: undo to the deepest decision that has an
    /// untried polarity and flip it. False when the tree is exhausted.
    fn backtrack(&mut self) -> bool {
        while let Some(mut d) = self.decisions.pop() {
            while self.trail.len() > d.trail_start {
                if let Some(l) = self.trail.pop() {
                    self.assign[l.var().index()] = None;
                }
            }
            self.qhead = d.trail_start;
            if !d.flipped {
                d.flipped = true;
                let var = d.var;
                self.decisions.push(d);
                let ok = self.enqueue(Lit::pos(var));
                debug_assert!(ok, "flipped decision must be enqueueable");
                return true;
            }
        }
        false
    }

    fn enqueue(&mut self, l: Lit) -> bool {
        match self.assign[l.var().index()] {
            Some(v) => v == l.asserted_value(),
            None => {
                self.assign[l.var().index()] = Some(l.asserted_value());
                self.trail.push(l);
                true
            }
        }
    }

    fn next_unassigned(&self) -> Option<Var> {
        self.assign
            .iter()
            .position(Option::is_none)
            .map(|i| Var(i as u32))
    }
}

#[inline]
fn lit_value(assign: &[Option<bool>], l: Lit) -> Option<bool> {
    assign[l.var().index()].map(|v| v ^ l.is_neg())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sat_model(s: &mut Solver) -> Model {
        match s.solve() {
            SatResult::Sat(m) => m,
            other => panic!("expected SAT, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_formula_is_sat() {
        let mut s = Solver::new();
        assert!(matches!(s.solve(), SatResult::Sat(_)));
    }

    #[test]
    fn test_unit_conflict_is_unsat() {
        let mut s = Solver::new();
        let a = s.new_var();
        s.add_clause(&[Lit::pos(a)]);
        s.add_clause(&[Lit::neg(a)]);
        assert_eq!(s.solve(), SatResult::Unsat);
    }

    #[test]
    fn test_implication_chain() {
        let mut s = Solver::new();
        let vars: Vec<Var> = (0..8).map(|_| s.new_var()).collect();
        for w in vars.windows(2) {
            s.add_clause(&[Lit::neg(w[0]), Lit::pos(w[1])]);
        }
        s.add_clause(&[Lit::pos(vars[0])]);
        let m = sat_model(&mut s);
        for &v in &vars {
            assert!(m.value(v));
        }
    }

    #[test]
    fn test_tautology_is_dropped() {
        let mut s = Solver::new();
        let a = s.new_var();
        s.add_clause(&[Lit::pos(a), Lit::neg(a)]);
        // Would be trivially unsat if the tautology were kept as empty-ish.
        s.add_clause(&[Lit::neg(a)]);
        let m = sat_model(&mut s);
        assert!(!m.value(a));
    }

    fn pigeonhole_3_2(s: &mut Solver) {
        // 3 pigeons, 2 holes: p[i][j] = pigeon i sits in hole j.
        let p: Vec<Vec<Var>> = (0..3)
            .map(|_| (0..2).map(|_| s.new_var()).collect())
            .collect();
        for row in &p {
            s.add_clause(&[Lit::pos(row[0]), Lit::pos(row[1])]);
        }
        for j in 0..2 {
            for i1 in 0..3 {
                for i2 in (i1 + 1)..3 {
                    s.add_clause(&[Lit::neg(p[i1][j]), Lit::neg(p[i2][j])]);
                }
            }
        }
    }

    #[test]
    fn test_pigeonhole_unsat() {
        let mut s = Solver::new();
        pigeonhole_3_2(&mut s);
        assert_eq!(s.solve(), SatResult::Unsat);
    }

    #[test]
    fn test_conflict_budget_yields_unknown() {
        let mut s = Solver::new();
        pigeonhole_3_2(&mut s);
        s.set_conflict_budget(1);
        assert_eq!(s.solve(), SatResult::Unknown);
    }

    #[test]
    fn test_resolve_after_blocking_clause() {
        let mut s = Solver::new();
        let a = s.new_var();
        let b = s.new_var();
        s.add_clause(&[Lit::pos(a), Lit::pos(b)]);
        let m1 = sat_model(&mut s);
        // Block the first model and ask again.
        let block: Vec<Lit> = [a, b]
            .iter()
            .map(|&v| Lit::with_value(v, !m1.value(v)))
            .collect();
        s.add_clause(&block);
        let m2 = sat_model(&mut s);
        assert_ne!(m1, m2);
    }

    #[test]
    fn test_deterministic_models() {
        let mut s1 = Solver::new();
        let mut s2 = Solver::new();
        for s in [&mut s1, &mut s2] {
            let vars: Vec<Var> = (0..6).map(|_| s.new_var()).collect();
            s.add_clause(&[Lit::pos(vars[0]), Lit::pos(vars[3])]);
            s.add_clause(&[Lit::neg(vars[1]), Lit::pos(vars[4])]);
            s.add_clause(&[Lit::neg(vars[2]), Lit::neg(vars[5])]);
        }
        let m1 = sat_model(&mut s1);
        let m2 = sat_model(&mut s2);
        assert_eq!(m1, m2);
    }

    #[test]
    fn test_clone_shares_clauses_not_state() {
        let mut s = Solver::new();
        let a = s.new_var();
        s.add_clause(&[Lit::pos(a)]);
        let mut forked = s.clone();
        forked.add_clause(&[Lit::neg(a)]);
        assert_eq!(forked.solve(), SatResult::Unsat);
        assert!(matches!(s.solve(), SatResult::Sat(_)));
    }
}
