//! The per-unit test-generation engine.
//!
//! One engine is constructed per partitioning unit (a node's output cone,
//! an FFR or an MFFC) and encodes the *good* circuit once: every node in
//! the root's transitive fanout plus that cone's full transitive support.
//! Each `solve` call then clones the base solver and adds the
//! fault-specific part: the faulty copy of the fault site's fanout cone, an
//! activation constraint at the site, and an XOR miter across every
//! reachable observation point.
//!
//! Transition-delay faults additionally get a launch-frame copy of the
//! fault line's fanin cone, pinned to the pre-transition value.

use std::collections::HashMap;

use opentpg_netlist::{Fault, FaultSite, FaultType, GateKind, Network, NodeId};
use opentpg_netlist::{Ffr, Mffc};
use opentpg_sat::{Lit, SatResult, Solver, Var};
use opentpg_tv::{Tv, TvBuilder, Val3};
use tracing::{debug, trace};

/// Default conflict budget per `solve` call; exhausting it aborts the
/// fault.
pub const DEFAULT_CONFLICT_BUDGET: u64 = 100_000;

/// Result of a single-pattern solve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveOutcome {
    /// A test vector detecting the fault.
    Detected(Tv),
    /// The fault is proven redundant.
    Untestable,
    /// The conflict budget ran out.
    Aborted,
}

/// Result of a k-detection solve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SolveKOutcome {
    /// Up to `k` distinct vectors, each detecting the fault.
    Detected(Vec<Tv>),
    /// The fault is proven redundant.
    Untestable,
    /// The conflict budget ran out before the first vector.
    Aborted,
}

/// SAT-backed test generator for the faults of one partitioning unit.
#[derive(Debug)]
pub struct DtpgEngine<'a> {
    network: &'a Network,
    fault_type: FaultType,
    root: NodeId,
    base: Solver,
    gvar: Vec<Option<Var>>,
    conflict_budget: u64,
}

impl<'a> DtpgEngine<'a> {
    /// Engine for the output cone of a single node.
    pub fn for_node(network: &'a Network, fault_type: FaultType, root: NodeId) -> Self {
        Self::build(network, fault_type, root)
    }

    /// Engine for a fanout-free region.
    pub fn for_ffr(network: &'a Network, fault_type: FaultType, ffr: &Ffr) -> Self {
        Self::build(network, fault_type, ffr.root)
    }

    /// Engine for a maximal fanout-free cone.
    pub fn for_mffc(network: &'a Network, fault_type: FaultType, mffc: &Mffc) -> Self {
        Self::build(network, fault_type, mffc.root)
    }

    /// Override the per-call conflict budget.
    pub fn with_conflict_budget(mut self, budget: u64) -> Self {
        self.conflict_budget = budget;
        self
    }

    fn build(network: &'a Network, fault_type: FaultType, root: NodeId) -> Self {
        // Region = TFO(root) plus the transitive support of that cone.
        let mut in_region = vec![false; network.node_count()];
        let mut stack = vec![root];
        in_region[root.index()] = true;
        let mut tfo: Vec<NodeId> = Vec::new();
        while let Some(n) = stack.pop() {
            tfo.push(n);
            for &(fo, _) in network.fanouts(n) {
                if !in_region[fo.index()] {
                    in_region[fo.index()] = true;
                    stack.push(fo);
                }
            }
        }
        let mut region = tfo;
        let mut i = 0;
        while i < region.len() {
            let fanins = &network.node(region[i]).fanins;
            for &f in fanins {
                if !in_region[f.index()] {
                    in_region[f.index()] = true;
                    region.push(f);
                }
            }
            i += 1;
        }
        region.sort_unstable();

        let mut base = Solver::new();
        let mut gvar: Vec<Option<Var>> = vec![None; network.node_count()];
        for &nid in &region {
            gvar[nid.index()] = Some(base.new_var());
        }
        for &nid in &region {
            let node = network.node(nid);
            if node.kind == GateKind::Input {
                continue;
            }
            let y = gvar[nid.index()].unwrap_or(Var(0));
            let xs: Vec<Var> = node
                .fanins
                .iter()
                .map(|f| gvar[f.index()].unwrap_or(Var(0)))
                .collect();
            encode_gate(&mut base, node.kind, y, &xs);
        }
        debug!(root = %root, region = region.len(), "encoded dtpg unit");

        Self {
            network,
            fault_type,
            root,
            base,
            gvar,
            conflict_budget: DEFAULT_CONFLICT_BUDGET,
        }
    }

    /// The unit root this engine was built for.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Generate one test vector for a fault of this unit.
    pub fn solve(&self, fault: &Fault) -> SolveOutcome {
        let Some(mut prep) = self.prepare(fault) else {
            return SolveOutcome::Untestable;
        };
        match prep.solver.solve() {
            SatResult::Sat(model) => {
                let tv = self.extract(&prep, &model);
                trace!(fault = %fault, tv = %tv, "detected");
                SolveOutcome::Detected(tv)
            }
            SatResult::Unsat => SolveOutcome::Untestable,
            SatResult::Unknown => SolveOutcome::Aborted,
        }
    }

    /// Generate up to `k` distinct vectors for a fault.
    ///
    /// Each returned vector detects the fault; vectors differ on at least
    /// one cared position. The solve stops early once the space of
    /// distinct input assignments is exhausted.
    pub fn solve_k(&self, fault: &Fault, k: u32) -> SolveKOutcome {
        let Some(mut prep) = self.prepare(fault) else {
            return SolveKOutcome::Untestable;
        };
        let mut found: Vec<Tv> = Vec::new();
        while (found.len() as u32) < k {
            match prep.solver.solve() {
                SatResult::Sat(model) => {
                    // Block this exact assignment of the cone's inputs.
                    let block: Vec<Lit> = prep
                        .input_vars
                        .iter()
                        .map(|&(_, v)| Lit::with_value(v, !model.value(v)))
                        .collect();
                    found.push(self.extract(&prep, &model));
                    if block.is_empty() {
                        break;
                    }
                    prep.solver.add_clause(&block);
                }
                SatResult::Unsat => break,
                SatResult::Unknown => {
                    if found.is_empty() {
                        return SolveKOutcome::Aborted;
                    }
                    break;
                }
            }
        }
        if found.is_empty() {
            SolveKOutcome::Untestable
        } else {
            SolveKOutcome::Detected(found)
        }
    }

    /// Clone the base solver and add the fault-specific encoding.
    ///
    /// Returns `None` when the fault effect cannot reach any observation
    /// point, which is untestability by construction.
    fn prepare(&self, fault: &Fault) -> Option<Prepared> {
        let site = fault.node();
        assert!(
            self.gvar[site.index()].is_some(),
            "fault {fault} lies outside the encoded unit of {}",
            self.root
        );
        let mut solver = self.base.clone();
        let mut fvar: HashMap<NodeId, Var> = HashMap::new();

        // Injection and activation at the site.
        match fault.site() {
            FaultSite::Output => {
                let fv = solver.new_var();
                solver.add_clause(&[Lit::with_value(fv, fault.value())]);
                fvar.insert(site, fv);
                let gv = self.gvar_of(site);
                solver.add_clause(&[Lit::with_value(gv, !fault.value())]);
            }
            FaultSite::Input(pin) => {
                let node = self.network.node(site);
                let branch = node.fanins[pin as usize];
                let cv = solver.new_var();
                solver.add_clause(&[Lit::with_value(cv, fault.value())]);
                let xs: Vec<Var> = node
                    .fanins
                    .iter()
                    .enumerate()
                    .map(|(kk, f)| if kk == pin as usize { cv } else { self.gvar_of(*f) })
                    .collect();
                let fv = solver.new_var();
                encode_gate(&mut solver, node.kind, fv, &xs);
                fvar.insert(site, fv);
                solver.add_clause(&[Lit::with_value(self.gvar_of(branch), !fault.value())]);
            }
        }

        // Faulty copy of the site's fanout cone. Nodes outside the encoded
        // region cannot reach an observation point and are skipped.
        let cone = self.site_cone(site);
        for &nid in &cone {
            if nid == site {
                continue;
            }
            let node = self.network.node(nid);
            let xs: Vec<Var> = node
                .fanins
                .iter()
                .map(|f| fvar.get(f).copied().unwrap_or_else(|| self.gvar_of(*f)))
                .collect();
            let fv = solver.new_var();
            encode_gate(&mut solver, node.kind, fv, &xs);
            fvar.insert(nid, fv);
        }

        // XOR miter over the reachable observation points.
        let mut dlits: Vec<Lit> = Vec::new();
        for &out in self.network.outputs() {
            if let Some(&fv) = fvar.get(&out) {
                let d = solver.new_var();
                encode_xor2(&mut solver, d, self.gvar_of(out), fv);
                dlits.push(Lit::pos(d));
            }
        }
        if dlits.is_empty() {
            return None;
        }
        solver.add_clause(&dlits);

        // Capture-frame input variables (frame 0 for stuck-at).
        let ninputs = self.network.input_count();
        let capture_offset = match self.fault_type {
            FaultType::StuckAt => 0,
            FaultType::TransitionDelay => ninputs,
        };
        let mut input_vars: Vec<(usize, Var)> = Vec::new();
        for (idx, slot) in self.gvar.iter().enumerate() {
            if let (Some(v), Some(pos)) = (slot, self.network.input_position(NodeId(idx as u32)))
            {
                input_vars.push((capture_offset + pos, *v));
            }
        }

        // Launch frame for transition faults: encode the fanin cone of the
        // fault line and pin it to the pre-transition value.
        if self.fault_type == FaultType::TransitionDelay {
            let line = match fault.site() {
                FaultSite::Output => site,
                FaultSite::Input(pin) => self.network.node(site).fanins[pin as usize],
            };
            let tfi = self.line_support(line);
            let mut lvar: HashMap<NodeId, Var> = HashMap::new();
            for &nid in &tfi {
                lvar.insert(nid, solver.new_var());
            }
            for &nid in &tfi {
                let node = self.network.node(nid);
                if node.kind == GateKind::Input {
                    if let Some(pos) = self.network.input_position(nid) {
                        input_vars.push((pos, lvar[&nid]));
                    }
                    continue;
                }
                let xs: Vec<Var> = node.fanins.iter().map(|f| lvar[f]).collect();
                encode_gate(&mut solver, node.kind, lvar[&nid], &xs);
            }
            solver.add_clause(&[Lit::with_value(lvar[&line], fault.value())]);
        }

        solver.set_conflict_budget(self.conflict_budget);
        input_vars.sort_unstable_by_key(|&(pos, _)| pos);
        Some(Prepared { solver, input_vars })
    }

    fn extract(&self, prep: &Prepared, model: &opentpg_sat::Model) -> Tv {
        let mut builder = TvBuilder::new(self.network.tv_width(self.fault_type));
        for &(pos, v) in &prep.input_vars {
            builder.set(pos, Val3::from_bool(model.value(v)));
        }
        builder.build()
    }

    #[inline]
    fn gvar_of(&self, n: NodeId) -> Var {
        match self.gvar[n.index()] {
            Some(v) => v,
            None => unreachable_region(n),
        }
    }

    /// TFO of the site, restricted to the encoded region, in topological
    /// order.
    fn site_cone(&self, site: NodeId) -> Vec<NodeId> {
        let mut seen = vec![false; self.network.node_count()];
        seen[site.index()] = true;
        let mut cone = vec![site];
        let mut i = 0;
        while i < cone.len() {
            for &(fo, _) in self.network.fanouts(cone[i]) {
                if !seen[fo.index()] && self.gvar[fo.index()].is_some() {
                    seen[fo.index()] = true;
                    cone.push(fo);
                }
            }
            i += 1;
        }
        cone.sort_unstable();
        cone
    }

    /// TFI of a line (inclusive), in topological order.
    fn line_support(&self, line: NodeId) -> Vec<NodeId> {
        let mut seen = vec![false; self.network.node_count()];
        seen[line.index()] = true;
        let mut tfi = vec![line];
        let mut i = 0;
        while i < tfi.len() {
            for &f in &self.network.node(tfi[i]).fanins {
                if !seen[f.index()] {
                    seen[f.index()] = true;
                    tfi.push(f);
                }
            }
            i += 1;
        }
        tfi.sort_unstable();
        tfi
    }
}

struct Prepared {
    solver: Solver,
    /// `(tv position, solver variable)` pairs, sorted by position.
    input_vars: Vec<(usize, Var)>,
}

#[cold]
fn unreachable_region(n: NodeId) -> ! {
    panic!("node {n} outside the encoded region")
}

/// Tseitin clauses for `y <-> kind(xs)`.
fn encode_gate(solver: &mut Solver, kind: GateKind, y: Var, xs: &[Var]) {
    match kind {
        GateKind::Input => {}
        GateKind::Const0 => solver.add_clause(&[Lit::neg(y)]),
        GateKind::Const1 => solver.add_clause(&[Lit::pos(y)]),
        GateKind::Buf => {
            encode_equiv(solver, y, xs[0], false);
        }
        GateKind::Not => {
            encode_equiv(solver, y, xs[0], true);
        }
        GateKind::And | GateKind::Nand => {
            // t = AND(xs); y is t for AND, !t for NAND.
            let t = Lit::with_value(y, kind == GateKind::And);
            let mut long: Vec<Lit> = vec![t];
            for &x in xs {
                solver.add_clause(&[!t, Lit::pos(x)]);
                long.push(Lit::neg(x));
            }
            solver.add_clause(&long);
        }
        GateKind::Or | GateKind::Nor => {
            // t = OR(xs); y is t for OR, !t for NOR.
            let t = Lit::with_value(y, kind == GateKind::Or);
            let mut long: Vec<Lit> = vec![!t];
            for &x in xs {
                solver.add_clause(&[t, Lit::neg(x)]);
                long.push(Lit::pos(x));
            }
            solver.add_clause(&long);
        }
        GateKind::Xor | GateKind::Xnor => {
            encode_parity(solver, y, xs, kind == GateKind::Xnor);
        }
    }
}

/// `y <-> x` (or `y <-> !x` when `invert`).
fn encode_equiv(solver: &mut Solver, y: Var, x: Var, invert: bool) {
    let xl = |value: bool| Lit::with_value(x, value != invert);
    solver.add_clause(&[Lit::neg(y), xl(true)]);
    solver.add_clause(&[Lit::pos(y), xl(false)]);
}

/// `y <-> a ^ b`.
fn encode_xor2(solver: &mut Solver, y: Var, a: Var, b: Var) {
    solver.add_clause(&[Lit::neg(y), Lit::pos(a), Lit::pos(b)]);
    solver.add_clause(&[Lit::neg(y), Lit::neg(a), Lit::neg(b)]);
    solver.add_clause(&[Lit::pos(y), Lit::neg(a), Lit::pos(b)]);
    solver.add_clause(&[Lit::pos(y), Lit::pos(a), Lit::neg(b)]);
}

/// `y <-> parity(xs)` (XNOR when `invert`).
fn encode_parity(solver: &mut Solver, y: Var, xs: &[Var], invert: bool) {
    match xs {
        [] => solver.add_clause(&[Lit::with_value(y, invert)]),
        [x] => encode_equiv(solver, y, *x, invert),
        [a, rest @ ..] => {
            let mut acc = *a;
            for (i, &x) in rest.iter().enumerate() {
                let is_last = i + 1 == rest.len();
                if is_last && !invert {
                    encode_xor2(solver, y, acc, x);
                } else {
                    let t = solver.new_var();
                    encode_xor2(solver, t, acc, x);
                    acc = t;
                }
            }
            if invert {
                encode_equiv(solver, y, acc, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentpg_test_helpers::prelude::*;

    fn fault_at(
        network: &Network,
        faults: &opentpg_netlist::FaultList,
        name: &str,
        site: FaultSite,
        value: bool,
    ) -> Fault {
        let node = must_some(network.find_node(name), name);
        *must_some(
            faults
                .faults_of_node(node)
                .iter()
                .find(|f| f.site() == site && f.value() == value),
            "fault lookup",
        )
    }

    #[test]
    fn test_inverter_input_stuck_at_0() {
        let n = inverter();
        let faults = n.gen_faults(opentpg_netlist::FaultType::StuckAt);
        let a = must_some(n.find_node("a"), "a");
        let fault = fault_at(&n, &faults, "a", FaultSite::Output, false);
        let engine = DtpgEngine::for_node(&n, opentpg_netlist::FaultType::StuckAt, a);
        match engine.solve(&fault) {
            SolveOutcome::Detected(tv) => {
                // Activating a stuck-at-0 needs a = 1.
                assert_eq!(tv.to_string(), "1");
            }
            other => panic!("expected detection, got {other:?}"),
        }
    }

    #[test]
    fn test_inverter_output_stuck_at_0() {
        let n = inverter();
        let faults = n.gen_faults(opentpg_netlist::FaultType::StuckAt);
        let y = must_some(n.find_node("y"), "y");
        let fault = fault_at(&n, &faults, "y", FaultSite::Output, false);
        let engine = DtpgEngine::for_node(&n, opentpg_netlist::FaultType::StuckAt, y);
        match engine.solve(&fault) {
            SolveOutcome::Detected(tv) => {
                // The inverter output is 1 only when a = 0.
                assert_eq!(tv.to_string(), "0");
                assert!(tv.is_fully_specified());
            }
            other => panic!("expected detection, got {other:?}"),
        }
    }

    #[test]
    fn test_and2_branch_stuck_at_1() {
        let n = and2();
        let faults = n.gen_faults(opentpg_netlist::FaultType::StuckAt);
        let fault = fault_at(&n, &faults, "a", FaultSite::Output, true);
        let y = must_some(n.find_node("y"), "y");
        let engine = DtpgEngine::for_node(&n, opentpg_netlist::FaultType::StuckAt, y);
        match engine.solve(&fault) {
            SolveOutcome::Detected(tv) => {
                // a stuck-at-1 needs a=0 to activate and b=1 to propagate.
                assert_eq!(tv.to_string(), "01");
            }
            other => panic!("expected detection, got {other:?}"),
        }
    }

    #[test]
    fn test_redundant_branch_is_untestable() {
        let n = redundant_or();
        let faults = n.gen_faults(opentpg_netlist::FaultType::StuckAt);
        let fault = fault_at(&n, &faults, "y", FaultSite::Input(0), false);
        let y = must_some(n.find_node("y"), "y");
        let engine = DtpgEngine::for_node(&n, opentpg_netlist::FaultType::StuckAt, y);
        assert_eq!(engine.solve(&fault), SolveOutcome::Untestable);
    }

    #[test]
    fn test_solve_k_returns_distinct_vectors() {
        let n = c17();
        let ft = opentpg_netlist::FaultType::StuckAt;
        let faults = n.gen_faults(ft);
        let ffrs = n.ffr_list();
        let ffr = must_some(
            ffrs.iter().find(|f| {
                !faults.representatives_of_unit(&f.nodes).is_empty()
            }),
            "ffr with faults",
        );
        let engine = DtpgEngine::for_ffr(&n, ft, ffr);
        let target = faults.representatives_of_unit(&ffr.nodes)[0];
        match engine.solve_k(faults.get(target), 3) {
            SolveKOutcome::Detected(tvs) => {
                assert!(!tvs.is_empty() && tvs.len() <= 3);
                for i in 0..tvs.len() {
                    for j in (i + 1)..tvs.len() {
                        assert_ne!(tvs[i], tvs[j], "vectors must be distinct");
                    }
                }
            }
            other => panic!("expected detection, got {other:?}"),
        }
    }

    #[test]
    fn test_generated_vector_detects_fault_in_simulation() {
        let n = c17();
        let ft = opentpg_netlist::FaultType::StuckAt;
        let faults = n.gen_faults(ft);
        let mut sim = opentpg_fsim::Fsim3::new(&n, ft);
        for fault in faults.representatives() {
            let engine = DtpgEngine::for_node(&n, ft, fault.node());
            if let SolveOutcome::Detected(tv) = engine.solve(fault) {
                let detected = sim.sppfp(&tv);
                assert!(
                    detected.contains(&fault.id()),
                    "vector {tv} must detect {fault}"
                );
            }
        }
    }

    #[test]
    fn test_transition_delay_vector_has_two_frames() {
        let n = and2();
        let ft = opentpg_netlist::FaultType::TransitionDelay;
        let faults = n.gen_faults(ft);
        let fault = fault_at(&n, &faults, "y", FaultSite::Output, false);
        let y = must_some(n.find_node("y"), "y");
        let engine = DtpgEngine::for_node(&n, ft, y);
        match engine.solve(&fault) {
            SolveOutcome::Detected(tv) => {
                assert_eq!(tv.len(), 2 * n.input_count());
                let mut sim = opentpg_fsim::Fsim3::new(&n, ft);
                assert!(sim.sppfp(&tv).contains(&fault.id()));
            }
            other => panic!("expected detection, got {other:?}"),
        }
    }
}
