//! The PPSFP/SPPFP simulation engine.

use std::collections::HashMap;

use opentpg_netlist::{
    Fault, FaultId, FaultList, FaultSite, FaultType, Network, NodeId,
};
use opentpg_tv::{Tv, Val3};
use tracing::trace;

use crate::word3::{Word3, eval_gate};

/// Patterns per simulation block: one bit per machine-word position.
pub const PPSFP_BLOCK: usize = 64;

/// Three-valued parallel-pattern fault simulator.
///
/// Owns its collapsed fault list (queryable via [`Fsim3::faults`]) and a
/// skip set. Only representative faults are simulated; collapsed aliases
/// are covered by their class representative.
#[derive(Debug)]
pub struct Fsim3<'a> {
    network: &'a Network,
    faults: FaultList,
    skip: Vec<bool>,
    tfo_cache: HashMap<NodeId, Vec<NodeId>>,
}

impl<'a> Fsim3<'a> {
    /// A simulator over the network's collapsed fault universe.
    pub fn new(network: &'a Network, fault_type: FaultType) -> Self {
        let faults = network.gen_faults(fault_type);
        let skip = vec![false; faults.len()];
        Self {
            network,
            faults,
            skip,
            tfo_cache: HashMap::new(),
        }
    }

    /// The simulated fault universe.
    pub fn faults(&self) -> &FaultList {
        &self.faults
    }

    /// Exclude one fault from subsequent sweeps.
    pub fn set_skip(&mut self, f: FaultId) {
        self.skip[f.index()] = true;
    }

    /// Reinstate every fault.
    pub fn clear_skip_all(&mut self) {
        self.skip.fill(false);
    }

    /// True when a fault is currently skipped.
    pub fn is_skipped(&self, f: FaultId) -> bool {
        self.skip[f.index()]
    }

    /// Faults detected by a single pattern, in fault-id order.
    pub fn sppfp(&mut self, tv: &Tv) -> Vec<FaultId> {
        self.ppsfp(std::slice::from_ref(tv))
            .into_iter()
            .map(|(f, _)| f)
            .collect()
    }

    /// Simulate a block of up to [`PPSFP_BLOCK`] patterns against every
    /// non-skipped representative fault.
    ///
    /// Returns `(fault, mask)` pairs in fault-id order; bit `p` of `mask`
    /// is set when pattern `p` of the block detects the fault.
    ///
    /// # Panics
    ///
    /// Panics when the block is longer than [`PPSFP_BLOCK`] or a vector has
    /// the wrong width for the network and fault model.
    pub fn ppsfp(&mut self, block: &[Tv]) -> Vec<(FaultId, u64)> {
        assert!(block.len() <= PPSFP_BLOCK, "pattern block too wide");
        if block.is_empty() {
            return Vec::new();
        }
        let fault_type = self.faults.fault_type();
        let width = self.network.tv_width(fault_type);
        for tv in block {
            assert_eq!(tv.len(), width, "pattern width mismatch");
        }
        let mask = if block.len() == PPSFP_BLOCK {
            !0u64
        } else {
            (1u64 << block.len()) - 1
        };

        let ninputs = self.network.input_count();
        // Launch-frame values are only needed for transition faults.
        let launch = match fault_type {
            FaultType::StuckAt => None,
            FaultType::TransitionDelay => Some(self.good_sim(block, 0, mask)),
        };
        let capture_offset = match fault_type {
            FaultType::StuckAt => 0,
            FaultType::TransitionDelay => ninputs,
        };
        let good = self.good_sim(block, capture_offset, mask);

        let mut hits = Vec::new();
        for fi in 0..self.faults.len() {
            let fault = *self.faults.get(FaultId(fi as u32));
            if !fault.is_representative() || self.skip[fi] {
                continue;
            }
            let mut det = self.propagate_fault(&fault, &good, mask);
            if let Some(launch) = &launch {
                det &= self.activation_mask(&fault, launch);
            }
            if det != 0 {
                hits.push((fault.id(), det));
            }
        }
        trace!(
            patterns = block.len(),
            detected = hits.len(),
            "ppsfp sweep"
        );
        hits
    }

    /// Good-circuit simulation of one frame of the block.
    fn good_sim(&self, block: &[Tv], frame_offset: usize, mask: u64) -> Vec<Word3> {
        let mut values = vec![Word3::default(); self.network.node_count()];
        let mut fanin_buf: Vec<Word3> = Vec::new();
        for node in self.network.nodes() {
            values[node.id.index()] = if let Some(pos) = self.network.input_position(node.id) {
                let mut w = Word3::default();
                for (p, tv) in block.iter().enumerate() {
                    match tv.get(frame_offset + pos) {
                        Val3::One => w.ones |= 1 << p,
                        Val3::Zero => w.zeros |= 1 << p,
                        Val3::X => {}
                    }
                }
                w
            } else {
                fanin_buf.clear();
                fanin_buf.extend(node.fanins.iter().map(|f| values[f.index()]));
                eval_gate(node.kind, &fanin_buf, mask)
            };
        }
        values
    }

    /// Detection mask of one fault against the capture-frame good values.
    fn propagate_fault(&mut self, fault: &Fault, good: &[Word3], mask: u64) -> u64 {
        let site = fault.node();
        let cone = self.tfo(site);
        let mut faulty: HashMap<NodeId, Word3> = HashMap::with_capacity(cone.len());

        match fault.site() {
            FaultSite::Output => {
                faulty.insert(site, Word3::constant(fault.value(), mask));
            }
            FaultSite::Input(pin) => {
                let node = self.network.node(site);
                let fanins: Vec<Word3> = node
                    .fanins
                    .iter()
                    .enumerate()
                    .map(|(k, f)| {
                        if k == pin as usize {
                            Word3::constant(fault.value(), mask)
                        } else {
                            good[f.index()]
                        }
                    })
                    .collect();
                faulty.insert(site, eval_gate(node.kind, &fanins, mask));
            }
        }

        for &nid in &cone {
            if nid == site {
                continue;
            }
            let node = self.network.node(nid);
            let fanins: Vec<Word3> = node
                .fanins
                .iter()
                .map(|f| faulty.get(f).copied().unwrap_or(good[f.index()]))
                .collect();
            faulty.insert(nid, eval_gate(node.kind, &fanins, mask));
        }

        let mut det = 0u64;
        for &out in self.network.outputs() {
            let f = faulty.get(&out).copied().unwrap_or(good[out.index()]);
            det |= good[out.index()].definite_diff(f);
        }
        det & mask
    }

    /// Launch-frame activation: patterns where the fault site already holds
    /// the capture-frame stuck value, i.e. the transition never launches.
    fn activation_mask(&self, fault: &Fault, launch: &[Word3]) -> u64 {
        let line = match fault.site() {
            FaultSite::Output => fault.node(),
            // A branch fault sees the stem's launch value.
            FaultSite::Input(pin) => self.network.node(fault.node()).fanins[pin as usize],
        };
        let w = launch[line.index()];
        if fault.value() { w.ones } else { w.zeros }
    }

    /// Transitive fanout of a node, including the node, in topological
    /// order. Cached per site.
    fn tfo(&mut self, start: NodeId) -> Vec<NodeId> {
        let network = self.network;
        self.tfo_cache
            .entry(start)
            .or_insert_with(|| {
                let mut in_cone = vec![false; network.node_count()];
                in_cone[start.index()] = true;
                let mut cone = vec![start];
                let mut i = 0;
                while i < cone.len() {
                    for &(fo, _) in network.fanouts(cone[i]) {
                        if !in_cone[fo.index()] {
                            in_cone[fo.index()] = true;
                            cone.push(fo);
                        }
                    }
                    i += 1;
                }
                cone.sort_unstable();
                cone
            })
            .clone()
    }
}
