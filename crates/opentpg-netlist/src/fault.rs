//! Stuck-at and transition-delay faults: enumeration and structural
//! equivalence collapsing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gate::GateKind;
use crate::network::{Network, NodeId};

/// The fault model a run targets.
///
/// The model selects the test-vector width (one frame for stuck-at, a
/// launch and a capture frame for transition-delay) and the engine
/// encoding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultType {
    /// Classic single stuck-at faults.
    StuckAt,
    /// Slow-to-rise / slow-to-fall transition faults under full scan.
    TransitionDelay,
}

impl fmt::Display for FaultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultType::StuckAt => write!(f, "stuck-at"),
            FaultType::TransitionDelay => write!(f, "transition-delay"),
        }
    }
}

/// Stable identity of a fault within one [`FaultList`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FaultId(pub u32);

impl FaultId {
    /// The id as a `usize` index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FaultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "f{}", self.0)
    }
}

/// Where on a gate the fault sits.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultSite {
    /// The gate's output net (the stem).
    Output,
    /// One input pin (a branch), by pin index.
    Input(u32),
}

/// One modeled fault.
///
/// For stuck-at faults `value` is the stuck value. For transition-delay
/// faults `value` is the value the site is stuck at during the capture
/// frame: `false` models slow-to-rise, `true` slow-to-fall; the launch
/// frame must additionally justify the same value at the site.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    id: FaultId,
    node: NodeId,
    site: FaultSite,
    value: bool,
    rep: FaultId,
}

impl Fault {
    /// Stable id within the fault list.
    #[inline]
    pub fn id(&self) -> FaultId {
        self.id
    }

    /// The gate the fault is attached to.
    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Output stem or input branch.
    #[inline]
    pub fn site(&self) -> FaultSite {
        self.site
    }

    /// Stuck value (capture-frame stuck value for transition faults).
    #[inline]
    pub fn value(&self) -> bool {
        self.value
    }

    /// Id of this fault's equivalence-class representative.
    #[inline]
    pub fn rep(&self) -> FaultId {
        self.rep
    }

    /// True when the fault represents its equivalence class and is
    /// therefore targeted by the driver.
    #[inline]
    pub fn is_representative(&self) -> bool {
        self.rep == self.id
    }

    /// Human-readable description against the owning network.
    pub fn describe(&self, network: &Network) -> String {
        let node = network.node(self.node);
        let site = match self.site {
            FaultSite::Output => "out".to_string(),
            FaultSite::Input(k) => format!("in{k}"),
        };
        format!("{}/{site}:sa{}", node.name, u8::from(self.value))
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let site = match self.site {
            FaultSite::Output => "out".to_string(),
            FaultSite::Input(k) => format!("in{k}"),
        };
        write!(f, "{}@{}/{site}:sa{}", self.id, self.node, u8::from(self.value))
    }
}

/// The collapsed fault universe of one network under one fault model.
///
/// Faults are stored per node, in topological node order: output stuck-at-0,
/// output stuck-at-1, then each input pin's stuck-at-0/1 pair. Ids are
/// stable and dense.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FaultList {
    fault_type: FaultType,
    faults: Vec<Fault>,
    node_offsets: Vec<u32>,
}

impl FaultList {
    /// Enumerate all faults of `network` and collapse structural
    /// equivalences.
    pub(crate) fn build(network: &Network, fault_type: FaultType) -> Self {
        let mut node_offsets = Vec::with_capacity(network.node_count() + 1);
        let mut faults = Vec::new();
        for node in network.nodes() {
            node_offsets.push(faults.len() as u32);
            let id = |faults: &Vec<Fault>| FaultId(faults.len() as u32);
            for value in [false, true] {
                let fid = id(&faults);
                faults.push(Fault {
                    id: fid,
                    node: node.id,
                    site: FaultSite::Output,
                    value,
                    rep: fid,
                });
            }
            for pin in 0..node.fanins.len() as u32 {
                for value in [false, true] {
                    let fid = id(&faults);
                    faults.push(Fault {
                        id: fid,
                        node: node.id,
                        site: FaultSite::Input(pin),
                        value,
                        rep: fid,
                    });
                }
            }
        }
        node_offsets.push(faults.len() as u32);

        let mut list = FaultList {
            fault_type,
            faults,
            node_offsets,
        };
        list.collapse(network);
        list
    }

    fn collapse(&mut self, network: &Network) {
        let mut uf = UnionFind::new(self.faults.len());
        for node in network.nodes() {
            // A single-fanout stem is the same physical line as its one
            // branch; their faults coincide for every fault model.
            let fos = network.fanouts(node.id);
            if fos.len() == 1 && !network.drives_output(node.id) {
                let (consumer, pin) = fos[0];
                for value in [false, true] {
                    uf.union(
                        self.slot(node.id, FaultSite::Output, value),
                        self.slot(consumer, FaultSite::Input(pin as u32), value),
                    );
                }
            }

            // Gate-local equivalences. Controlling-value collapsing is only
            // sound for stuck-at faults; transition faults keep just the
            // inverter/buffer identities, whose launch conditions coincide.
            match node.kind {
                GateKind::Buf => {
                    for value in [false, true] {
                        uf.union(
                            self.slot(node.id, FaultSite::Input(0), value),
                            self.slot(node.id, FaultSite::Output, value),
                        );
                    }
                }
                GateKind::Not => {
                    for value in [false, true] {
                        uf.union(
                            self.slot(node.id, FaultSite::Input(0), value),
                            self.slot(node.id, FaultSite::Output, !value),
                        );
                    }
                }
                GateKind::And | GateKind::Nand | GateKind::Or | GateKind::Nor
                    if self.fault_type == FaultType::StuckAt =>
                {
                    let Some(c) = node.kind.controlling_value() else {
                        continue;
                    };
                    let out_value = c != node.kind.inverting();
                    for pin in 0..node.fanins.len() as u32 {
                        uf.union(
                            self.slot(node.id, FaultSite::Input(pin), c),
                            self.slot(node.id, FaultSite::Output, out_value),
                        );
                    }
                }
                _ => {}
            }
        }
        for i in 0..self.faults.len() {
            self.faults[i].rep = FaultId(uf.find(i) as u32);
        }
    }

    /// Dense index of a fault by its coordinates.
    fn slot(&self, node: NodeId, site: FaultSite, value: bool) -> usize {
        let base = self.node_offsets[node.index()] as usize;
        let off = match site {
            FaultSite::Output => usize::from(value),
            FaultSite::Input(pin) => 2 + 2 * pin as usize + usize::from(value),
        };
        base + off
    }

    /// The fault model of this list.
    pub fn fault_type(&self) -> FaultType {
        self.fault_type
    }

    /// All faults, including collapsed ones, in id order.
    pub fn all(&self) -> &[Fault] {
        &self.faults
    }

    /// Number of faults (collapsed ones included).
    pub fn len(&self) -> usize {
        self.faults.len()
    }

    /// True for a gate-free network.
    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    /// One fault by id.
    #[inline]
    pub fn get(&self, id: FaultId) -> &Fault {
        &self.faults[id.index()]
    }

    /// Equivalence-class representatives, in id order.
    pub fn representatives(&self) -> impl Iterator<Item = &Fault> {
        self.faults.iter().filter(|f| f.is_representative())
    }

    /// Number of representative faults.
    pub fn rep_count(&self) -> usize {
        self.representatives().count()
    }

    /// Faults attached to one node, in enumeration order.
    pub fn faults_of_node(&self, node: NodeId) -> &[Fault] {
        let lo = self.node_offsets[node.index()] as usize;
        let hi = self.node_offsets[node.index() + 1] as usize;
        &self.faults[lo..hi]
    }

    /// Representative faults of a partitioning unit, in node order then
    /// enumeration order. This is the per-unit target list of the driver.
    pub fn representatives_of_unit(&self, nodes: &[NodeId]) -> Vec<FaultId> {
        nodes
            .iter()
            .flat_map(|&n| self.faults_of_node(n))
            .filter(|f| f.is_representative())
            .map(|f| f.id())
            .collect()
    }
}

/// Minimal union-find keeping the smallest member as class root, so class
/// representatives get the smallest fault id.
struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] as usize != x {
            let gp = self.parent[self.parent[x] as usize];
            self.parent[x] = gp;
            x = gp as usize;
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra == rb {
            return;
        }
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        self.parent[hi] = lo as u32;
    }
}
