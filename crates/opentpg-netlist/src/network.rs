//! The gate-level network and its builder.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::VecDeque;
use std::fmt;
use std::path::Path;

use crate::error::NetlistError;
use crate::fault::{FaultList, FaultType};
use crate::gate::GateKind;
use crate::reader::NetlistFormat;

/// Index of a node within its [`Network`].
///
/// Node ids double as topological indices: a node's fanins always have
/// smaller ids.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The id as a `usize` index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// One gate of the network.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    /// Node id, equal to its position in [`Network::nodes`].
    pub id: NodeId,
    /// Net name from the source netlist (synthesized names for lowered
    /// BLIF cover internals).
    pub name: String,
    /// Gate kind.
    pub kind: GateKind,
    /// Fanin nodes, in pin order.
    pub fanins: Vec<NodeId>,
}

/// An immutable gate-level network in topological order.
///
/// Inputs come first (primary inputs, then pseudo-primary inputs from
/// scanned state elements); every other node appears after all of its
/// fanins. Observation points are the primary outputs followed by the
/// pseudo-primary outputs.
#[derive(Clone, Debug)]
pub struct Network {
    name: String,
    nodes: Vec<Node>,
    inputs: Vec<NodeId>,
    primary_input_count: usize,
    outputs: Vec<NodeId>,
    primary_output_count: usize,
    fanouts: Vec<Vec<(NodeId, usize)>>,
    input_positions: Vec<Option<u32>>,
    output_drivers: Vec<bool>,
}

impl Network {
    /// Read a netlist file, selecting the format by explicit tag or by file
    /// extension (`.blif` → BLIF, `.bench` → ISCAS89, anything else → BLIF).
    ///
    /// # Errors
    ///
    /// [`NetlistError::Io`] when the file cannot be read, parse-level errors
    /// otherwise.
    pub fn read(path: &Path, format: Option<NetlistFormat>) -> Result<Network, NetlistError> {
        let format = format.unwrap_or_else(|| NetlistFormat::from_path(path));
        let text = std::fs::read_to_string(path).map_err(|source| NetlistError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, format)
    }

    /// Parse netlist text in the given format.
    ///
    /// # Errors
    ///
    /// Parse-level [`NetlistError`] variants.
    pub fn parse(text: &str, format: NetlistFormat) -> Result<Network, NetlistError> {
        match format {
            NetlistFormat::Blif => crate::blif::parse(text),
            NetlistFormat::Iscas89 => crate::iscas89::parse(text),
        }
    }

    /// The `.model`/file-derived name of the network.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All nodes in topological order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// One node.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Primary plus pseudo-primary inputs, in test-vector position order.
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Number of test-vector positions per frame.
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of true primary inputs (the leading positions).
    pub fn primary_input_count(&self) -> usize {
        self.primary_input_count
    }

    /// Observation points: primary outputs then pseudo-primary outputs.
    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// Number of true primary outputs (the leading observation points).
    pub fn primary_output_count(&self) -> usize {
        self.primary_output_count
    }

    /// Consumers of a node's output net, as `(node, pin)` pairs in
    /// topological order.
    #[inline]
    pub fn fanouts(&self, id: NodeId) -> &[(NodeId, usize)] {
        &self.fanouts[id.index()]
    }

    /// Test-vector position of an input node, `None` for internal nodes.
    #[inline]
    pub fn input_position(&self, id: NodeId) -> Option<usize> {
        self.input_positions[id.index()].map(|p| p as usize)
    }

    /// True when the node drives an observation point.
    #[inline]
    pub fn drives_output(&self, id: NodeId) -> bool {
        self.output_drivers[id.index()]
    }

    /// Test-vector width for a fault model: one frame for stuck-at, two for
    /// transition-delay.
    pub fn tv_width(&self, fault_type: FaultType) -> usize {
        match fault_type {
            FaultType::StuckAt => self.input_count(),
            FaultType::TransitionDelay => 2 * self.input_count(),
        }
    }

    /// Enumerate and collapse the fault universe for a fault model.
    pub fn gen_faults(&self, fault_type: FaultType) -> FaultList {
        FaultList::build(self, fault_type)
    }

    /// Look a node up by net name. Linear scan; test and diagnostic use
    /// only.
    pub fn find_node(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.name == name).map(|n| n.id)
    }
}

/// Staged node description inside [`NetworkBuilder`].
#[derive(Clone, Debug)]
struct ProtoNode {
    name: String,
    kind: GateKind,
    fanin_names: Vec<String>,
}

/// Incremental network constructor used by the readers.
///
/// Gates may be declared in any order; `build` resolves names, checks for
/// multiple drivers, undefined nets and combinational cycles, and emits the
/// nodes in a deterministic topological order (declaration order is the
/// tie-break, so identical inputs produce identical networks).
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    name: String,
    gates: Vec<ProtoNode>,
    primary_inputs: Vec<String>,
    pseudo_inputs: Vec<String>,
    primary_outputs: Vec<String>,
    pseudo_outputs: Vec<String>,
}

impl NetworkBuilder {
    /// A fresh builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Rename the network (BLIF `.model` arrives after construction).
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Declare a primary input net.
    pub fn add_input(&mut self, name: impl Into<String>) {
        self.primary_inputs.push(name.into());
    }

    /// Declare a pseudo-primary input (scanned state-element output).
    pub fn add_pseudo_input(&mut self, name: impl Into<String>) {
        self.pseudo_inputs.push(name.into());
    }

    /// Declare a primary output net.
    pub fn add_output(&mut self, name: impl Into<String>) {
        self.primary_outputs.push(name.into());
    }

    /// Declare a pseudo-primary output (scanned state-element data input).
    pub fn add_pseudo_output(&mut self, name: impl Into<String>) {
        self.pseudo_outputs.push(name.into());
    }

    /// Declare a gate driving `name`.
    pub fn add_gate<S: Into<String>>(
        &mut self,
        name: impl Into<String>,
        kind: GateKind,
        fanins: impl IntoIterator<Item = S>,
    ) {
        self.gates.push(ProtoNode {
            name: name.into(),
            kind,
            fanin_names: fanins.into_iter().map(Into::into).collect(),
        });
    }

    /// Resolve names and produce the topologically ordered network.
    ///
    /// # Errors
    ///
    /// [`NetlistError::MultipleDrivers`], [`NetlistError::UndefinedNet`] or
    /// [`NetlistError::CombinationalCycle`].
    pub fn build(self) -> Result<Network, NetlistError> {
        let n_inputs = self.primary_inputs.len() + self.pseudo_inputs.len();
        let n_total = n_inputs + self.gates.len();

        // Net name -> dense pre-topological index (inputs first).
        let mut driver_of: HashMap<&str, usize> = HashMap::with_capacity(n_total);
        let input_names = self.primary_inputs.iter().chain(&self.pseudo_inputs);
        for (i, name) in input_names.enumerate() {
            if driver_of.insert(name.as_str(), i).is_some() {
                return Err(NetlistError::MultipleDrivers(name.clone()));
            }
        }
        for (g, gate) in self.gates.iter().enumerate() {
            if driver_of.insert(gate.name.as_str(), n_inputs + g).is_some() {
                return Err(NetlistError::MultipleDrivers(gate.name.clone()));
            }
        }

        // Resolve fanins.
        let mut fanins: Vec<Vec<usize>> = vec![Vec::new(); n_total];
        for (g, gate) in self.gates.iter().enumerate() {
            let resolved: Result<Vec<usize>, NetlistError> = gate
                .fanin_names
                .iter()
                .map(|f| {
                    driver_of
                        .get(f.as_str())
                        .copied()
                        .ok_or_else(|| NetlistError::UndefinedNet(f.clone()))
                })
                .collect();
            fanins[n_inputs + g] = resolved?;
        }

        // Kahn topological sort; the ready queue is FIFO over declaration
        // order, which keeps node ids stable across runs.
        let mut remaining: Vec<usize> = fanins.iter().map(Vec::len).collect();
        let mut consumers: Vec<Vec<usize>> = vec![Vec::new(); n_total];
        for (idx, fs) in fanins.iter().enumerate() {
            for &f in fs {
                consumers[f].push(idx);
            }
        }
        let mut queue: VecDeque<usize> = (0..n_total).filter(|&i| remaining[i] == 0).collect();
        let mut topo_of: Vec<Option<u32>> = vec![None; n_total];
        let mut order: Vec<usize> = Vec::with_capacity(n_total);
        while let Some(idx) = queue.pop_front() {
            topo_of[idx] = Some(order.len() as u32);
            order.push(idx);
            for &c in &consumers[idx] {
                remaining[c] -= 1;
                if remaining[c] == 0 {
                    queue.push_back(c);
                }
            }
        }
        if order.len() != n_total {
            let stuck = (0..n_total)
                .find(|&i| topo_of[i].is_none())
                .map(|i| self.net_name(i, n_inputs).to_string())
                .unwrap_or_default();
            return Err(NetlistError::CombinationalCycle(stuck));
        }

        // Materialize nodes in topological order.
        let mut nodes: Vec<Node> = Vec::with_capacity(n_total);
        for (new_id, &old_idx) in order.iter().enumerate() {
            let (name, kind) = if old_idx < n_inputs {
                (self.net_name(old_idx, n_inputs).to_string(), GateKind::Input)
            } else {
                let g = &self.gates[old_idx - n_inputs];
                (g.name.clone(), g.kind)
            };
            let node_fanins = fanins[old_idx]
                .iter()
                .map(|&f| NodeId(topo_of[f].unwrap_or(0)))
                .collect();
            nodes.push(Node {
                id: NodeId(new_id as u32),
                name,
                kind,
                fanins: node_fanins,
            });
        }

        let remap = |old: usize| NodeId(topo_of[old].unwrap_or(0));
        let lookup = |name: &String| -> Result<NodeId, NetlistError> {
            driver_of
                .get(name.as_str())
                .map(|&old| remap(old))
                .ok_or_else(|| NetlistError::UndefinedNet(name.clone()))
        };

        let mut inputs: Vec<NodeId> = Vec::with_capacity(n_inputs);
        for name in self.primary_inputs.iter().chain(&self.pseudo_inputs) {
            inputs.push(lookup(name)?);
        }
        let mut outputs: Vec<NodeId> =
            Vec::with_capacity(self.primary_outputs.len() + self.pseudo_outputs.len());
        for name in self.primary_outputs.iter().chain(&self.pseudo_outputs) {
            outputs.push(lookup(name)?);
        }

        let mut fanout_lists: Vec<Vec<(NodeId, usize)>> = vec![Vec::new(); n_total];
        for node in &nodes {
            for (pin, &f) in node.fanins.iter().enumerate() {
                fanout_lists[f.index()].push((node.id, pin));
            }
        }

        let mut input_positions: Vec<Option<u32>> = vec![None; n_total];
        for (pos, &id) in inputs.iter().enumerate() {
            input_positions[id.index()] = Some(pos as u32);
        }
        let mut output_drivers = vec![false; n_total];
        for &id in &outputs {
            output_drivers[id.index()] = true;
        }

        Ok(Network {
            name: self.name,
            nodes,
            primary_input_count: self.primary_inputs.len(),
            inputs,
            primary_output_count: self.primary_outputs.len(),
            outputs,
            fanouts: fanout_lists,
            input_positions,
            output_drivers,
        })
    }

    fn net_name(&self, idx: usize, n_inputs: usize) -> &str {
        if idx < self.primary_inputs.len() {
            &self.primary_inputs[idx]
        } else if idx < n_inputs {
            &self.pseudo_inputs[idx - self.primary_inputs.len()]
        } else {
            &self.gates[idx - n_inputs].name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_gate_net() -> Network {
        let mut b = NetworkBuilder::new("t");
        b.add_input("a");
        b.add_input("b");
        b.add_output("y");
        // Declared out of dependency order on purpose.
        b.add_gate("y", GateKind::Not, ["u"]);
        b.add_gate("u", GateKind::And, ["a", "b"]);
        match b.build() {
            Ok(n) => n,
            Err(e) => panic!("build failed: {e}"),
        }
    }

    #[test]
    fn test_build_topological_order() {
        let n = two_gate_net();
        assert_eq!(n.node_count(), 4);
        for node in n.nodes() {
            for &f in &node.fanins {
                assert!(f < node.id, "fanin {f} not before {}", node.id);
            }
        }
    }

    #[test]
    fn test_inputs_and_outputs_resolved() {
        let n = two_gate_net();
        assert_eq!(n.input_count(), 2);
        assert_eq!(n.outputs().len(), 1);
        let y = n.outputs()[0];
        assert_eq!(n.node(y).name, "y");
        assert!(n.drives_output(y));
    }

    #[test]
    fn test_fanouts_carry_pins() {
        let n = two_gate_net();
        let a = match n.find_node("a") {
            Some(id) => id,
            None => panic!("missing node a"),
        };
        let fos = n.fanouts(a);
        assert_eq!(fos.len(), 1);
        assert_eq!(n.node(fos[0].0).name, "u");
        assert_eq!(fos[0].1, 0);
    }

    #[test]
    fn test_multiple_drivers_rejected() {
        let mut b = NetworkBuilder::new("t");
        b.add_input("a");
        b.add_gate("y", GateKind::Buf, ["a"]);
        b.add_gate("y", GateKind::Not, ["a"]);
        assert!(matches!(b.build(), Err(NetlistError::MultipleDrivers(_))));
    }

    #[test]
    fn test_undefined_net_rejected() {
        let mut b = NetworkBuilder::new("t");
        b.add_input("a");
        b.add_output("y");
        b.add_gate("y", GateKind::And, ["a", "ghost"]);
        assert!(matches!(b.build(), Err(NetlistError::UndefinedNet(n)) if n == "ghost"));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut b = NetworkBuilder::new("t");
        b.add_input("a");
        b.add_gate("p", GateKind::And, ["a", "q"]);
        b.add_gate("q", GateKind::Buf, ["p"]);
        assert!(matches!(b.build(), Err(NetlistError::CombinationalCycle(_))));
    }

    #[test]
    fn test_pseudo_inputs_follow_primary() {
        let mut b = NetworkBuilder::new("t");
        b.add_input("a");
        b.add_pseudo_input("ff0");
        b.add_output("y");
        b.add_gate("y", GateKind::Or, ["a", "ff0"]);
        let n = match b.build() {
            Ok(n) => n,
            Err(e) => panic!("build failed: {e}"),
        };
        assert_eq!(n.input_count(), 2);
        assert_eq!(n.primary_input_count(), 1);
        let ff = n.inputs()[1];
        assert_eq!(n.node(ff).name, "ff0");
        assert_eq!(n.input_position(ff), Some(1));
    }
}
