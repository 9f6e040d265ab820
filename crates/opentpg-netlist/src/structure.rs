//! Structural fault-partitioning units: FFRs and MFFCs.
//!
//! Both analyses treat the fanout graph as a flow graph toward a virtual
//! sink behind the observation points. A fanout-free region (FFR) collects
//! the nodes funneling into a root through single-fanout nets only; a
//! maximal fanout-free cone (MFFC) additionally absorbs fanout nodes whose
//! paths all reconverge before leaving the cone. MFFC roots are exactly the
//! nodes whose immediate dominator is the virtual sink.

use crate::network::{Network, NodeId};

/// A fanout-free region: one root, member nodes in topological order.
#[derive(Clone, Debug)]
pub struct Ffr {
    /// The single output node of the region.
    pub root: NodeId,
    /// All member nodes (including the root) in topological order.
    pub nodes: Vec<NodeId>,
}

/// A maximal fanout-free cone: one root, member nodes in topological order.
#[derive(Clone, Debug)]
pub struct Mffc {
    /// The single output node of the cone.
    pub root: NodeId,
    /// All member nodes (including the root) in topological order.
    pub nodes: Vec<NodeId>,
}

impl Network {
    /// The FFR root of a node: follow single-fanout nets until a stem or an
    /// observation point.
    pub fn ffr_root(&self, id: NodeId) -> NodeId {
        let mut cur = id;
        loop {
            let fos = self.fanouts(cur);
            if self.drives_output(cur) || fos.len() != 1 {
                return cur;
            }
            cur = fos[0].0;
        }
    }

    /// All fanout-free regions, ordered by root id.
    pub fn ffr_list(&self) -> Vec<Ffr> {
        let n = self.node_count();
        // Roots resolve in one reverse-topological sweep.
        let mut root_of: Vec<NodeId> = (0..n).map(|i| NodeId(i as u32)).collect();
        for idx in (0..n).rev() {
            let id = NodeId(idx as u32);
            let fos = self.fanouts(id);
            if !self.drives_output(id) && fos.len() == 1 {
                root_of[idx] = root_of[fos[0].0.index()];
            }
        }
        self.group_by_root(&root_of, |root, nodes| Ffr { root, nodes })
    }

    /// All maximal fanout-free cones, ordered by root id.
    ///
    /// Every node belongs to exactly one MFFC, so the cones partition the
    /// fault universe just like FFRs do, only coarser.
    pub fn mffc_list(&self) -> Vec<Mffc> {
        let idom = self.immediate_dominators();
        let n = self.node_count();
        // A node's MFFC root is the first sink-dominated node on its
        // dominator chain; resolve by reverse-topological sweep (dominators
        // always have larger topological indices).
        let mut root_of: Vec<NodeId> = (0..n).map(|i| NodeId(i as u32)).collect();
        for idx in (0..n).rev() {
            if let Some(d) = idom[idx] {
                root_of[idx] = root_of[d.index()];
            }
        }
        self.group_by_root(&root_of, |root, nodes| Mffc { root, nodes })
    }

    /// Immediate dominator of each node in the fanout graph extended with a
    /// virtual sink; `None` encodes the sink itself.
    ///
    /// Classic iterate-free DAG variant of Cooper/Harvey/Kennedy: process in
    /// reverse topological order and fold the dominator chains of all
    /// successors. Output drivers gain the sink as an extra successor.
    fn immediate_dominators(&self) -> Vec<Option<NodeId>> {
        let n = self.node_count();
        let mut idom: Vec<Option<NodeId>> = vec![None; n];
        for idx in (0..n).rev() {
            let id = NodeId(idx as u32);
            let mut meet: Option<Option<NodeId>> = if self.drives_output(id) {
                // The sink observes this node directly.
                Some(None)
            } else {
                None
            };
            for &(fo, _) in self.fanouts(id) {
                meet = Some(match meet {
                    None => Some(fo),
                    Some(m) => intersect(&idom, m, Some(fo)),
                });
            }
            // Dangling nodes (no fanout, not observed) dominate nothing;
            // treat them as sink-dominated so they still land in a unit.
            idom[idx] = meet.unwrap_or(None);
        }
        idom
    }

    fn group_by_root<U>(
        &self,
        root_of: &[NodeId],
        make: impl Fn(NodeId, Vec<NodeId>) -> U,
    ) -> Vec<U> {
        let n = self.node_count();
        let mut members: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        for idx in 0..n {
            members[root_of[idx].index()].push(NodeId(idx as u32));
        }
        (0..n)
            .filter(|&r| root_of[r].index() == r)
            .map(|r| make(NodeId(r as u32), std::mem::take(&mut members[r])))
            .collect()
    }
}

/// Meet of two dominator-chain positions; `None` is the sink (the root of
/// the dominator tree, dominating everything).
fn intersect(
    idom: &[Option<NodeId>],
    a: Option<NodeId>,
    b: Option<NodeId>,
) -> Option<NodeId> {
    let (mut a, mut b) = match (a, b) {
        (None, _) | (_, None) => return None,
        (Some(a), Some(b)) => (a, b),
    };
    while a != b {
        // Walk the earlier node up its chain; dominators sit later in
        // topological order.
        if a < b {
            a = match idom[a.index()] {
                Some(x) => x,
                None => return None,
            };
        } else {
            b = match idom[b.index()] {
                Some(x) => x,
                None => return None,
            };
        }
    }
    Some(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateKind;
    use crate::network::NetworkBuilder;

    /// y = (a & b) | !(a & b) fanout structure:
    /// u = AND(a,b) fans out to v = NOT(u) and w = OR(u, v) -> y.
    fn reconvergent_net() -> Network {
        let mut b = NetworkBuilder::new("t");
        b.add_input("a");
        b.add_input("b");
        b.add_output("w");
        b.add_gate("u", GateKind::And, ["a", "b"]);
        b.add_gate("v", GateKind::Not, ["u"]);
        b.add_gate("w", GateKind::Or, ["u", "v"]);
        match b.build() {
            Ok(n) => n,
            Err(e) => panic!("build failed: {e}"),
        }
    }

    fn id_of(n: &Network, name: &str) -> NodeId {
        match n.find_node(name) {
            Some(id) => id,
            None => panic!("missing node {name}"),
        }
    }

    #[test]
    fn test_ffr_roots_stop_at_stems() {
        let n = reconvergent_net();
        let (u, v, w) = (id_of(&n, "u"), id_of(&n, "v"), id_of(&n, "w"));
        // u is a stem (two fanouts): its own FFR root.
        assert_eq!(n.ffr_root(u), u);
        // v has a single fanout into w.
        assert_eq!(n.ffr_root(v), w);
        assert_eq!(n.ffr_root(w), w);
    }

    #[test]
    fn test_ffr_list_partitions_nodes() {
        let n = reconvergent_net();
        let ffrs = n.ffr_list();
        let total: usize = ffrs.iter().map(|f| f.nodes.len()).sum();
        assert_eq!(total, n.node_count());
        for ffr in &ffrs {
            assert!(ffr.nodes.contains(&ffr.root));
            for pair in ffr.nodes.windows(2) {
                assert!(pair[0] < pair[1], "members must stay topological");
            }
        }
    }

    #[test]
    fn test_mffc_absorbs_reconvergent_stem() {
        let n = reconvergent_net();
        let (u, w) = (id_of(&n, "u"), id_of(&n, "w"));
        let mffcs = n.mffc_list();
        let total: usize = mffcs.iter().map(|m| m.nodes.len()).sum();
        assert_eq!(total, n.node_count());
        // Both fanout branches of u reconverge at w, so u joins w's cone
        // even though it is its own FFR.
        let w_cone = mffcs
            .iter()
            .find(|m| m.root == w)
            .unwrap_or_else(|| panic!("no MFFC rooted at w"));
        assert!(w_cone.nodes.contains(&u));
    }

    #[test]
    fn test_mffc_equals_ffr_without_reconvergence() {
        let mut b = NetworkBuilder::new("chain");
        b.add_input("a");
        b.add_output("y");
        b.add_gate("u", GateKind::Not, ["a"]);
        b.add_gate("y", GateKind::Buf, ["u"]);
        let n = match b.build() {
            Ok(n) => n,
            Err(e) => panic!("build failed: {e}"),
        };
        let ffrs = n.ffr_list();
        let mffcs = n.mffc_list();
        assert_eq!(ffrs.len(), mffcs.len());
        for (f, m) in ffrs.iter().zip(&mffcs) {
            assert_eq!(f.root, m.root);
            assert_eq!(f.nodes, m.nodes);
        }
    }
}
