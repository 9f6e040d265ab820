//! Fault-list reduction passes applied before cover-matrix construction.
//!
//! `red1` re-applies equivalence collapsing to an arbitrary fault list;
//! `red2` removes structurally dominating faults. The `narrowing` qualifier
//! of `red1` is accepted and forwarded untouched; the reducer treats it as a
//! hint and currently applies the same equivalence fold.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::NetlistError;
use crate::fault::{FaultId, FaultList, FaultSite, FaultType};
use crate::network::Network;

/// Parsed reduction-mode string, any subset-combination of `red1`,
/// `red1:narrowing` and `red2` (comma separated).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReductionModes {
    /// Equivalence fold.
    pub red1: bool,
    /// Dominance removal.
    pub red2: bool,
    /// Narrowing qualifier on `red1`, forwarded opaquely.
    pub narrowing: bool,
}

impl FromStr for ReductionModes {
    type Err = NetlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modes = ReductionModes::default();
        for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            match item {
                "red1" => modes.red1 = true,
                "red1:narrowing" => {
                    modes.red1 = true;
                    modes.narrowing = true;
                }
                "red2" => modes.red2 = true,
                other => return Err(NetlistError::UnknownReduction(other.to_string())),
            }
        }
        Ok(modes)
    }
}

impl fmt::Display for ReductionModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if self.red1 {
            let tail = if self.narrowing { ":narrowing" } else { "" };
            write!(f, "red1{tail}")?;
            sep = ",";
        }
        if self.red2 {
            write!(f, "{sep}red2")?;
        }
        Ok(())
    }
}

/// Shrink a fault list prior to building the fault×pattern matrix.
///
/// Order is preserved; only later duplicates/dominators are removed, so a
/// fixed input yields a fixed output.
pub fn reduce_faults(
    faults: &[FaultId],
    list: &FaultList,
    network: &Network,
    modes: ReductionModes,
) -> Vec<FaultId> {
    let mut out: Vec<FaultId> = faults.to_vec();
    if modes.red1 {
        out = equivalence_fold(&out, list);
    }
    if modes.red2 {
        out = dominance_prune(&out, list, network);
    }
    debug!(
        before = faults.len(),
        after = out.len(),
        modes = %modes,
        "fault reduction"
    );
    out
}

/// Map every fault to its class representative and drop later duplicates.
fn equivalence_fold(faults: &[FaultId], list: &FaultList) -> Vec<FaultId> {
    let mut seen = HashSet::with_capacity(faults.len());
    faults
        .iter()
        .map(|&f| list.get(f).rep())
        .filter(|&rep| seen.insert(rep))
        .collect()
}

/// Drop gate-output faults dominated by a same-gate input-pin fault that is
/// also in the list: any test for the pin fault detects the output fault,
/// so covering the pin fault suffices.
///
/// Sound for stuck-at faults only; transition-delay lists pass through.
fn dominance_prune(faults: &[FaultId], list: &FaultList, network: &Network) -> Vec<FaultId> {
    if list.fault_type() != FaultType::StuckAt {
        return faults.to_vec();
    }
    let present: HashSet<FaultId> = faults.iter().map(|&f| list.get(f).rep()).collect();
    let mut dropped: HashSet<FaultId> = HashSet::new();

    for node in network.nodes() {
        let Some(c) = node.kind.controlling_value() else {
            continue;
        };
        let nc = !c;
        let out_value = nc != node.kind.inverting();
        let out_rep = rep_of(list, node.id, FaultSite::Output, out_value);
        let Some(out_rep) = out_rep else { continue };
        if !present.contains(&out_rep) {
            continue;
        }
        let has_dominated_pin = (0..node.fanins.len() as u32).any(|pin| {
            rep_of(list, node.id, FaultSite::Input(pin), nc)
                .is_some_and(|r| r != out_rep && present.contains(&r))
        });
        if has_dominated_pin {
            dropped.insert(out_rep);
        }
    }

    faults
        .iter()
        .copied()
        .filter(|&f| !dropped.contains(&list.get(f).rep()))
        .collect()
}

fn rep_of(
    list: &FaultList,
    node: crate::network::NodeId,
    site: FaultSite,
    value: bool,
) -> Option<FaultId> {
    list.faults_of_node(node)
        .iter()
        .find(|f| f.site() == site && f.value() == value)
        .map(|f| f.rep())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::GateKind;
    use crate::network::NetworkBuilder;

    fn and2() -> Network {
        let mut b = NetworkBuilder::new("and2");
        b.add_input("a");
        b.add_input("b");
        b.add_output("y");
        b.add_gate("y", GateKind::And, ["a", "b"]);
        match b.build() {
            Ok(n) => n,
            Err(e) => panic!("build failed: {e}"),
        }
    }

    #[test]
    fn test_parse_mode_strings() {
        let all: ReductionModes = match "red1,red2".parse() {
            Ok(m) => m,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert!(all.red1 && all.red2 && !all.narrowing);

        let narrow: ReductionModes = match "red1:narrowing".parse() {
            Ok(m) => m,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert!(narrow.red1 && narrow.narrowing && !narrow.red2);

        let none: ReductionModes = match "".parse() {
            Ok(m) => m,
            Err(e) => panic!("parse failed: {e}"),
        };
        assert_eq!(none, ReductionModes::default());

        assert!("red3".parse::<ReductionModes>().is_err());
    }

    #[test]
    fn test_mode_display_round_trip() {
        for s in ["red1", "red2", "red1,red2", "red1:narrowing"] {
            let m: ReductionModes = match s.parse() {
                Ok(m) => m,
                Err(e) => panic!("parse {s} failed: {e}"),
            };
            assert_eq!(m.to_string(), s);
        }
    }

    #[test]
    fn test_red1_folds_duplicates() {
        let n = and2();
        let list = n.gen_faults(FaultType::StuckAt);
        let all: Vec<FaultId> = list.all().iter().map(|f| f.id()).collect();
        let modes: ReductionModes = match "red1".parse() {
            Ok(m) => m,
            Err(e) => panic!("parse failed: {e}"),
        };
        let reduced = reduce_faults(&all, &list, &n, modes);
        assert_eq!(reduced.len(), list.rep_count());
        // Idempotent.
        assert_eq!(reduce_faults(&reduced, &list, &n, modes), reduced);
    }

    #[test]
    fn test_red2_drops_dominated_output_fault() {
        let n = and2();
        let list = n.gen_faults(FaultType::StuckAt);
        let reps: Vec<FaultId> = list.representatives().map(|f| f.id()).collect();
        let modes: ReductionModes = match "red2".parse() {
            Ok(m) => m,
            Err(e) => panic!("parse failed: {e}"),
        };
        let reduced = reduce_faults(&reps, &list, &n, modes);
        // y/out:sa1 is dominated by a:sa1 (== y/in0:sa1) and b:sa1.
        assert_eq!(reduced.len(), reps.len() - 1);
        let y = match n.find_node("y") {
            Some(id) => id,
            None => panic!("missing y"),
        };
        let y_out_sa1 = match list
            .faults_of_node(y)
            .iter()
            .find(|f| f.site() == FaultSite::Output && f.value())
        {
            Some(f) => f.rep(),
            None => panic!("missing fault"),
        };
        assert!(!reduced.contains(&y_out_sa1));
    }
}
