//! End-to-end compaction invariants: whatever the pipeline does to the
//! vector list, re-simulation must still detect every originally detected
//! fault.

use opentpg_compact::{CompactionAlgorithm, CompactionConfig, Compactor, MergeFill};
use opentpg_dtpg::{Dtpg, DtpgMode};
use opentpg_fsim::Fsim3;
use opentpg_netlist::{FaultId, FaultType, Network};
use opentpg_test_helpers::prelude::*;
use opentpg_tv::Tv;
use std::collections::HashSet;

const ALL_TAGS: &[&str] = &[
    "dsatur",
    "isx",
    "tabucol",
    "mincov",
    "mincov+dsatur",
    "mincov+isx",
    "dsatur+mincov",
    "isx+mincov",
    "coloring2",
    "coloring3",
    "coloring4",
    "coloring5",
    "coloring6",
];

fn detected_by(network: &Network, fault_type: FaultType, tvs: &[Tv]) -> HashSet<FaultId> {
    let mut sim = Fsim3::new(network, fault_type);
    let mut hits = HashSet::new();
    for tv in tvs {
        hits.extend(sim.sppfp(tv));
    }
    hits
}

#[test]
fn test_every_pipeline_preserves_coverage_on_c17() {
    let network = c17();
    let ft = FaultType::StuckAt;
    let mut dtpg = Dtpg::new(&network, ft);
    let (ndet, _, _) = dtpg.run(DtpgMode::Ffr, false);
    assert!(ndet > 0);

    let before: HashSet<FaultId> = dtpg.detected_faults().iter().copied().collect();
    let compactor = Compactor::new(&network, ft, dtpg.detected_faults());

    for tag in ALL_TAGS {
        let algorithm: CompactionAlgorithm = must(tag.parse());
        let compacted = compactor.run(&algorithm, dtpg.tvlist());
        assert!(
            compacted.len() <= dtpg.tvlist().len(),
            "{tag} grew the pattern set"
        );
        let after = detected_by(&network, ft, &compacted);
        for fault in &before {
            assert!(
                after.contains(fault),
                "{tag} lost coverage of fault {fault}"
            );
        }
    }
}

#[test]
fn test_pipelines_deterministic_for_fixed_seed() {
    let network = c17();
    let ft = FaultType::StuckAt;
    let mut dtpg = Dtpg::new(&network, ft);
    dtpg.run(DtpgMode::Ffr, true);

    let config = CompactionConfig {
        seed: 42,
        fill: MergeFill::LeaveX,
    };
    for tag in ALL_TAGS {
        let algorithm: CompactionAlgorithm = must(tag.parse());
        let a = Compactor::new(&network, ft, dtpg.detected_faults())
            .with_config(config)
            .run(&algorithm, dtpg.tvlist());
        let b = Compactor::new(&network, ft, dtpg.detected_faults())
            .with_config(config)
            .run(&algorithm, dtpg.tvlist());
        assert_eq!(a, b, "{tag} is not deterministic");
    }
}

#[test]
fn test_random_fill_preserves_coverage() {
    let network = c17();
    let ft = FaultType::StuckAt;
    let mut dtpg = Dtpg::new(&network, ft);
    dtpg.run(DtpgMode::Single, false);

    let config = CompactionConfig {
        seed: 3,
        fill: MergeFill::Random,
    };
    let algorithm: CompactionAlgorithm = must("dsatur".parse());
    let compacted = Compactor::new(&network, ft, dtpg.detected_faults())
        .with_config(config)
        .run(&algorithm, dtpg.tvlist());

    let before: HashSet<FaultId> = dtpg.detected_faults().iter().copied().collect();
    let after = detected_by(&network, ft, &compacted);
    for fault in &before {
        assert!(after.contains(fault), "random fill lost fault {fault}");
    }
    for tv in &compacted {
        assert!(tv.is_fully_specified());
    }
}
