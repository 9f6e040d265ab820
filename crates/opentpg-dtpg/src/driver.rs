//! The ATPG driver: iterate units, classify faults, collect vectors.

use std::fmt;
use std::str::FromStr;

use opentpg_fsim::Fsim3;
use opentpg_netlist::{FaultId, FaultList, FaultType, Network};
use opentpg_tv::Tv;
use tracing::{debug, info};

use crate::engine::{DEFAULT_CONFLICT_BUDGET, DtpgEngine, SolveKOutcome, SolveOutcome};
use crate::status::{FaultStatus, FaultStatusMgr};

/// Fault-partitioning granularity of a run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DtpgMode {
    /// One engine per targeted node's output cone.
    Single,
    /// One engine per fanout-free region.
    Ffr,
    /// One engine per maximal fanout-free cone.
    Mffc,
}

impl FromStr for DtpgMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(DtpgMode::Single),
            "ffr" => Ok(DtpgMode::Ffr),
            "mffc" => Ok(DtpgMode::Mffc),
            other => Err(format!("unknown dtpg mode `{other}`")),
        }
    }
}

impl fmt::Display for DtpgMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DtpgMode::Single => write!(f, "single"),
            DtpgMode::Ffr => write!(f, "ffr"),
            DtpgMode::Mffc => write!(f, "mffc"),
        }
    }
}

/// The test-generation driver.
///
/// Owns the growing vector list, the detected-fault list, the status
/// registry and the fault simulator (whose skip set mirrors the registry's
/// terminal states) for one run over one network.
#[derive(Debug)]
pub struct Dtpg<'a> {
    network: &'a Network,
    fault_type: FaultType,
    fsim: Fsim3<'a>,
    status: FaultStatusMgr,
    tvlist: Vec<Tv>,
    detected: Vec<FaultId>,
    conflict_budget: u64,
    ndet: usize,
    nunt: usize,
    nabt: usize,
}

impl<'a> Dtpg<'a> {
    /// A fresh driver for one network and fault model.
    pub fn new(network: &'a Network, fault_type: FaultType) -> Self {
        let mut fsim = Fsim3::new(network, fault_type);
        fsim.clear_skip_all();
        let nfaults = fsim.faults().len();
        Self {
            network,
            fault_type,
            fsim,
            status: FaultStatusMgr::new(nfaults),
            tvlist: Vec::new(),
            detected: Vec::new(),
            conflict_budget: DEFAULT_CONFLICT_BUDGET,
            ndet: 0,
            nunt: 0,
            nabt: 0,
        }
    }

    /// Override the per-solve conflict budget.
    pub fn set_conflict_budget(&mut self, budget: u64) {
        self.conflict_budget = budget;
    }

    /// Run one pass in the given mode.
    ///
    /// Returns `(ndet, nunt, nabt)`: detected, untestable and aborted
    /// counts over the faults attempted in this pass.
    pub fn run(&mut self, mode: DtpgMode, drop: bool) -> (usize, usize, usize) {
        match mode {
            DtpgMode::Single => self.single_mode(drop),
            DtpgMode::Ffr => self.ffr_mode(drop),
            DtpgMode::Mffc => self.mffc_mode(drop),
        }
    }

    /// Single mode: one engine per fault's node.
    pub fn single_mode(&mut self, drop: bool) -> (usize, usize, usize) {
        self.reset_counters();
        let targets: Vec<FaultId> = self
            .fsim
            .faults()
            .representatives()
            .map(|f| f.id())
            .collect();
        for fid in targets {
            if self.status.get(fid) != FaultStatus::Undetected {
                continue;
            }
            let node = self.faults().get(fid).node();
            let engine = DtpgEngine::for_node(self.network, self.fault_type, node)
                .with_conflict_budget(self.conflict_budget);
            self.call_dtpg(&engine, fid, drop);
        }
        self.finish("single");
        (self.ndet, self.nunt, self.nabt)
    }

    /// FFR mode: one engine per fanout-free region.
    pub fn ffr_mode(&mut self, drop: bool) -> (usize, usize, usize) {
        self.reset_counters();
        for ffr in self.network.ffr_list() {
            let unit = self.faults().representatives_of_unit(&ffr.nodes);
            if unit.is_empty() {
                continue;
            }
            let engine = DtpgEngine::for_ffr(self.network, self.fault_type, &ffr)
                .with_conflict_budget(self.conflict_budget);
            for fid in unit {
                if self.status.get(fid) == FaultStatus::Undetected {
                    self.call_dtpg(&engine, fid, drop);
                }
            }
        }
        self.finish("ffr");
        (self.ndet, self.nunt, self.nabt)
    }

    /// MFFC mode: one engine per maximal fanout-free cone.
    pub fn mffc_mode(&mut self, drop: bool) -> (usize, usize, usize) {
        self.reset_counters();
        for mffc in self.network.mffc_list() {
            let unit = self.faults().representatives_of_unit(&mffc.nodes);
            if unit.is_empty() {
                continue;
            }
            let engine = DtpgEngine::for_mffc(self.network, self.fault_type, &mffc)
                .with_conflict_budget(self.conflict_budget);
            for fid in unit {
                if self.status.get(fid) == FaultStatus::Undetected {
                    self.call_dtpg(&engine, fid, drop);
                }
            }
        }
        self.finish("mffc");
        (self.ndet, self.nunt, self.nabt)
    }

    /// k-detection pass over FFR units: record up to `k` vectors per
    /// detected fault.
    ///
    /// Fault dropping is deliberately not offered here; dropping would
    /// leave the dropped faults with a single covering vector and defeat
    /// the purpose of k-detection.
    pub fn run_k(&mut self, k: u32) -> (usize, usize, usize) {
        self.reset_counters();
        for ffr in self.network.ffr_list() {
            let unit = self.faults().representatives_of_unit(&ffr.nodes);
            if unit.is_empty() {
                continue;
            }
            let engine = DtpgEngine::for_ffr(self.network, self.fault_type, &ffr)
                .with_conflict_budget(self.conflict_budget);
            for fid in unit {
                if self.status.get(fid) != FaultStatus::Undetected {
                    continue;
                }
                let fault = *self.faults().get(fid);
                match engine.solve_k(&fault, k) {
                    SolveKOutcome::Detected(tvs) => {
                        self.ndet += 1;
                        self.status.set(fid, FaultStatus::Detected);
                        self.fsim.set_skip(fid);
                        self.detected.push(fid);
                        self.tvlist.extend(tvs);
                    }
                    SolveKOutcome::Untestable => {
                        self.nunt += 1;
                        self.status.set(fid, FaultStatus::Untestable);
                        self.fsim.set_skip(fid);
                    }
                    SolveKOutcome::Aborted => {
                        self.nabt += 1;
                    }
                }
            }
        }
        self.finish("k-ffr");
        (self.ndet, self.nunt, self.nabt)
    }

    /// Shared per-fault classification.
    fn call_dtpg(&mut self, engine: &DtpgEngine<'_>, fid: FaultId, drop: bool) {
        let fault = *self.faults().get(fid);
        match engine.solve(&fault) {
            SolveOutcome::Detected(tv) => {
                self.ndet += 1;
                self.status.set(fid, FaultStatus::Detected);
                self.fsim.set_skip(fid);
                self.detected.push(fid);
                self.tvlist.push(tv.clone());
                if drop {
                    // The simulator only reports non-skipped faults, so the
                    // target itself never reappears here.
                    for dropped in self.fsim.sppfp(&tv) {
                        self.status.set(dropped, FaultStatus::Detected);
                        self.fsim.set_skip(dropped);
                        self.detected.push(dropped);
                        self.ndet += 1;
                    }
                }
            }
            SolveOutcome::Untestable => {
                self.nunt += 1;
                self.status.set(fid, FaultStatus::Untestable);
                self.fsim.set_skip(fid);
            }
            SolveOutcome::Aborted => {
                // Leaves the fault undetected; a later unit or run may
                // still classify it.
                self.nabt += 1;
            }
        }
    }

    fn reset_counters(&mut self) {
        self.ndet = 0;
        self.nunt = 0;
        self.nabt = 0;
    }

    fn finish(&self, mode: &str) {
        info!(
            mode,
            ndet = self.ndet,
            nunt = self.nunt,
            nabt = self.nabt,
            patterns = self.tvlist.len(),
            "dtpg pass done"
        );
        debug!(fault_type = %self.fault_type, "registry: {:?}", self.status.counts());
    }

    /// The generated vectors, in detection order.
    pub fn tvlist(&self) -> &[Tv] {
        &self.tvlist
    }

    /// Detected faults: targets in detection order, dropped faults
    /// interleaved right after their triggering vector's target.
    pub fn detected_faults(&self) -> &[FaultId] {
        &self.detected
    }

    /// The collapsed fault universe of the run.
    pub fn faults(&self) -> &FaultList {
        self.fsim.faults()
    }

    /// The status registry.
    pub fn status(&self) -> &FaultStatusMgr {
        &self.status
    }

    /// The fault model of the run.
    pub fn fault_type(&self) -> FaultType {
        self.fault_type
    }

    /// The network under test.
    pub fn network(&self) -> &'a Network {
        self.network
    }
}
