//! The per-file run summary.

use serde::Serialize;

/// Counts and timings of one file's run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub file: String,
    pub total_faults: usize,
    pub detected: usize,
    pub untestable: usize,
    pub aborted: usize,
    pub initial_patterns: usize,
    pub reduced_patterns: usize,
    pub atpg_seconds: f64,
    pub compaction_seconds: f64,
}

impl RunReport {
    /// The human-readable block format of the reference driver.
    pub fn print_human(&self) {
        println!("file name:              {}", self.file);
        println!("# of total faults:      {:8}", self.total_faults);
        println!("# of detected faults:   {:8}", self.detected);
        println!("# of untestable faults: {:8}", self.untestable);
        println!("# of aborted faults:    {:8}", self.aborted);
        println!("# of initial patterns:  {:8}", self.initial_patterns);
        println!("# of reduced patterns:  {:8}", self.reduced_patterns);
        println!("CPU time(ATPG):         {:8.2}", self.atpg_seconds);
        println!("CPU time(compaction):   {:8.2}", self.compaction_seconds);
    }
}
