//! atpgctl - OpenTPG command-line driver

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use opentpg_compact::{CompactionAlgorithm, CompactionConfig, Compactor, MergeFill};
use opentpg_dtpg::{Dtpg, DtpgMode};
use opentpg_netlist::{FaultType, Network, NetlistFormat};

mod error;
mod report;

use error::CliError;
use report::RunReport;

#[derive(Parser)]
#[command(name = "atpgctl")]
#[command(about = "Test pattern generation for stuck-at and transition-delay faults")]
#[command(version)]
struct Cli {
    /// Run in single mode (one engine per fault site) [default]
    #[arg(short = 's', long, group = "mode")]
    single: bool,

    /// Run in FFR mode
    #[arg(short = 'f', long, group = "mode")]
    ffr: bool,

    /// Run in MFFC mode
    #[arg(short = 'm', long, group = "mode")]
    mffc: bool,

    /// Target stuck-at faults [default]
    #[arg(long, group = "fault_type")]
    stuck_at: bool,

    /// Target transition-delay faults
    #[arg(long, group = "fault_type")]
    transition_delay: bool,

    /// Read BLIF input [default for unknown extensions]
    #[arg(long, group = "format")]
    blif: bool,

    /// Read ISCAS89 (.bench) input
    #[arg(long, group = "format")]
    iscas89: bool,

    /// Drop faults detected by simulation of each new pattern
    #[arg(long)]
    drop: bool,

    /// Static compaction algorithm (dsatur, isx, tabucol, mincov, hybrids)
    #[arg(long, value_name = "ALGORITHM")]
    compaction: Option<String>,

    /// k-detection over FFR units (records up to k vectors per fault)
    #[arg(short = 'k', value_name = "INT")]
    k: Option<u32>,

    /// Seed for compaction tie-breaking and random fill
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Randomly fill unspecified positions of merged patterns
    #[arg(long)]
    fill: bool,

    /// Emit the summary as JSON instead of the human-readable block
    #[arg(long)]
    json: bool,

    /// Netlist files to process
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,
}

impl Cli {
    fn mode(&self) -> DtpgMode {
        if self.ffr {
            DtpgMode::Ffr
        } else if self.mffc {
            DtpgMode::Mffc
        } else {
            DtpgMode::Single
        }
    }

    fn fault_type(&self) -> FaultType {
        if self.transition_delay {
            FaultType::TransitionDelay
        } else {
            FaultType::StuckAt
        }
    }

    fn format(&self) -> Option<NetlistFormat> {
        if self.blif {
            Some(NetlistFormat::Blif)
        } else if self.iscas89 {
            Some(NetlistFormat::Iscas89)
        } else {
            None
        }
    }

    fn compaction_config(&self) -> CompactionConfig {
        CompactionConfig {
            seed: self.seed,
            fill: if self.fill {
                MergeFill::Random
            } else {
                MergeFill::LeaveX
            },
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut failures = 0usize;
    for file in &cli.files {
        if let Err(e) = run_file(&cli, file) {
            eprintln!("Error, could not process {}: {e}", file.display());
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{failures} of {} netlist file(s) failed", cli.files.len());
    }
    Ok(())
}

fn run_file(cli: &Cli, file: &Path) -> Result<(), CliError> {
    let network = Network::read(file, cli.format())?;
    let fault_type = cli.fault_type();

    let start = Instant::now();
    let mut dtpg = Dtpg::new(&network, fault_type);
    let (ndet, nunt, nabt) = match cli.k {
        Some(k) => dtpg.run_k(k),
        None => dtpg.run(cli.mode(), cli.drop),
    };
    let atpg_seconds = start.elapsed().as_secs_f64();

    let initial_patterns = dtpg.tvlist().len();
    let compaction_start = Instant::now();
    let tvlist = match cli.compaction.as_deref() {
        None => dtpg.tvlist().to_vec(),
        Some(tag) => match tag.parse::<CompactionAlgorithm>() {
            Ok(algorithm) => Compactor::new(&network, fault_type, dtpg.detected_faults())
                .with_config(cli.compaction_config())
                .run(&algorithm, dtpg.tvlist()),
            Err(e) => {
                // Unknown tags degrade to no compaction rather than
                // aborting the whole file.
                warn!("{e}; patterns left uncompacted");
                dtpg.tvlist().to_vec()
            }
        },
    };
    let compaction_seconds = compaction_start.elapsed().as_secs_f64();

    let report = RunReport {
        file: file.display().to_string(),
        total_faults: dtpg.faults().rep_count(),
        detected: ndet,
        untestable: nunt,
        aborted: nabt,
        initial_patterns,
        reduced_patterns: tvlist.len(),
        atpg_seconds,
        compaction_seconds,
    };
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_human();
    }
    Ok(())
}
