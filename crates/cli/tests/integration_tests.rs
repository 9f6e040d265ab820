//! Integration tests for the atpgctl CLI.
//!
//! Covers the main run modes, compaction tags, exit-code behavior with
//! unreadable files, and the JSON report shape.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use opentpg_test_helpers::prelude::*;

fn atpgctl() -> Command {
    must(Command::cargo_bin("atpgctl"))
}

fn write_netlist(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    must(fs::write(&path, text));
    path
}

fn is_json() -> impl predicates::Predicate<[u8]> {
    predicates::function::function(|s: &[u8]| {
        std::str::from_utf8(s)
            .is_ok_and(|text| serde_json::from_str::<Value>(text).is_ok())
    })
}

#[test]
fn test_and2_bench_single_mode() {
    let dir = must(TempDir::new());
    let path = write_netlist(&dir, "and2.bench", AND2_BENCH);
    atpgctl()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("# of total faults:"))
        .stdout(predicate::str::contains("# of aborted faults:"));
}

#[test]
fn test_blif_input_via_extension() {
    let dir = must(TempDir::new());
    let path = write_netlist(&dir, "and2.blif", AND2_BLIF);
    atpgctl()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("# of detected faults:"));
}

#[test]
fn test_explicit_format_flag_overrides_extension() {
    let dir = must(TempDir::new());
    // A .bench body behind an unknown extension needs --iscas89.
    let path = write_netlist(&dir, "and2.net", AND2_BENCH);
    atpgctl().arg("--iscas89").arg(&path).assert().success();
}

#[test]
fn test_ffr_mode_with_drop_and_compaction() {
    let dir = must(TempDir::new());
    let path = write_netlist(&dir, "c17.bench", C17_BENCH);
    atpgctl()
        .args(["--ffr", "--drop", "--compaction", "dsatur"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("# of reduced patterns:"));
}

#[test]
fn test_mincov_hybrid_compaction() {
    let dir = must(TempDir::new());
    let path = write_netlist(&dir, "c17.bench", C17_BENCH);
    atpgctl()
        .args(["-f", "--compaction", "mincov+dsatur"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_unknown_compaction_tag_degrades_gracefully() {
    let dir = must(TempDir::new());
    let path = write_netlist(&dir, "c17.bench", C17_BENCH);
    // Unknown tag: the run still succeeds, patterns stay uncompacted.
    atpgctl()
        .args(["--compaction", "nosuchalgo"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("# of reduced patterns:"));
}

#[test]
fn test_k_detection_flag() {
    let dir = must(TempDir::new());
    let path = write_netlist(&dir, "c17.bench", C17_BENCH);
    atpgctl().args(["-k", "2"]).arg(&path).assert().success();
}

#[test]
fn test_transition_delay_run() {
    let dir = must(TempDir::new());
    let path = write_netlist(&dir, "c17.bench", C17_BENCH);
    atpgctl()
        .args(["--transition-delay", "-f"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn test_missing_file_fails_after_attempting_rest() {
    let dir = must(TempDir::new());
    let good = write_netlist(&dir, "c17.bench", C17_BENCH);
    let missing = dir.path().join("nope.bench");
    // The good file is still processed; the exit code reports the failure.
    atpgctl()
        .arg(&missing)
        .arg(&good)
        .assert()
        .failure()
        .stdout(predicate::str::contains("# of total faults:"))
        .stderr(predicate::str::contains("could not process"));
}

#[test]
fn test_malformed_netlist_is_reported() {
    let dir = must(TempDir::new());
    let path = write_netlist(&dir, "broken.bench", "y = FROB(a)\n");
    atpgctl()
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not process"));
}

#[test]
fn test_json_report_shape() {
    let dir = must(TempDir::new());
    let path = write_netlist(&dir, "and2.bench", AND2_BENCH);
    let output = atpgctl()
        .args(["--json"])
        .arg(&path)
        .assert()
        .success()
        .stdout(is_json())
        .get_output()
        .stdout
        .clone();
    let report: Value = must(serde_json::from_slice(&output));
    for key in [
        "total_faults",
        "detected",
        "untestable",
        "aborted",
        "initial_patterns",
        "reduced_patterns",
    ] {
        assert!(report.get(key).is_some(), "missing key {key}");
    }
    // The 2-input AND has no redundant logic.
    assert_eq!(report["untestable"], 0);
    assert_eq!(report["aborted"], 0);
}

#[test]
fn test_mode_flags_are_mutually_exclusive() {
    let dir = must(TempDir::new());
    let path = write_netlist(&dir, "and2.bench", AND2_BENCH);
    atpgctl()
        .args(["--single", "--mffc"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let dir = must(TempDir::new());
    let path = write_netlist(&dir, "c17.bench", C17_BENCH);
    let run = || -> Value {
        let out = atpgctl()
            .args(["-f", "--compaction", "tabucol", "--seed", "7", "--json"])
            .arg(&path)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        must(serde_json::from_slice(&out))
    };
    let (a, b) = (run(), run());
    // Timings jitter; the counts must not.
    for key in ["detected", "initial_patterns", "reduced_patterns"] {
        assert_eq!(a[key], b[key], "field {key} must be reproducible");
    }
}
