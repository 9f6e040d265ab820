//! File-level reader tests: extension dispatch and I/O errors.

use opentpg_netlist::{Network, NetlistError, NetlistFormat};
use std::fs;
use tempfile::TempDir;

const BENCH: &str = "INPUT(a)\nOUTPUT(y)\ny = NOT(a)\n";
const BLIF: &str = ".model inv\n.inputs a\n.outputs y\n.names a y\n0 1\n.end\n";

fn must<T, E: std::fmt::Debug>(r: Result<T, E>) -> T {
    match r {
        Ok(v) => v,
        Err(e) => panic!("must failed: {e:?}"),
    }
}

#[test]
fn test_read_dispatches_on_extension() {
    let dir = must(TempDir::new());
    let bench_path = dir.path().join("inv.bench");
    let blif_path = dir.path().join("inv.blif");
    must(fs::write(&bench_path, BENCH));
    must(fs::write(&blif_path, BLIF));

    let from_bench = must(Network::read(&bench_path, None));
    let from_blif = must(Network::read(&blif_path, None));
    assert_eq!(from_bench.input_count(), from_blif.input_count());
    assert_eq!(from_bench.outputs().len(), from_blif.outputs().len());
}

#[test]
fn test_explicit_format_overrides_extension() {
    let dir = must(TempDir::new());
    // .bench content behind a .txt extension would default to BLIF.
    let path = dir.path().join("inv.txt");
    must(fs::write(&path, BENCH));
    assert!(Network::read(&path, None).is_err());
    let n = must(Network::read(&path, Some(NetlistFormat::Iscas89)));
    assert_eq!(n.input_count(), 1);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = must(TempDir::new());
    let path = dir.path().join("missing.bench");
    match Network::read(&path, None) {
        Err(NetlistError::Io { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected Io error, got {other:?}"),
    }
}
