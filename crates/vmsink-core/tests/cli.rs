//! CLI E2E tests: configuration errors, export from a tick file, import
//! against an unreachable endpoint.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

const TICKS: &str = concat!(
    r#"{"number": 1, "timestamp": null}"#,
    "\n",
    r#"{"number": 98, "timestamp": "2024-01-01T00:00:30Z", "operations": [{"name": "cpu", "kind": "gauge", "op": "set", "value": 1}]}"#,
    "\n",
    r#"{"number": 150, "timestamp": "2024-01-01T00:01:00Z", "operations": [{"name": "cpu", "kind": "gauge", "op": "set", "value": 2}]}"#,
    "\n",
);

fn vmsink() -> Command {
    let mut cmd = cargo_bin_cmd!("vmsink");
    cmd.timeout(Duration::from_secs(60));
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("VMSINK_CONFIG");
    cmd
}

#[test]
fn test_help() {
    vmsink()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("csv"));
}

#[test]
fn test_zero_interval_exits_10() {
    let dir = tempdir().unwrap();
    vmsink()
        .args(["csv", "export", "-i", "0", "--csv-root"])
        .arg(dir.path())
        .write_stdin("")
        .assert()
        .code(10)
        .stderr(predicate::str::contains("scrape interval"));
}

#[test]
fn test_negative_interval_exits_10() {
    let dir = tempdir().unwrap();
    vmsink()
        .args(["csv", "export", "-i", "-5", "--csv-root"])
        .arg(dir.path())
        .write_stdin("")
        .assert()
        .code(10)
        .stderr(predicate::str::contains("scrape interval"));
}

#[test]
fn test_zero_granularity_exits_10() {
    let dir = tempdir().unwrap();
    vmsink()
        .args(["csv", "export", "--file-granular", "0", "--csv-root"])
        .arg(dir.path())
        .write_stdin("")
        .assert()
        .code(10);
}

#[test]
fn test_bad_label_exits_10() {
    vmsink()
        .args(["csv", "import", "-l", "novalue", "--csv-root", "."])
        .assert()
        .code(10);
}

#[test]
fn test_invalid_config_file_exits_10() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "scrape_interval = \"often\"\n").unwrap();
    vmsink()
        .arg("--config")
        .arg(&config)
        .args(["csv", "export"])
        .write_stdin("")
        .assert()
        .code(10);
}

#[test]
fn test_export_writes_partitions() {
    let dir = tempdir().unwrap();
    let ticks = dir.path().join("ticks.jsonl");
    fs::write(&ticks, TICKS).unwrap();
    let root = dir.path().join("csv");

    vmsink()
        .args(["--quiet", "csv", "export", "--module-hash", "abc", "--ticks"])
        .arg(&ticks)
        .arg("--csv-root")
        .arg(&root)
        .assert()
        .success();

    let folder = root.join("abc/0000000000");
    assert_eq!(
        fs::read_to_string(folder.join("metrics-0.csv")).unwrap(),
        "#epoch,cpu\n1704067230000,1"
    );
    assert_eq!(
        fs::read_to_string(folder.join("metrics-100.csv")).unwrap(),
        "#epoch,cpu\n1704067260000,2"
    );
}

#[test]
fn test_export_reads_stdin_with_config_file() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("out");
    let config = dir.path().join("config.toml");
    fs::write(
        &config,
        format!(
            "scrape_interval = 60\n[csv]\nroot = \"{}\"\n",
            root.display()
        ),
    )
    .unwrap();

    vmsink()
        .arg("--config")
        .arg(&config)
        .args(["csv", "export", "--ticks", "-"])
        .write_stdin(TICKS)
        .assert()
        .success();

    // Only the 00:01:00 tick is on a 60 s boundary.
    let folder = root.join("default/0000000000");
    assert!(!folder.join("metrics-0.csv").exists());
    assert_eq!(
        fs::read_to_string(folder.join("metrics-100.csv")).unwrap(),
        "#epoch,cpu\n1704067260000,2"
    );
}

#[test]
fn test_directory_conflict_exits_11() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("csv");
    fs::create_dir_all(root.join("abc")).unwrap();
    fs::write(root.join("abc/0000000000"), "occupied").unwrap();

    vmsink()
        .args(["csv", "export", "--module-hash", "abc", "--csv-root"])
        .arg(&root)
        .write_stdin(TICKS)
        .assert()
        .code(11)
        .stderr(predicate::str::contains("is not a folder"));
}

#[test]
fn test_malformed_tick_stream_exits_12() {
    let dir = tempdir().unwrap();
    vmsink()
        .args(["csv", "export", "--csv-root"])
        .arg(dir.path())
        .write_stdin("not json\n")
        .assert()
        .code(12);
}

#[test]
fn test_import_unreachable_endpoint_still_exits_0() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("metrics-0.csv"), "#epoch,cpu\n1000,1").unwrap();

    vmsink()
        .args(["csv", "import", "-a", "127.0.0.1", "-p", "1", "--csv-root"])
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("CSV import request failed"));
}

#[test]
fn test_completions() {
    vmsink()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vmsink"));
}
