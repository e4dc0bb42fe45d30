//! CLI surface and exit behavior.

mod common;

use assert_cmd::Command;
use common::fixtures::improperly_redacted_page;
use predicates::prelude::*;
use std::fs;

fn unredact() -> Command {
    Command::cargo_bin("unredact").unwrap()
}

#[test]
fn test_missing_input_exits_nonzero() {
    unredact()
        .arg("/no/such/path.pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_empty_directory_is_a_warning_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    unredact()
        .arg(dir.path())
        .arg("--scan-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("No PDF files found"));
}

#[test]
fn test_scan_only_reports_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    improperly_redacted_page().build(&dir.path().join("leaky.pdf"));
    let report_path = dir.path().join("report.json");

    unredact()
        .arg(dir.path())
        .arg("--scan-only")
        .arg("--report")
        .arg(&report_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Flagged for recovery:   1"));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(value["total_files"], 1);
    assert_eq!(value["files"][0]["should_process"], true);

    // Scan-only must not leave recovery documents behind.
    let outputs: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .contains("_unredacted")
        })
        .collect();
    assert!(outputs.is_empty());
}

#[test]
fn test_recovery_writes_the_selected_mode() {
    let dir = tempfile::tempdir().unwrap();
    improperly_redacted_page().build(&dir.path().join("leaky.pdf"));
    let out_dir = dir.path().join("out");

    unredact()
        .arg(dir.path().join("leaky.pdf"))
        .arg("--mode")
        .arg("side-by-side")
        .arg("-o")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Recovered"));

    assert!(out_dir.join("leaky_side_by_side.pdf").exists());
}

#[test]
fn test_clean_file_has_nothing_to_recover() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.pdf");
    common::fixtures::TestPdfBuilder::new()
        .with_text("nothing hidden here", 20.0, 700.0, 10.0)
        .build(&path);

    unredact()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to recover"));
}
