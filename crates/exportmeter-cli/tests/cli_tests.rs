//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn exportmeter() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("exportmeter").unwrap()
}

#[test]
fn validate_reference_form() {
    exportmeter()
        .arg("validate")
        .arg("--forms")
        .arg("../../forms/export-readiness.toml")
        .assert()
        .success()
        .stdout(predicate::str::contains("12 questions"))
        .stdout(predicate::str::contains("All forms valid"));
}

#[test]
fn validate_directory() {
    exportmeter()
        .arg("validate")
        .arg("--forms")
        .arg("../../forms")
        .assert()
        .success()
        .stdout(predicate::str::contains("Export Readiness Assessment"));
}

#[test]
fn validate_nonexistent_file() {
    exportmeter()
        .arg("validate")
        .arg("--forms")
        .arg("nonexistent.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dupes.toml");
    std::fs::write(
        &path,
        r#"
[form]
id = "dupes"
title = "Dupes"

[[questions]]
id = "same"
text = "First?"

[[questions]]
id = "same"
text = "Second?"
"#,
    )
    .unwrap();

    exportmeter()
        .arg("validate")
        .arg("--forms")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicate question ID"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    exportmeter()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created exportmeter.toml"))
        .stdout(predicate::str::contains("Created forms/example.toml"));

    assert!(dir.path().join("exportmeter.toml").exists());
    assert!(dir.path().join("forms/example.toml").exists());
    assert!(dir.path().join("answers-example.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    // First init
    exportmeter()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    // Second init should skip
    exportmeter()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn compare_receipts() {
    let dir = TempDir::new().unwrap();

    let baseline = make_test_receipt(80.0, "good", r#"[{"question_id": "q1", "response": "yes", "points": 1.0}]"#);
    let current = make_test_receipt(20.0, "critical", r#"[{"question_id": "q1", "response": "no", "points": 0.0}]"#);

    let baseline_path = dir.path().join("baseline.json");
    let current_path = dir.path().join("current.json");

    std::fs::write(&baseline_path, &baseline).unwrap();
    std::fs::write(&current_path, &current).unwrap();

    exportmeter()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline_path)
        .arg("--current")
        .arg(&current_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("regression"));
}

#[test]
fn compare_fails_on_regression_when_asked() {
    let dir = TempDir::new().unwrap();

    let baseline = make_test_receipt(80.0, "good", r#"[{"question_id": "q1", "response": "yes", "points": 1.0}]"#);
    let current = make_test_receipt(20.0, "critical", r#"[{"question_id": "q1", "response": "no", "points": 0.0}]"#);

    let baseline_path = dir.path().join("baseline.json");
    let current_path = dir.path().join("current.json");

    std::fs::write(&baseline_path, &baseline).unwrap();
    std::fs::write(&current_path, &current).unwrap();

    exportmeter()
        .arg("compare")
        .arg("--baseline")
        .arg(&baseline_path)
        .arg("--current")
        .arg(&current_path)
        .arg("--fail-on-regression")
        .assert()
        .failure();
}

#[test]
fn compare_nonexistent_receipt() {
    exportmeter()
        .arg("compare")
        .arg("--baseline")
        .arg("no_such_file.json")
        .arg("--current")
        .arg("also_no_file.json")
        .assert()
        .failure();
}

#[test]
fn help_output() {
    exportmeter()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Export readiness scoring service"));
}

#[test]
fn version_output() {
    exportmeter()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("exportmeter"));
}

/// Create a minimal valid JSON receipt for testing.
fn make_test_receipt(percentage: f64, level: &str, answers: &str) -> String {
    format!(
        r#"{{
    "id": "00000000-0000-0000-0000-000000000000",
    "created_at": "2026-01-01T00:00:00Z",
    "user_id": "user-1",
    "form_id": "export-readiness",
    "total_score": {percentage},
    "max_possible_score": 100.0,
    "percentage": {percentage},
    "level": "{level}",
    "export_ready": false,
    "message": "",
    "description": "",
    "answers": {answers},
    "gap_categories": []
}}"#
    )
}
