mod common;

use assert_cmd::Command;
use common::{write_fixture, SAMPLE_RESPONSE};
use predicates::prelude::*;
use tempfile::TempDir;

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cohort-dashboard").unwrap();
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env("LOG_LEVEL", "ERROR")
        .env("COHORT_LOG_DIR", dir.path().join("logs"))
        // Nothing listens here; any accidental request fails fast.
        .env("COHORT_API_URL", "http://127.0.0.1:9/api");
    cmd
}

#[test]
fn test_show_json() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "result.json", SAMPLE_RESPONSE).unwrap();

    let output = cli(&dir)
        .args(["show", path.to_str().unwrap(), "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["has_result"], true);
    assert_eq!(json["summary"]["title"], "Retention Analysis");
    assert_eq!(json["matrices"][0]["rows"][0]["cells"][1], "48.2%");
}

#[test]
fn test_show_text_with_toggles() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "result.json", SAMPLE_RESPONSE).unwrap();

    cli(&dir)
        .args([
            "show",
            path.to_str().unwrap(),
            "--expand",
            "revenue,arpu",
            "--collapse",
            "retention",
            "--metric",
            "revenue",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("₹1,234.5"))
        .stdout(predicate::str::contains("Retention Analysis (collapsed)"))
        .stdout(predicate::str::contains("Cohort Trends - Revenue"));
}

#[test]
fn test_show_missing_file() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["show", "does-not-exist.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to read analysis result"));
}

#[test]
fn test_show_missing_file_json_error() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["show", "does-not-exist.json", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"error\""));
}

#[test]
fn test_show_rejects_unknown_metric() {
    let dir = TempDir::new().unwrap();
    let path = write_fixture(dir.path(), "result.json", SAMPLE_RESPONSE).unwrap();
    cli(&dir)
        .args(["show", path.to_str().unwrap(), "--metric", "engagement"])
        .assert()
        .failure();
}

#[test]
fn test_analyze_validates_before_sending() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args([
            "analyze",
            "--filename",
            "events.csv",
            "--user-id",
            "user_id",
            "--cohort-grouping",
            "signup_date",
            "--event-column",
            "event_date",
            "--metric",
            "revenue",
            "--interval",
            "monthly",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Please specify the revenue column for revenue analysis.",
        ))
        .stdout(predicate::str::contains("Running cohort analysis").not());
}

#[test]
fn test_analyze_rejects_reversed_dates() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args([
            "analyze",
            "--filename",
            "events.csv",
            "--user-id",
            "user_id",
            "--cohort-grouping",
            "signup_date",
            "--event-column",
            "event_date",
            "--metric",
            "retention",
            "--interval",
            "weekly",
            "--start-date",
            "2024-05-01",
            "--end-date",
            "2024-01-01",
            "--json",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Start date must be before end date."));
}

#[test]
fn test_analyze_database_needs_table() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args([
            "analyze",
            "--data-source",
            "db",
            "--db-url",
            "postgresql://localhost/app",
            "--user-id",
            "user_id",
            "--cohort-grouping",
            "signup_date",
            "--event-column",
            "event_date",
            "--metric",
            "retention",
            "--interval",
            "monthly",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "Please provide a database URL and select a table.",
        ))
        .stdout(predicate::str::contains("Running cohort analysis").not());
}

#[test]
fn test_analyze_database_request_is_sent() {
    // no --filename: a complete database request passes validation and
    // reaches the (unreachable) backend
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args([
            "analyze",
            "--data-source",
            "db",
            "--db-url",
            "postgresql://localhost/app",
            "--table",
            "events",
            "--columns",
            "user_id,signup_date,event_date",
            "--cleaning",
            "remove",
            "--no-null-handling",
            "--user-id",
            "user_id",
            "--cohort-grouping",
            "signup_date",
            "--event-column",
            "event_date",
            "--metric",
            "retention",
            "--interval",
            "monthly",
            "--json",
        ])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Network error"))
        .stdout(predicate::str::contains("Please").not());
}

#[test]
fn test_analyze_rejects_unknown_source() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args([
            "analyze",
            "--data-source",
            "parquet",
            "--user-id",
            "u",
            "--cohort-grouping",
            "c",
            "--event-column",
            "e",
            "--metric",
            "retention",
            "--interval",
            "monthly",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown data source"));
}

#[test]
fn test_status_unreachable_backend() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["status", "job-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Network error"));
}
