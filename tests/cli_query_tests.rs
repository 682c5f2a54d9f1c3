//! Command-line tests for `latencia query` and `latencia schema`
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests
//!
//! Runs the binary against the fixtures in tests/fixtures.

use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const FIXTURE_JSON: &str = "tests/fixtures/telemetry.json";
const FIXTURE_MIXED: &str = "tests/fixtures/telemetry_mixed.csv";
const FIXTURE_NDJSON: &str = "tests/fixtures/telemetry.ndjson";

fn query_json(args: &[&str]) -> serde_json::Value {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("latencia");
    let output = cmd.arg("query").args(args).assert().success();
    serde_json::from_slice(&output.get_output().stdout).expect("stdout should be JSON")
}

#[test]
fn test_query_end_to_end_scenario() {
    let json = query_json(&[
        "--data",
        FIXTURE_JSON,
        "-r",
        "EU",
        "-r",
        "US",
        "-r",
        "APAC",
        "-t",
        "150",
    ]);

    assert_eq!(json["EU"]["avg_latency"], 210.0);
    assert_eq!(json["EU"]["p95_latency"], 300.0);
    assert_eq!(json["EU"]["avg_uptime"], 0.97);
    assert_eq!(json["EU"]["breaches"], 1);

    assert_eq!(json["US"]["avg_latency"], 80.0);
    assert_eq!(json["US"]["p95_latency"], 80.0);
    assert_eq!(json["US"]["avg_uptime"], 1.0);
    assert_eq!(json["US"]["breaches"], 0);

    assert_eq!(
        json["APAC"],
        serde_json::json!({"avg_latency": 0.0, "p95_latency": 0.0, "avg_uptime": 0.0, "breaches": 0})
    );
}

#[test]
fn test_query_preserves_request_order() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("latencia");
    let output = cmd
        .args(["query", "--data", FIXTURE_JSON, "-r", "US", "-r", "EU", "-t", "150"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&output.get_output().stdout).to_string();

    assert!(stdout.find("\"US\"").unwrap() < stdout.find("\"EU\"").unwrap());
}

#[test]
fn test_query_mixed_case_csv_with_status_uptime() {
    let json = query_json(&[
        "--data",
        FIXTURE_MIXED,
        "-r",
        "US-East",
        "-r",
        "eu-west",
        "-t",
        "150",
    ]);

    assert_eq!(json["US-East"]["avg_latency"], 150.0);
    assert_eq!(json["US-East"]["p95_latency"], 200.0);
    assert_eq!(json["US-East"]["avg_uptime"], 0.666667);
    assert_eq!(json["US-East"]["breaches"], 1);

    // Exactly at the threshold is not a breach
    assert_eq!(json["eu-west"]["breaches"], 0);
    assert_eq!(json["eu-west"]["avg_uptime"], 1.0);
}

#[test]
fn test_query_ndjson_without_uptime_field() {
    let json = query_json(&["--data", FIXTURE_NDJSON, "-r", "APAC", "-t", "200"]);

    assert_eq!(json["APAC"]["avg_latency"], 200.25);
    assert_eq!(json["APAC"]["p95_latency"], 210.5);
    assert_eq!(json["APAC"]["avg_uptime"], 1.0);
    assert_eq!(json["APAC"]["breaches"], 1);
}

#[test]
fn test_query_default_threshold() {
    // 300 > 180, 120 is not
    let json = query_json(&["--data", FIXTURE_JSON, "-r", "EU"]);
    assert_eq!(json["EU"]["breaches"], 1);
}

#[test]
fn test_query_request_file() {
    let mut request = NamedTempFile::new().unwrap();
    write!(request, r#"{{"regions": ["US", "EU"], "threshold_ms": 100}}"#).unwrap();
    request.flush().unwrap();

    let json = query_json(&[
        "--data",
        FIXTURE_JSON,
        "--request",
        request.path().to_str().unwrap(),
    ]);
    assert_eq!(json["EU"]["breaches"], 2);
    assert_eq!(json["US"]["breaches"], 0);
}

#[test]
fn test_query_text_format() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("latencia");
    cmd.args([
        "query", "--data", FIXTURE_JSON, "-r", "EU", "-t", "150", "--format", "text",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("avg_latency"))
    .stdout(predicate::str::is_match(r"EU\s+210\.000\s+300\.000\s+0\.970000\s+1").unwrap());
}

#[test]
fn test_query_missing_telemetry_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("latencia");
    cmd.args(["query", "--data", "/nonexistent/telemetry.csv", "-r", "EU"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Telemetry file not found"));
}

#[test]
fn test_query_schema_error_fails() {
    let mut data = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(data, "host,latency_ms\nweb-1,100").unwrap();
    data.flush().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("latencia");
    cmd.args(["query", "--data", data.path().to_str().unwrap(), "-r", "EU"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no region field"));
}

#[test]
fn test_query_without_regions_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("latencia");
    cmd.args(["query", "--data", FIXTURE_JSON])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No regions requested"));
}

#[test]
fn test_query_custom_rule_pack() {
    let mut data = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(data, "dc,rtt\nfra,40\nfra,60").unwrap();
    data.flush().unwrap();

    let mut rules = NamedTempFile::new().unwrap();
    writeln!(
        rules,
        "[[rule]]\nrole = \"region\"\nexact = [\"dc\"]\n\n[[rule]]\nrole = \"latency\"\nexact = [\"rtt\"]"
    )
    .unwrap();
    rules.flush().unwrap();

    let json = query_json(&[
        "--data",
        data.path().to_str().unwrap(),
        "--rules",
        rules.path().to_str().unwrap(),
        "-r",
        "FRA",
        "-t",
        "50",
    ]);
    assert_eq!(json["FRA"]["avg_latency"], 50.0);
    assert_eq!(json["FRA"]["breaches"], 1);
}

#[test]
fn test_query_settings_file() {
    let mut settings = NamedTempFile::new().unwrap();
    writeln!(settings, "[data]\npath = \"{}\"", FIXTURE_JSON).unwrap();
    settings.flush().unwrap();

    let json = query_json(&[
        "--config",
        settings.path().to_str().unwrap(),
        "-r",
        "US",
        "-t",
        "50",
    ]);
    assert_eq!(json["US"]["breaches"], 1);
}

#[test]
fn test_schema_subcommand() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("latencia");
    cmd.args(["schema", "--data", FIXTURE_MIXED])
        .assert()
        .success()
        .stdout(predicate::str::contains("records: 5"))
        .stdout(predicate::str::contains("region:  Zone"))
        .stdout(predicate::str::contains("latency: latencyMs"))
        .stdout(predicate::str::contains("uptime:  status"));
}

#[test]
fn test_schema_subcommand_synthesized_uptime() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("latencia");
    cmd.args(["schema", "--data", FIXTURE_NDJSON])
        .assert()
        .success()
        .stdout(predicate::str::contains("latency: rtt_ms"))
        .stdout(predicate::str::contains("<synthesized 1>"));
}
