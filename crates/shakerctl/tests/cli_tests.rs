//! Integration tests for shakerctl
//!
//! These drive the binary end to end and check output and exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

/// Test helper to create a shakerctl command
fn shakerctl() -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("shakerctl")?;
    cmd.env_remove("SHAKERCTL_CONFIG").env_remove("RUST_LOG");
    Ok(cmd)
}

/// Write a short recording: drive off in first, shift to second, then park
fn write_recording(dir: &TempDir) -> Result<PathBuf, Box<dyn Error>> {
    let mut lines = Vec::new();
    for i in 0..30 {
        let gear = if i < 15 { 1 } else { 2 };
        lines.push(serde_json::json!({
            "speed_kmh": 40.0 + f64::from(i),
            "rpm": 3000.0 + f64::from(i) * 100.0,
            "gears": gear,
        }));
    }
    let mut text: Vec<String> = lines.iter().map(Value::to_string).collect();
    text.push(String::new());
    text.push("not json".to_string());
    text.push(serde_json::json!({ "speed_kmh": 0.0, "rpm": 900.0, "gears": 2 }).to_string());

    let path = dir.path().join("lap.jsonl");
    fs::write(&path, text.join("\n"))?;
    Ok(path)
}

fn stdout_json(output: &std::process::Output) -> Result<Value, Box<dyn Error>> {
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn test_cli_help() -> TestResult {
    shakerctl()?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bass shaker loop"));
    Ok(())
}

#[test]
fn test_cli_version() -> TestResult {
    shakerctl()?
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("shakerctl"));
    Ok(())
}

#[test]
fn test_simulate_json_summary() -> TestResult {
    let output = shakerctl()?
        .args(["simulate", "--seconds", "5", "--json"])
        .output()?;
    assert!(output.status.success());

    let json = stdout_json(&output)?;
    assert_eq!(json["success"], Value::Bool(true));
    assert_eq!(json["summary"]["stats"]["ticks"], Value::from(500));
    // Neutral to first, then second at 4 s
    assert_eq!(json["summary"]["stats"]["gear_shifts"], Value::from(2));
    assert_eq!(json["summary"]["source"], Value::from("synthetic"));
    Ok(())
}

#[test]
fn test_run_recording_human() -> TestResult {
    let dir = TempDir::new()?;
    let recording = write_recording(&dir)?;

    shakerctl()?
        .arg("run")
        .arg(&recording)
        .assert()
        .success()
        .stdout(predicate::str::contains("Shaker loop finished"))
        .stdout(predicate::str::contains("Gear shifts: 2"))
        .stdout(predicate::str::contains("Source errors: 1"));
    Ok(())
}

#[test]
fn test_run_recording_json_with_trace() -> TestResult {
    let dir = TempDir::new()?;
    let recording = write_recording(&dir)?;

    let output = shakerctl()?
        .arg("run")
        .arg(&recording)
        .args(["--json", "--trace", "--tick-ms", "20"])
        .output()?;
    assert!(output.status.success());

    let json = stdout_json(&output)?;
    let summary = &json["summary"];
    assert_eq!(summary["stats"]["ticks"], Value::from(33));
    assert_eq!(summary["stats"]["skipped"], Value::from(2));
    assert_eq!(summary["stats"]["stationary"], Value::from(1));
    assert_eq!(summary["tick_ms"], Value::from(20));

    let trace = summary["trace"].as_array().ok_or("trace missing")?;
    assert_eq!(trace.len(), 33);
    assert_eq!(trace.first().map(|t| &t["frequency_hz"]), Some(&Value::from(30)));
    assert_eq!(trace.get(15).map(|t| &t["frequency_hz"]), Some(&Value::from(30)));
    Ok(())
}

#[test]
fn test_run_with_override() -> TestResult {
    let dir = TempDir::new()?;
    let recording = write_recording(&dir)?;

    let output = shakerctl()?
        .arg("run")
        .arg(&recording)
        .args(["--json", "--trace", "--set", "gear_shift_freq=55"])
        .output()?;
    assert!(output.status.success());

    let json = stdout_json(&output)?;
    assert_eq!(json["summary"]["trace"][0]["frequency_hz"], Value::from(55));
    Ok(())
}

#[test]
fn test_run_missing_recording_exit_code() -> TestResult {
    shakerctl()?
        .args(["run", "/definitely/missing/lap.jsonl"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Telemetry file not found"));
    Ok(())
}

#[test]
fn test_run_missing_config_exit_code() -> TestResult {
    let dir = TempDir::new()?;
    let recording = write_recording(&dir)?;

    shakerctl()?
        .arg("run")
        .arg(&recording)
        .args(["--config", "/definitely/missing/shaker.yaml"])
        .assert()
        .code(3);
    Ok(())
}

#[test]
fn test_invalid_override_exit_code() -> TestResult {
    shakerctl()?
        .args(["simulate", "--seconds", "1", "--set", "base_freq=200", "--json"])
        .assert()
        .code(4)
        .stdout(predicate::str::contains("invalid_configuration"));
    Ok(())
}

#[test]
fn test_config_init_validate_set_show() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("shaker.yaml");

    shakerctl()?
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote default config"));

    shakerctl()?
        .args(["config", "validate"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));

    shakerctl()?
        .args(["config", "set"])
        .arg(&path)
        .args(["gear_shift_freq=45", "use_susp=on"])
        .assert()
        .success();

    let output = shakerctl()?
        .args(["config", "show", "--json", "--config"])
        .arg(&path)
        .output()?;
    assert!(output.status.success());
    let json = stdout_json(&output)?;
    assert_eq!(json["parameters"]["gear_shift_freq"], Value::from("45"));
    assert_eq!(json["parameters"]["use_susp"], Value::from("true"));
    assert_eq!(json["config"]["gear_shift"]["frequency_hz"], Value::from(45));
    Ok(())
}

#[test]
fn test_config_init_refuses_overwrite() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("shaker.json");

    shakerctl()?.args(["config", "init"]).arg(&path).assert().success();
    shakerctl()?
        .args(["config", "init"])
        .arg(&path)
        .assert()
        .code(5);
    shakerctl()?
        .args(["config", "init", "--force"])
        .arg(&path)
        .assert()
        .success();
    Ok(())
}

#[test]
fn test_config_set_rejects_bad_value() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("shaker.yaml");
    shakerctl()?.args(["config", "init"]).arg(&path).assert().success();

    shakerctl()?
        .args(["config", "set"])
        .arg(&path)
        .arg("rpm_divisor=0")
        .assert()
        .code(4)
        .stderr(predicate::str::contains("rpm.transfer"));

    // File is untouched
    let text = fs::read_to_string(&path)?;
    assert!(text.contains("transfer: 75"));
    Ok(())
}

#[test]
fn test_config_validate_rejects_invalid_file() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("shaker.yaml");
    fs::write(&path, "gear_shift:\n  frequency_hz: 120\n")?;

    shakerctl()?
        .args(["config", "validate"])
        .arg(&path)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("gear_shift.frequency_hz"));
    Ok(())
}

#[test]
fn test_config_show_yaml_defaults() -> TestResult {
    shakerctl()?
        .args(["config", "show", "--yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base_frequency_hz: 20"));
    Ok(())
}
