use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;
use trdraw_core::{BlockHeader, encode_block_header, encode_record};

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("trdraw"))
}

/// One block for detector 1: pad (2, 3), a skipped run, then a single sample.
fn sample_payload() -> Vec<u8> {
    let body = [0x03, 0x04, 0x00, 0x02, 0x81, 0x10];
    let mut out = encode_block_header(&BlockHeader {
        detector: 1,
        byte_count: body.len() as u32,
        pad_count: 1,
    })
    .to_vec();
    out.extend_from_slice(&body);
    out
}

fn write_capture(dir: &Path, name: &str, payload: &[u8]) -> PathBuf {
    let mut data = encode_record("TOF", &[0xAA; 5]);
    data.extend(encode_record("TRD", payload));
    let path = dir.join(name);
    std::fs::write(&path, data).expect("write capture");
    path
}

fn sample_capture(dir: &Path) -> PathBuf {
    write_capture(dir, "run.raw", &sample_payload())
}

fn damaged_capture(dir: &Path) -> PathBuf {
    let mut payload = sample_payload();
    payload.push(0xAA);
    write_capture(dir, "damaged.raw", &payload)
}

fn stdout_json(assert: &assert_cmd::assert::Assert) -> Value {
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("valid json")
}

#[test]
fn help_lists_decode_command() {
    cmd()
        .arg("raw")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("decode"));
    cmd()
        .arg("raw")
        .arg("decode")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--time-bins"));
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.raw");
    let report = temp.path().join("report.json");

    cmd()
        .arg("raw")
        .arg("decode")
        .arg(missing)
        .arg("--time-bins")
        .arg("5")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn stdout_outputs_decoded_report() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(temp.path());

    let assert = cmd()
        .arg("raw")
        .arg("decode")
        .arg(input)
        .arg("--time-bins")
        .arg("5")
        .arg("--digits")
        .arg("--stdout")
        .assert()
        .success();
    let json = stdout_json(&assert);
    assert_eq!(json["status"], "complete");
    assert_eq!(json["subsystem"], "TRD");
    assert_eq!(json["time_bins"], 5);
    assert_eq!(json["digits_total"], 1);
    assert_eq!(json["blocks"][0]["detector"], 1);
    let digit = &json["digits"][0];
    assert_eq!(digit["row"], 2);
    assert_eq!(digit["column"], 3);
    assert_eq!(digit["time_bin"], 4);
    assert_eq!(digit["signal"], 272);
}

#[test]
fn report_file_is_written() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(temp.path());
    let report = temp.path().join("out").join("report.json");

    cmd()
        .arg("raw")
        .arg("decode")
        .arg(input)
        .arg("--time-bins")
        .arg("5")
        .arg("-o")
        .arg(&report)
        .assert()
        .success()
        .stderr(contains("OK:"));

    let text = std::fs::read_to_string(&report).expect("report");
    let json: Value = serde_json::from_str(&text).expect("valid json");
    assert_eq!(json["report_version"], 1);
    assert_eq!(json["tool"]["name"], "trdraw");
    assert!(json.get("digits").is_none());
}

#[test]
fn glob_input_resolves_single_match() {
    let temp = TempDir::new().expect("tempdir");
    sample_capture(temp.path());
    let pattern = temp.path().join("*.raw");

    cmd()
        .arg("raw")
        .arg("decode")
        .arg(pattern)
        .arg("--time-bins")
        .arg("5")
        .arg("--stdout")
        .assert()
        .success();
}

#[test]
fn glob_input_rejects_multiple_matches() {
    let temp = TempDir::new().expect("tempdir");
    sample_capture(temp.path());
    damaged_capture(temp.path());
    let pattern = temp.path().join("*.raw");

    cmd()
        .arg("raw")
        .arg("decode")
        .arg(pattern)
        .arg("--time-bins")
        .arg("5")
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("multiple files match").and(contains("hint:")));
}

#[test]
fn stdout_and_report_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(temp.path());
    let report = temp.path().join("report.json");

    cmd()
        .arg("raw")
        .arg("decode")
        .arg(input)
        .arg("--time-bins")
        .arg("5")
        .arg("--stdout")
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn pretty_and_compact_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(temp.path());
    let report = temp.path().join("report.json");

    cmd()
        .arg("raw")
        .arg("decode")
        .arg(input)
        .arg("--time-bins")
        .arg("5")
        .arg("-o")
        .arg(report)
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn quiet_suppresses_ok_message() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(temp.path());
    let report = temp.path().join("report.json");

    cmd()
        .arg("raw")
        .arg("decode")
        .arg(input)
        .arg("--time-bins")
        .arg("5")
        .arg("-o")
        .arg(report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());
}

#[test]
fn missing_time_bins_is_reported() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(temp.path());

    cmd()
        .arg("raw")
        .arg("decode")
        .arg(input)
        .arg("--stdout")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("time bins").and(contains("hint:")));
}

#[test]
fn config_file_supplies_settings() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(temp.path());
    let config = temp.path().join("decoder.json");
    std::fs::write(&config, r#"{"time_bins": 5, "include_digits": true}"#).expect("config");

    let assert = cmd()
        .arg("raw")
        .arg("decode")
        .arg(input)
        .arg("--config")
        .arg(config)
        .arg("--stdout")
        .assert()
        .success();
    let json = stdout_json(&assert);
    assert_eq!(json["time_bins"], 5);
    assert_eq!(json["digits"].as_array().map(Vec::len), Some(1));
}

#[test]
fn flags_override_config_file() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(temp.path());
    let config = temp.path().join("decoder.json");
    std::fs::write(&config, r#"{"time_bins": 30, "subsystem": "TOF"}"#).expect("config");

    let assert = cmd()
        .arg("raw")
        .arg("decode")
        .arg(input)
        .arg("--config")
        .arg(config)
        .arg("--time-bins")
        .arg("5")
        .arg("--subsystem")
        .arg("TRD")
        .arg("--stdout")
        .assert()
        .success();
    let json = stdout_json(&assert);
    assert_eq!(json["time_bins"], 5);
    assert_eq!(json["subsystem"], "TRD");
    assert_eq!(json["digits_total"], 1);
}

#[test]
fn invalid_config_file_is_rejected() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(temp.path());
    let config = temp.path().join("decoder.json");
    std::fs::write(&config, "{ not json").expect("config");

    cmd()
        .arg("raw")
        .arg("decode")
        .arg(input)
        .arg("--config")
        .arg(config)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("invalid decoder config").and(contains("hint:")));
}

#[test]
fn payload_mode_reads_bare_stream() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("payload.bin");
    std::fs::write(&input, sample_payload()).expect("payload");

    let assert = cmd()
        .arg("raw")
        .arg("decode")
        .arg(input)
        .arg("--payload")
        .arg("--time-bins")
        .arg("5")
        .arg("--stdout")
        .assert()
        .success();
    let json = stdout_json(&assert);
    assert_eq!(json["digits_total"], 1);
    assert_eq!(json["detectors"][0]["max_signal"], 272);
}

#[test]
fn aborted_stream_still_writes_report() {
    let temp = TempDir::new().expect("tempdir");
    let input = damaged_capture(temp.path());

    let assert = cmd()
        .arg("raw")
        .arg("decode")
        .arg(input)
        .arg("--time-bins")
        .arg("5")
        .arg("--stdout")
        .assert()
        .success();
    let json = stdout_json(&assert);
    assert_eq!(json["status"], "aborted");
    assert_eq!(json["digits_total"], 1);
    assert!(json["error"].as_str().unwrap().contains("wrong flag"));
}

#[test]
fn strict_fails_on_aborted_stream() {
    let temp = TempDir::new().expect("tempdir");
    let input = damaged_capture(temp.path());
    let report = temp.path().join("report.json");

    cmd()
        .arg("raw")
        .arg("decode")
        .arg(input)
        .arg("--time-bins")
        .arg("5")
        .arg("-o")
        .arg(&report)
        .arg("--strict")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("decoding stopped early"));

    assert!(report.exists());
}

#[test]
fn strict_passes_on_complete_stream() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(temp.path());

    cmd()
        .arg("raw")
        .arg("decode")
        .arg(input)
        .arg("--time-bins")
        .arg("5")
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .success();
}

#[test]
fn report_path_must_differ_from_input() {
    let temp = TempDir::new().expect("tempdir");
    let input = sample_capture(temp.path());

    cmd()
        .arg("raw")
        .arg("decode")
        .arg(&input)
        .arg("--time-bins")
        .arg("5")
        .arg("-o")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("report path must differ from input"));
}
