//! Integration tests for the wasmtx CLI
//!
//! These tests invoke the built binary and verify:
//! - Exit codes (0 = success, 1 = rejected or failed, 2 = error)
//! - stdout/stderr output
//! - JSON output format

use std::path::PathBuf;
use std::process::Command;

// ── Helpers ───────────────────────────────────────────────

fn wasmtx_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_wasmtx"))
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join(format!("../../tests/fixtures/{}", name))
        .to_string_lossy()
        .into_owned()
}

fn run_wasmtx(args: &[&str]) -> std::process::Output {
    Command::new(wasmtx_bin())
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute wasmtx")
}

fn check(tx: &str, extra: &[&str]) -> std::process::Output {
    let tx = fixture(tx);
    let state = fixture("state.json");
    let mut args = vec!["check", "--tx", tx.as_str(), "--state", state.as_str()];
    args.extend_from_slice(extra);
    run_wasmtx(&args)
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("should be valid JSON")
}

// ── Version ───────────────────────────────────────────────

#[test]
fn test_version_command() {
    let output = run_wasmtx(&["version"]);
    assert!(output.status.success(), "version should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("wasmtx"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
    assert!(stdout.contains(&format!("(wasmtx-core {})", wasmtx_core::VERSION)));
}

#[test]
fn test_version_flag() {
    let output = run_wasmtx(&["--version"]);
    assert!(output.status.success(), "--version should exit 0");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

// ── Check ─────────────────────────────────────────────────

#[test]
fn test_check_accepts_self_authorized_transfer() {
    let output = check("tx_transfer.json", &[]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("accepted"));
}

#[test]
fn test_check_verbose_logs_to_stderr() {
    let output = check("tx_transfer.json", &["-v"]);
    assert_eq!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("inputs loaded"));
    assert!(stderr.contains("admitting transaction"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("accepted"));
}

#[test]
fn test_check_rejection_logged_only_at_trace() {
    let output = check("tx_bad_auth.json", &["-v"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!String::from_utf8_lossy(&output.stderr).contains("transaction rejected"));

    let output = check("tx_bad_auth.json", &["-vv"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("transaction rejected"));
}

#[test]
fn test_check_json_accepted() {
    let output = check("tx_transfer.json", &["--json"]);
    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["accepted"], true);
    assert_eq!(json["txid"].as_str().unwrap().len(), 64);
    assert!(json.get("kind").is_none());
}

#[test]
fn test_check_rejects_foreign_authorization() {
    let output = check("tx_bad_auth.json", &["--json"]);
    assert_eq!(output.status.code(), Some(1));
    let json = stdout_json(&output);
    assert_eq!(json["accepted"], false);
    assert_eq!(json["kind"], "AuthorizationDenied");
    assert_eq!(json["code"], 3_050_007);
    assert_eq!(json["dos_level"], 100);
}

#[test]
fn test_check_rejects_missing_contract() {
    let output = check("tx_missing_contract.json", &["--json"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["kind"], "ContractNotFound");
}

#[test]
fn test_check_rejects_incomplete_contract() {
    let output = check("tx_incomplete_contract.json", &["--json"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["kind"], "ContractIncomplete");
}

#[test]
fn test_check_rejects_empty_transaction() {
    let output = check("tx_empty.json", &["--json"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["kind"], "MalformedTransaction");
}

#[test]
fn test_check_uses_config_fee_schedule() {
    let config = fixture("config.json");
    let output = check("tx_transfer.json", &["--config", &config, "--json"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["kind"], "InsufficientFee");

    let output = check("tx_transfer.json", &["--config", &config, "--height", "40", "--json"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_check_height_outside_window() {
    let output = check("tx_transfer.json", &["--height", "5000", "--json"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["kind"], "InvalidEnvelope");
}

#[test]
fn test_check_quiet() {
    let output = check("tx_transfer.json", &["--quiet"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty(), "quiet mode should produce no stdout");

    let output = check("tx_bad_auth.json", &["--quiet"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
}

#[test]
fn test_check_missing_file() {
    let state = fixture("state.json");
    let output = run_wasmtx(&["check", "--tx", "nonexistent.json", "--state", &state]);
    assert_eq!(output.status.code(), Some(2), "missing file should exit 2");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "should mention error");
}

#[test]
fn test_check_malformed_state() {
    let tx = fixture("tx_transfer.json");
    let output = run_wasmtx(&["check", "--tx", &tx, "--state", &tx]);
    assert_eq!(output.status.code(), Some(2));
}

// ── Execute ───────────────────────────────────────────────

#[test]
fn test_execute_prints_decoded_trace() {
    let tx = fixture("tx_transfer.json");
    let state = fixture("state.json");
    let script = fixture("scripts.json");
    let output = run_wasmtx(&["execute", "--tx", &tx, "--state", &state, "--script", &script]);
    assert_eq!(output.status.code(), Some(0));

    let trace = stdout_json(&output);
    let top = &trace["traces"][0];
    assert_eq!(top["receiver"], "token");
    assert_eq!(top["console"], "transfer 1.2345 WICC");
    assert_eq!(top["trx"]["data"]["quantity"], "1.2345 WICC");
    assert_eq!(top["trx"]["data"]["memo"], "rent");
    assert_eq!(
        top["trx"]["authorization"],
        serde_json::json!([{"account": "alice", "permission": "active"}])
    );

    let notified = top["inline_traces"].as_array().unwrap();
    assert_eq!(notified.len(), 2);
    assert_eq!(notified[0]["receiver"], "alice");
    assert_eq!(notified[1]["receiver"], "bob");
    assert_eq!(notified[1]["console"], "bob received");
    assert!(notified[1].get("inline_traces").is_none());
}

#[test]
fn test_execute_without_script() {
    let tx = fixture("tx_transfer.json");
    let state = fixture("state.json");
    let output = run_wasmtx(&["execute", "--tx", &tx, "--state", &state]);
    assert_eq!(output.status.code(), Some(0));
    let trace = stdout_json(&output);
    assert_eq!(trace["traces"][0]["console"], "");
}

#[test]
fn test_execute_engine_failure() {
    let tx = fixture("tx_transfer.json");
    let state = fixture("state.json");
    let script = fixture("scripts_fail.json");
    let output = run_wasmtx(&["execute", "--tx", &tx, "--state", &state, "--script", &script]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3080004"));
    assert!(stdout.contains("overdrawn balance"));
}

#[test]
fn test_execute_rejected_before_running() {
    let tx = fixture("tx_bad_auth.json");
    let state = fixture("state.json");
    let output = run_wasmtx(&["execute", "--tx", &tx, "--state", &state]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("rejected"));
}

// ── Show / Hash / Name ────────────────────────────────────

#[test]
fn test_show_summary() {
    let tx = fixture("tx_transfer.json");
    let state = fixture("state.json");
    let output = run_wasmtx(&["show", "--tx", &tx, "--state", &state]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("txType=WASM_CONTRACT_TX"));
    assert!(stdout.contains("sender=alice"));
}

#[test]
fn test_show_json() {
    let tx = fixture("tx_transfer.json");
    let state = fixture("state.json");
    let output = run_wasmtx(&["show", "--tx", &tx, "--state", &state, "--json"]);
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["contract"], "token");
    assert_eq!(json["action"], "transfer");
    assert_eq!(json["addr"], "0101010101010101010101010101010101010101");
}

#[test]
fn test_hash_matches_check() {
    let tx = fixture("tx_transfer.json");
    let output = run_wasmtx(&["hash", "--tx", &tx]);
    assert!(output.status.success());
    let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
    assert_eq!(hash.len(), 64);

    let checked = stdout_json(&check("tx_transfer.json", &["--json"]));
    assert_eq!(checked["txid"], hash.as_str());
}

#[test]
fn test_name_conversion() {
    let output = run_wasmtx(&["name", "alice"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "3773036822876127232");

    let output = run_wasmtx(&["name", "16262822954083344384"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "wasmio.bank");
}

#[test]
fn test_name_invalid() {
    let output = run_wasmtx(&["name", "Not_A_Name"]);
    assert_eq!(output.status.code(), Some(2));
}
