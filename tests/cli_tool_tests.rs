use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn sandbox_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cycle-sandbox"));
    cmd.env("CYCLE_SANDBOX_HOME", home).env_remove("RUST_LOG");
    cmd
}

fn run_tool(home: &Path, name: &str, input: &Value) -> Value {
    let output = sandbox_cmd(home)
        .arg("tool")
        .arg(name)
        .arg("--input")
        .arg(input.to_string())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    serde_json::from_slice(&output).expect("valid json")
}

#[test]
fn cli_tool_creates_and_runs_a_cycle() {
    let temp = TempDir::new().expect("tempdir");

    let created = run_tool(
        temp.path(),
        "create_cycle_model",
        &json!({"cycle_type": "turbojet", "mode": "design"}),
    );
    assert_eq!(created["model_name"], "Turbojet");
    assert!(created["session_id"].as_str().is_some());
    assert!(created.get("error").is_none());

    // Each invocation is a fresh process, so the session is gone.
    let run = run_tool(
        temp.path(),
        "run_cycle",
        &json!({"session_id": created["session_id"]}),
    );
    assert_eq!(run["error"]["type"], "SessionNotFound");
}

#[test]
fn cli_tool_reports_validation_errors() {
    let temp = TempDir::new().expect("tempdir");

    let response = run_tool(temp.path(), "set_inputs", &json!({"values": {"Mach": 0.8}}));
    assert_eq!(response["error"]["type"], "ValidationError");

    let unknown = run_tool(temp.path(), "warp_drive", &json!({}));
    assert_eq!(unknown["error"]["type"], "UnknownTool");
}

#[test]
fn cli_tool_reads_input_file_and_stdin() {
    let temp = TempDir::new().expect("tempdir");
    let request = temp.path().join("ping.json");
    fs::write(&request, r#"{"message": "from file"}"#).expect("write request");

    let output = sandbox_cmd(temp.path())
        .args(["tool", "ping", "--pretty", "--file"])
        .arg(&request)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let response: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(response["message"], "from file");
    assert_eq!(response["server"], "cycle-sandbox");

    let mut child = sandbox_cmd(temp.path())
        .args(["tool", "ping", "--file", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("spawn");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(br#"{"message": "from stdin"}"#)
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success());
    let response: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(response["message"], "from stdin");
}

#[test]
fn cli_tool_rejects_malformed_json() {
    let temp = TempDir::new().expect("tempdir");
    sandbox_cmd(temp.path())
        .args(["tool", "ping", "--input", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse JSON input"));
}

#[test]
fn cli_tool_writes_audit_log_under_home() {
    let temp = TempDir::new().expect("tempdir");
    run_tool(temp.path(), "ping", &json!({}));

    let logs = temp.path().join("logs").join("mcp");
    let entries: Vec<_> = fs::read_dir(&logs)
        .expect("log dir")
        .filter_map(Result::ok)
        .collect();
    assert_eq!(entries.len(), 1);
    let line = fs::read_to_string(entries[0].path()).expect("log file");
    let record: Value = serde_json::from_str(line.trim()).expect("jsonl record");
    assert_eq!(record["tool"], "ping");
    assert_eq!(record["success"], true);

    let quiet = TempDir::new().expect("tempdir");
    sandbox_cmd(quiet.path())
        .args(["--no-audit-log", "tool", "ping"])
        .assert()
        .success();
    assert!(!quiet.path().join("logs").exists());
}

#[test]
fn cli_session_limit_flag() {
    let temp = TempDir::new().expect("tempdir");
    let output = sandbox_cmd(temp.path())
        .args(["--max-sessions", "0", "tool", "create_cycle_model", "--input"])
        .arg(json!({"cycle_type": "turbofan", "mode": "design"}).to_string())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let response: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(response["error"]["type"], "SessionLimitExceeded");
}

#[test]
fn cli_list_tools() {
    let temp = TempDir::new().expect("tempdir");
    sandbox_cmd(temp.path())
        .arg("list-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("close_cycle_model"))
        .stdout(predicate::str::contains("destructive"))
        .stdout(predicate::str::contains("compute_totals"));

    let output = sandbox_cmd(temp.path())
        .args(["list-tools", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let tools: Value = serde_json::from_slice(&output).expect("valid json");
    let tools = tools.as_array().expect("array");
    assert_eq!(tools.len(), 10);
    assert_eq!(tools[0]["name"], "create_cycle_model");
    assert!(tools.iter().any(|t| t["name"] == "ping" && t["read_only"] == true));
}
