use serde_json::{json, Value};
use std::path::Path;

use cycle_sandbox_mcp::logging::{redact_sensitive, LogConfig, LogRecord, McpLogger};
use cycle_sandbox_mcp::{DispatcherConfig, SandboxPaths, ToolDispatcher};

fn read_records(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn record(tool: &str) -> LogRecord {
    LogRecord {
        ts: "2026-01-01T00:00:00Z".to_string(),
        request_id: "r-1".to_string(),
        tool: tool.to_string(),
        input: json!({}),
        output: json!({"status": "ok"}),
        duration_ms: 1,
        success: true,
        error: None,
        session_id: None,
        llm_reason: None,
        tags: None,
    }
}

#[tokio::test]
async fn test_dispatch_writes_one_record_per_call() {
    let home = tempfile::tempdir().unwrap();
    let logs = home.path().join("logs");
    let dispatcher =
        ToolDispatcher::with_config(DispatcherConfig::default().with_log(LogConfig::at(&logs)));

    let created = dispatcher
        .dispatch(
            "create_cycle_model",
            json!({
                "cycle_type": "turboshaft",
                "mode": "design",
                "_meta": {"reason": "size the engine", "request_id": "req-7", "tags": ["demo"]}
            }),
        )
        .await;
    let session_id = created.get("session_id").and_then(Value::as_str).unwrap();
    dispatcher
        .dispatch("run_cycle", json!({"session_id": "missing"}))
        .await;

    let file = dispatcher.logger().current_file().unwrap();
    assert!(file.starts_with(&logs));
    let records = read_records(&file);
    assert_eq!(records.len(), 2);

    assert_eq!(records[0]["tool"], "create_cycle_model");
    assert_eq!(records[0]["request_id"], "req-7");
    assert_eq!(records[0]["llm_reason"], "size the engine");
    assert_eq!(records[0]["tags"], json!(["demo"]));
    assert_eq!(records[0]["session_id"], session_id);
    assert_eq!(records[0]["success"], true);
    assert!(records[0]["input"].get("_meta").is_none());

    assert_eq!(records[1]["success"], false);
    assert_eq!(records[1]["session_id"], "missing");
    assert!(records[1]["error"]
        .as_str()
        .unwrap()
        .starts_with("SessionNotFound: "));
    assert!(!records[1]["request_id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_disabled_log_writes_nothing() {
    let home = tempfile::tempdir().unwrap();
    let logs = home.path().join("logs");
    let mut log = LogConfig::at(&logs);
    log.enabled = false;
    let dispatcher = ToolDispatcher::with_config(DispatcherConfig::default().with_log(log));

    let response = dispatcher.dispatch("ping", json!({})).await;
    assert!(response.is_ok());
    assert!(dispatcher.logger().current_file().is_none());
    assert!(!logs.exists());
}

#[test]
fn test_logger_rotates_to_a_new_file() {
    let home = tempfile::tempdir().unwrap();
    let mut config = LogConfig::at(home.path());
    config.rotation_mb = 0;
    let logger = McpLogger::new(config);

    logger.log_tool_call(&record("ping")).unwrap();
    let first = logger.current_file().unwrap();
    assert_eq!(read_records(&first).len(), 1);

    logger.log_tool_call(&record("ping")).unwrap();
    let second = logger.current_file().unwrap();
    assert_ne!(first, second);
    assert_eq!(read_records(&second).len(), 1);
}

#[test]
fn test_update_config_redirects_output() {
    let home = tempfile::tempdir().unwrap();
    let logger = McpLogger::new(LogConfig::at(home.path().join("a")));
    logger.log_tool_call(&record("ping")).unwrap();

    logger.update_config(LogConfig::at(home.path().join("b")));
    assert!(logger.current_file().is_none());
    logger.log_tool_call(&record("ping")).unwrap();
    assert!(logger
        .current_file()
        .unwrap()
        .starts_with(home.path().join("b")));
}

#[test]
fn test_redaction_matches_key_suffixes() {
    let redacted = redact_sensitive(&json!({
        "api_key": "abc",
        "key_inputs": [{"name": "Mach"}],
        "nested": {"authToken": "t", "items": [{"password": "p"}]},
        "values": {"Mach": 0.8}
    }));
    assert_eq!(redacted["api_key"], "***redacted***");
    assert_eq!(redacted["key_inputs"], json!([{"name": "Mach"}]));
    assert_eq!(redacted["nested"]["authToken"], "***redacted***");
    assert_eq!(redacted["nested"]["items"][0]["password"], "***redacted***");
    assert_eq!(redacted["values"]["Mach"], 0.8);
}

#[test]
fn test_paths_layout() {
    let home = tempfile::tempdir().unwrap();
    let paths = SandboxPaths::from_base(home.path());
    assert_eq!(paths.base_dir(), home.path());
    assert_eq!(paths.logs_dir(), home.path().join("logs").join("mcp"));
    assert_eq!(paths.definitions_dir(), home.path().join("cycles"));

    paths.ensure().unwrap();
    assert!(paths.logs_dir().is_dir());
    assert!(paths.definitions_dir().is_dir());
}
