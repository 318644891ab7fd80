//! JSONL audit log of tool calls.
//!
//! Each dispatched call appends one [`LogRecord`] line to
//! `<logs_dir>/mcp-<timestamp>.jsonl`. A new file is started once the current
//! one reaches `rotation_mb`.

use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::paths::default_paths;

const REDACTED: &str = "***redacted***";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub rotation_mb: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::at(default_paths().logs_dir())
    }
}

impl LogConfig {
    /// Enabled logging into `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            path: path.into(),
            rotation_mb: 50,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct OpenLog {
    file: Option<File>,
    path: Option<PathBuf>,
}

#[derive(Debug)]
pub struct McpLogger {
    config: Mutex<LogConfig>,
    current: Mutex<OpenLog>,
}

impl McpLogger {
    pub fn new(config: LogConfig) -> Self {
        Self {
            config: Mutex::new(config),
            current: Mutex::new(OpenLog::default()),
        }
    }

    pub fn config(&self) -> LogConfig {
        self.config.lock().clone()
    }

    /// Replace the config; the next record opens a fresh file.
    pub fn update_config(&self, config: LogConfig) {
        *self.config.lock() = config;
        *self.current.lock() = OpenLog::default();
    }

    /// File the most recent record went to, if any.
    pub fn current_file(&self) -> Option<PathBuf> {
        self.current.lock().path.clone()
    }

    pub fn log_tool_call(&self, record: &LogRecord) -> Result<()> {
        let config = self.config();
        if !config.enabled {
            return Ok(());
        }

        fs::create_dir_all(&config.path)
            .with_context(|| format!("Failed to create log dir {}", config.path.display()))?;

        let mut current = self.current.lock();
        if needs_rotation(current.path.as_deref(), config.rotation_mb) {
            *current = OpenLog::default();
        }
        if current.file.is_none() {
            let path = next_log_path(&config.path);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            current.file = Some(file);
            current.path = Some(path);
        }

        if let Some(file) = current.file.as_mut() {
            let line = serde_json::to_string(record)?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

fn needs_rotation(path: Option<&Path>, rotation_mb: u64) -> bool {
    path.and_then(|p| fs::metadata(p).ok())
        .map(|meta| meta.len() / (1024 * 1024) >= rotation_mb)
        .unwrap_or(false)
}

fn next_log_path(dir: &Path) -> PathBuf {
    let ts = Utc::now().format("%Y%m%d-%H%M%S");
    let mut path = dir.join(format!("mcp-{}.jsonl", ts));
    let mut seq = 1;
    while path.exists() {
        path = dir.join(format!("mcp-{}-{}.jsonl", ts, seq));
        seq += 1;
    }
    path
}

/// One tool call as written to the audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub ts: String,
    pub request_id: String,
    pub tool: String,
    pub input: Value,
    pub output: Value,
    pub duration_ms: u128,
    pub success: bool,
    pub error: Option<String>,
    pub session_id: Option<String>,
    pub llm_reason: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Replace values under credential-looking keys (`api_key`, `auth_token`,
/// `password`, ...) at any depth.
pub fn redact_sensitive(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (k, v) in map {
                let replacement = if is_sensitive_key(k) {
                    Value::String(REDACTED.to_string())
                } else {
                    redact_sensitive(v)
                };
                redacted.insert(k.clone(), replacement);
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive).collect()),
        _ => value.clone(),
    }
}

// Suffix match: `api_key` is sensitive, `key_inputs` is not.
fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_lowercase();
    ["key", "token", "secret", "password"]
        .iter()
        .any(|needle| key.ends_with(needle))
}
