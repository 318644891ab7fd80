use crate::logging::{redact_sensitive, LogConfig, LogRecord, McpLogger};
use crate::paths::default_paths;
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use cycle_sandbox_core::builder::BuilderRegistry;
use cycle_sandbox_core::session::{SessionStore, DEFAULT_MAX_SESSIONS};
use cycle_sandbox_core::ToolError;

// Re-export shared types for use by tools
pub use cycle_sandbox_core::shared::{ToolMeta, ToolResponse};

/// Environment variable capping live sessions.
pub const MAX_SESSIONS_ENV: &str = "CYCLE_SANDBOX_MAX_SESSIONS";

/// Environment variable toggling the audit log (`0` disables it).
pub const AUDIT_LOG_ENV: &str = "CYCLE_SANDBOX_LOG";

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub max_sessions: usize,
    pub definitions_dir: PathBuf,
    pub log: LogConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            definitions_dir: default_paths().definitions_dir(),
            log: LogConfig::default(),
        }
    }
}

impl DispatcherConfig {
    /// Defaults overridden by `CYCLE_SANDBOX_MAX_SESSIONS` and `CYCLE_SANDBOX_LOG`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(max) = std::env::var(MAX_SESSIONS_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            config.max_sessions = max;
        }
        if std::env::var(AUDIT_LOG_ENV)
            .map(|v| v.trim() == "0")
            .unwrap_or(false)
        {
            config.log.enabled = false;
        }
        config
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    pub fn with_definitions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.definitions_dir = dir.into();
        self
    }

    pub fn with_log(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }
}

/// Routes tool calls to the session layers and records each call.
pub struct ToolDispatcher {
    sessions: Arc<SessionStore>,
    builders: Arc<BuilderRegistry>,
    pub logger: McpLogger,
}

impl Default for ToolDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolDispatcher {
    /// Dispatcher configured from the environment, with the stock cycle templates.
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::from_env())
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        Self::with_builders(config, BuilderRegistry::with_templates())
    }

    /// Use a custom builder registry, e.g. one with engine adapters registered.
    pub fn with_builders(config: DispatcherConfig, builders: BuilderRegistry) -> Self {
        let builders = builders.with_definitions_dir(config.definitions_dir.clone());
        Self {
            sessions: Arc::new(SessionStore::new(config.max_sessions)),
            builders: Arc::new(builders),
            logger: McpLogger::new(config.log),
        }
    }

    pub fn logger(&self) -> &McpLogger {
        &self.logger
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn builders(&self) -> &BuilderRegistry {
        &self.builders
    }

    /// Run a session operation on the blocking pool.
    ///
    /// Model work can be long (sweeps especially). A panicking model surfaces
    /// as `InternalError`.
    pub(crate) async fn blocking<T, F>(&self, op: F) -> ToolResponse
    where
        T: Serialize + Send + 'static,
        F: FnOnce(&SessionStore, &BuilderRegistry) -> Result<T, ToolError> + Send + 'static,
    {
        let sessions = Arc::clone(&self.sessions);
        let builders = Arc::clone(&self.builders);
        match tokio::task::spawn_blocking(move || op(&sessions, &builders)).await {
            Ok(result) => ToolResponse::from(result),
            Err(e) => ToolError::internal(format!("Tool task failed: {}", e)).into(),
        }
    }

    pub async fn dispatch(&self, tool: &str, input: Value) -> ToolResponse {
        let (meta, clean_input) = extract_meta(&input);
        let request_id = meta
            .request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        tracing::debug!(tool, request_id = %request_id, "tool call");
        let start = Instant::now();

        let result = self.dispatch_inner(tool, clean_input.clone()).await;

        let duration_ms = start.elapsed().as_millis();
        if let Some(err) = &result.error {
            tracing::debug!(
                tool,
                error_type = %err.error_type,
                message = %err.message,
                "tool failed"
            );
        }
        let record = LogRecord {
            ts: Utc::now().to_rfc3339(),
            request_id,
            tool: tool.to_string(),
            input: redact_sensitive(&clean_input),
            output: redact_sensitive(&result.to_json()),
            duration_ms,
            success: result.is_ok(),
            error: result
                .error
                .as_ref()
                .map(|e| format!("{}: {}", e.error_type, e.message)),
            session_id: session_of(&clean_input, &result),
            llm_reason: meta.reason.clone(),
            tags: meta.tags.clone(),
        };
        if let Err(e) = self.logger.log_tool_call(&record) {
            tracing::warn!(error = %e, "failed to write tool call log");
        }

        result
    }

    async fn dispatch_inner(&self, tool: &str, input: Value) -> ToolResponse {
        match tool {
            "create_cycle_model" => self.create_cycle_model(input).await,
            "close_cycle_model" => self.close_cycle_model(input).await,
            "get_cycle_summary" => self.get_cycle_summary(input).await,
            "list_variables" => self.list_variables(input).await,
            "set_inputs" => self.set_inputs(input).await,
            "get_outputs" => self.get_outputs(input).await,
            "run_cycle" => self.run_cycle(input).await,
            "sweep_inputs" => self.sweep_inputs(input).await,
            "compute_totals" => self.compute_totals(input).await,
            "ping" => self.ping(input).await,
            _ => ToolError::unknown_tool(tool).into(),
        }
    }
}

/// Split `_meta` off a request. A missing payload becomes an empty object.
fn extract_meta(input: &Value) -> (ToolMeta, Value) {
    let mut meta = ToolMeta::default();
    let map = match input {
        Value::Null => return (meta, Value::Object(Map::new())),
        Value::Object(map) => map,
        other => return (meta, other.clone()),
    };

    if let Some(Value::Object(meta_map)) = map.get("_meta") {
        meta.reason = meta_map
            .get("reason")
            .and_then(Value::as_str)
            .map(str::to_string);
        meta.request_id = meta_map
            .get("request_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(Value::Array(tags)) = meta_map.get("tags") {
            let parsed: Vec<String> = tags
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect();
            if !parsed.is_empty() {
                meta.tags = Some(parsed);
            }
        }
    }

    let mut cleaned = map.clone();
    cleaned.remove("_meta");
    (meta, Value::Object(cleaned))
}

fn session_of(input: &Value, result: &ToolResponse) -> Option<String> {
    input
        .get("session_id")
        .or_else(|| result.get("session_id"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meta_is_stripped() {
        let (meta, clean) = extract_meta(&json!({
            "session_id": "abc",
            "_meta": {"reason": "checking", "request_id": "r-1", "tags": ["a", 3]}
        }));
        assert_eq!(clean, json!({"session_id": "abc"}));
        assert_eq!(meta.reason.as_deref(), Some("checking"));
        assert_eq!(meta.request_id.as_deref(), Some("r-1"));
        assert_eq!(meta.tags, Some(vec!["a".to_string()]));
    }

    #[test]
    fn null_input_becomes_empty_object() {
        let (meta, clean) = extract_meta(&Value::Null);
        assert_eq!(clean, json!({}));
        assert!(meta.reason.is_none());
    }
}
