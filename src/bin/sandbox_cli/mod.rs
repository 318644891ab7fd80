//! CLI subcommand implementations for cycle-sandbox

pub mod list;
pub mod serve;
pub mod tool;

use clap::Args;

use cycle_sandbox_mcp::{DispatcherConfig, ToolDispatcher};

/// Dispatcher settings shared by `serve` and `tool`.
#[derive(Args, Debug, Clone, Default)]
pub struct ServerOptions {
    /// Maximum number of live sessions (overrides CYCLE_SANDBOX_MAX_SESSIONS)
    #[arg(long, global = true)]
    pub max_sessions: Option<usize>,

    /// Do not write the JSONL tool-call log
    #[arg(long, global = true)]
    pub no_audit_log: bool,
}

impl ServerOptions {
    pub fn config(&self) -> DispatcherConfig {
        let mut config = DispatcherConfig::from_env();
        if let Some(max) = self.max_sessions {
            config = config.with_max_sessions(max);
        }
        if self.no_audit_log {
            config.log.enabled = false;
        }
        config
    }

    pub fn dispatcher(&self) -> ToolDispatcher {
        ToolDispatcher::with_config(self.config())
    }
}
