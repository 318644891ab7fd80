use clap::Parser;
use std::sync::Arc;

use cycle_sandbox_mcp::paths::default_paths;
use cycle_sandbox_mcp::{init_tracing, server, DispatcherConfig, ToolDispatcher};

#[derive(Parser, Debug)]
#[command(
    name = "cycle-sandbox-mcp",
    version,
    about = "MCP stdio server for engine-cycle model sessions"
)]
struct Args {
    /// Maximum number of live sessions (overrides CYCLE_SANDBOX_MAX_SESSIONS)
    #[arg(long)]
    max_sessions: Option<usize>,

    /// Diagnostics level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Do not write the JSONL tool-call log
    #[arg(long)]
    no_audit_log: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);
    if let Err(e) = default_paths().ensure() {
        tracing::warn!(error = %e, "sandbox home is not writable");
    }

    let mut config = DispatcherConfig::from_env();
    if let Some(max) = args.max_sessions {
        config = config.with_max_sessions(max);
    }
    if args.no_audit_log {
        config.log.enabled = false;
    }

    let dispatcher = ToolDispatcher::with_config(config);
    server::serve_stdio(Arc::new(dispatcher)).await
}
