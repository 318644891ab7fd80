//! Cycle Sandbox MCP
//!
//! Tool dispatch over the session layers of `cycle-sandbox-core`, a JSONL audit
//! log of every call, and an rmcp stdio server exposing the tools.

pub mod logging;
pub mod paths;
pub mod server;
pub mod state;
pub mod tools;

pub use paths::SandboxPaths;
pub use server::CycleMcpServer;
pub use state::{DispatcherConfig, ToolDispatcher, ToolResponse};

use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr diagnostics subscriber.
///
/// `RUST_LOG` wins over `default_level`. Output goes to stderr so stdout stays
/// free for the stdio transport.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
