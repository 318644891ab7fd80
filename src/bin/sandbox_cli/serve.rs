use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use cycle_sandbox_mcp::paths::default_paths;
use cycle_sandbox_mcp::server;

use super::ServerOptions;

#[derive(Parser, Debug)]
pub struct ServeCmd {}

impl ServeCmd {
    pub async fn execute(&self, options: &ServerOptions) -> Result<()> {
        if let Err(e) = default_paths().ensure() {
            tracing::warn!(error = %e, "sandbox home is not writable");
        }
        server::serve_stdio(Arc::new(options.dispatcher())).await
    }
}
