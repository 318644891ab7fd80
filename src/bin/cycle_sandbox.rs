//! cycle-sandbox: command-line front end for engine-cycle model sessions
//!
//! ## Commands
//!
//! - **serve**: run the MCP server on stdio
//! - **tool**: dispatch a single tool call and print its response envelope
//! - **list-tools**: show the available tools and their hints
//!
//! ## Example Usage
//!
//! ```bash
//! # Serve the tools to an MCP client
//! cycle-sandbox serve
//!
//! # One-shot call
//! cycle-sandbox tool create_cycle_model --input '{"cycle_type":"turbojet","mode":"design"}'
//!
//! # Read the request from a file or stdin
//! cycle-sandbox tool ping --file -
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod sandbox_cli;

use sandbox_cli::{list::ListToolsCmd, serve::ServeCmd, tool::ToolCmd, ServerOptions};

#[derive(Parser)]
#[command(
    name = "cycle-sandbox",
    author,
    version,
    about = "Engine-cycle model sessions over MCP",
    long_about = "Create engine-cycle model sessions, set inputs, run, sweep and \
                  compute total derivatives.\n\n\
                  `serve` exposes the tools to an MCP client over stdio; `tool` runs one call."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    server: ServerOptions,

    /// Diagnostics level on stderr when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdio
    Serve(ServeCmd),

    /// Dispatch one tool call and print the response envelope
    Tool(ToolCmd),

    /// List the available tools
    ListTools(ListToolsCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        command,
        server,
        log_level,
    } = Cli::parse();
    cycle_sandbox_mcp::init_tracing(&log_level);

    match command {
        Commands::Serve(cmd) => cmd.execute(&server).await,
        Commands::Tool(cmd) => cmd.execute(&server).await,
        Commands::ListTools(cmd) => cmd.execute(),
    }
}
