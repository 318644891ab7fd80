use anyhow::Result;
use clap::Parser;

use cycle_sandbox_mcp::tools::{list_tools, ToolSpec};

#[derive(Parser, Debug)]
pub struct ListToolsCmd {
    /// Output as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl ListToolsCmd {
    pub fn execute(&self) -> Result<()> {
        let tools = list_tools();
        if self.json {
            println!("{}", serde_json::to_string_pretty(tools)?);
            return Ok(());
        }

        let width = tools.iter().map(|t| t.name.len()).max().unwrap_or(0);
        for tool in tools {
            println!(
                "{:width$}  {:11}  {}",
                tool.name,
                hint(tool),
                tool.description,
                width = width
            );
        }
        Ok(())
    }
}

fn hint(tool: &ToolSpec) -> &'static str {
    if tool.destructive {
        "destructive"
    } else if tool.read_only {
        "read-only"
    } else {
        ""
    }
}
