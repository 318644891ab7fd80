//! Static metadata for every tool the dispatcher serves.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub read_only: bool,
    pub destructive: bool,
}

const fn entry(
    name: &'static str,
    title: &'static str,
    description: &'static str,
    read_only: bool,
) -> ToolSpec {
    ToolSpec {
        name,
        title,
        description,
        read_only,
        destructive: false,
    }
}

pub const TOOLS: &[ToolSpec] = &[
    entry(
        "create_cycle_model",
        "Create cycle model",
        "Build an engine cycle model and open a session on it",
        false,
    ),
    ToolSpec {
        name: "close_cycle_model",
        title: "Close cycle model",
        description: "Close a session and release its model",
        read_only: false,
        destructive: true,
    },
    entry(
        "get_cycle_summary",
        "Cycle summary",
        "Model name, mode, options and current variable values of a session",
        true,
    ),
    entry(
        "list_variables",
        "List variables",
        "List model inputs and outputs with filtering",
        true,
    ),
    entry("set_inputs", "Set inputs", "Set one or more model inputs", false),
    entry("get_outputs", "Get outputs", "Read one or more model outputs", true),
    entry(
        "run_cycle",
        "Run cycle",
        "Run the model (or its driver) and return selected outputs",
        false,
    ),
    entry(
        "sweep_inputs",
        "Sweep inputs",
        "Run the model over the Cartesian product of input values",
        false,
    ),
    entry(
        "compute_totals",
        "Compute totals",
        "Compute total derivatives of outputs with respect to inputs",
        false,
    ),
    entry("ping", "Ping", "Health check", true),
];

pub fn list_tools() -> &'static [ToolSpec] {
    TOOLS
}

pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut names: Vec<&str> = TOOLS.iter().map(|t| t.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), TOOLS.len());
        assert_eq!(TOOLS.len(), 10);
    }

    #[test]
    fn only_close_is_destructive() {
        let destructive: Vec<&str> = TOOLS
            .iter()
            .filter(|t| t.destructive)
            .map(|t| t.name)
            .collect();
        assert_eq!(destructive, vec!["close_cycle_model"]);
        assert!(find_tool("list_variables").unwrap().read_only);
        assert!(find_tool("nope").is_none());
    }
}
