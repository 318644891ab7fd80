//! Types shared by the CLI and MCP front ends.

pub mod response;

pub use response::{extract_input, ErrorBody, ToolMeta, ToolResponse};
