//! MCP tool implementations, split into logical modules.
//!
//! - `inputs`: request structs, one per tool
//! - `handlers`: dispatcher methods that parse a request and call the core layers
//! - `registry`: static tool metadata (title, read-only and destructive hints)

pub(crate) mod handlers;
pub mod inputs;
pub mod registry;

pub use handlers::SERVER_NAME;
pub use registry::{find_tool, list_tools, ToolSpec};
