//! rmcp stdio server exposing the dispatcher's tools.

use rmcp::{
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServiceExt,
};
use serde_json::Value;
use std::sync::Arc;

use crate::state::{ToolDispatcher, ToolResponse};

#[derive(Clone)]
pub struct CycleMcpServer {
    dispatcher: Arc<ToolDispatcher>,
    tool_router: ToolRouter<Self>,
}

/// Short text summary of a response; the full envelope travels as structured content.
fn summary_text(response: &ToolResponse) -> String {
    match &response.error {
        Some(err) => format!("{}: {}", err.error_type, err.message),
        None => "ok".to_string(),
    }
}

#[tool_router]
impl CycleMcpServer {
    pub fn new(dispatcher: Arc<ToolDispatcher>) -> Self {
        Self {
            dispatcher,
            tool_router: Self::tool_router(),
        }
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    async fn dispatch_tool(
        &self,
        name: &str,
        params: Parameters<Value>,
    ) -> Result<CallToolResult, McpError> {
        let response = self.dispatcher.dispatch(name, params.0).await;
        Ok(CallToolResult {
            content: vec![Content::text(summary_text(&response))],
            structured_content: Some(response.to_json()),
            is_error: Some(response.is_error()),
            meta: None,
        })
    }

    #[tool(
        name = "create_cycle_model",
        description = "Build an engine cycle model and open a session on it",
        annotations(title = "Create cycle model", read_only_hint = false, destructive_hint = false)
    )]
    async fn create_cycle_model(
        &self,
        params: Parameters<Value>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch_tool("create_cycle_model", params).await
    }

    #[tool(
        name = "close_cycle_model",
        description = "Close a session and release its model",
        annotations(title = "Close cycle model", read_only_hint = false, destructive_hint = true)
    )]
    async fn close_cycle_model(
        &self,
        params: Parameters<Value>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch_tool("close_cycle_model", params).await
    }

    #[tool(
        name = "get_cycle_summary",
        description = "Model name, mode, options and current variable values of a session",
        annotations(title = "Cycle summary", read_only_hint = true, destructive_hint = false)
    )]
    async fn get_cycle_summary(
        &self,
        params: Parameters<Value>,
    ) -> Result<CallToolResult, McpError> {
        self.dispatch_tool("get_cycle_summary", params).await
    }

    #[tool(
        name = "list_variables",
        description = "List model inputs and outputs with filtering",
        annotations(title = "List variables", read_only_hint = true, destructive_hint = false)
    )]
    async fn list_variables(&self, params: Parameters<Value>) -> Result<CallToolResult, McpError> {
        self.dispatch_tool("list_variables", params).await
    }

    #[tool(
        name = "set_inputs",
        description = "Set one or more model inputs",
        annotations(title = "Set inputs", read_only_hint = false, destructive_hint = false)
    )]
    async fn set_inputs(&self, params: Parameters<Value>) -> Result<CallToolResult, McpError> {
        self.dispatch_tool("set_inputs", params).await
    }

    #[tool(
        name = "get_outputs",
        description = "Read one or more model outputs",
        annotations(title = "Get outputs", read_only_hint = true, destructive_hint = false)
    )]
    async fn get_outputs(&self, params: Parameters<Value>) -> Result<CallToolResult, McpError> {
        self.dispatch_tool("get_outputs", params).await
    }

    #[tool(
        name = "run_cycle",
        description = "Run the model (or its driver) and return selected outputs",
        annotations(title = "Run cycle", read_only_hint = false, destructive_hint = false)
    )]
    async fn run_cycle(&self, params: Parameters<Value>) -> Result<CallToolResult, McpError> {
        self.dispatch_tool("run_cycle", params).await
    }

    #[tool(
        name = "sweep_inputs",
        description = "Run the model over the Cartesian product of input values",
        annotations(title = "Sweep inputs", read_only_hint = false, destructive_hint = false)
    )]
    async fn sweep_inputs(&self, params: Parameters<Value>) -> Result<CallToolResult, McpError> {
        self.dispatch_tool("sweep_inputs", params).await
    }

    #[tool(
        name = "compute_totals",
        description = "Compute total derivatives of outputs with respect to inputs",
        annotations(title = "Compute totals", read_only_hint = false, destructive_hint = false)
    )]
    async fn compute_totals(&self, params: Parameters<Value>) -> Result<CallToolResult, McpError> {
        self.dispatch_tool("compute_totals", params).await
    }

    #[tool(
        name = "ping",
        description = "Health check",
        annotations(title = "Ping", read_only_hint = true, destructive_hint = false)
    )]
    async fn ping(&self, params: Parameters<Value>) -> Result<CallToolResult, McpError> {
        self.dispatch_tool("ping", params).await
    }
}

#[tool_handler]
impl rmcp::ServerHandler for CycleMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "cycle-sandbox MCP server. Open a session with create_cycle_model, then use \
                 set_inputs, run_cycle, sweep_inputs and compute_totals on its session_id."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Serve the tools over stdio until the client disconnects.
pub async fn serve_stdio(dispatcher: Arc<ToolDispatcher>) -> anyhow::Result<()> {
    tracing::info!("serving MCP tools on stdio");
    let server = CycleMcpServer::new(dispatcher);
    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;
    tracing::info!("MCP client disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_names_the_error() {
        assert_eq!(
            summary_text(&ToolResponse::error("ValidationError", "bad")),
            "ValidationError: bad"
        );
        assert_eq!(summary_text(&ToolResponse::default()), "ok");
    }

    #[test]
    fn router_lists_every_registered_tool() {
        let tools = CycleMcpServer::tool_router().list_all();
        assert_eq!(tools.len(), crate::tools::list_tools().len());
        for spec in crate::tools::list_tools() {
            let tool = tools
                .iter()
                .find(|t| t.name == spec.name)
                .unwrap_or_else(|| panic!("missing {}", spec.name));
            assert_eq!(tool.description.as_deref(), Some(spec.description));
            let annotations = tool.annotations.as_ref().unwrap();
            assert_eq!(annotations.title.as_deref(), Some(spec.title), "{}", spec.name);
            assert_eq!(annotations.read_only_hint, Some(spec.read_only), "{}", spec.name);
            assert_eq!(annotations.destructive_hint, Some(spec.destructive), "{}", spec.name);
        }

        let close = tools.iter().find(|t| t.name == "close_cycle_model").unwrap();
        let hints = close.annotations.as_ref().unwrap();
        assert_eq!(hints.destructive_hint, Some(true));
        assert_eq!(hints.read_only_hint, Some(false));
        let ping = tools.iter().find(|t| t.name == "ping").unwrap();
        assert_eq!(ping.annotations.as_ref().unwrap().read_only_hint, Some(true));
    }
}
