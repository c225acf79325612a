//! MCP (Model Context Protocol) surface for the pgops tools

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use pgops_exec::SqlDriver;
use rust_mcp_schema::{
    schema_utils::CallToolError, CallToolRequest, CallToolResult, ContentBlock, Implementation,
    InitializeResult, ListToolsRequest, ListToolsResult, RpcError, ServerCapabilities,
    ServerCapabilitiesTools, TextContent, Tool, ToolInputSchema, LATEST_PROTOCOL_VERSION,
};
use rust_mcp_sdk::{mcp_server::ServerHandler, McpServer};
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::tools::{self, ToolError, ToolSpec};

/// Routes MCP tool calls to the engine through one shared driver
pub struct PgOpsServerHandler {
    driver: Arc<dyn SqlDriver>,
}

impl PgOpsServerHandler {
    pub fn new(driver: Arc<dyn SqlDriver>) -> Self {
        Self { driver }
    }

    pub fn server_info() -> InitializeResult {
        InitializeResult {
            protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools { list_changed: None }),
                ..Default::default()
            },
            server_info: Implementation {
                name: "pgops-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("PostgreSQL and pgvector Operations Server".to_string()),
            },
            instructions: Some(
                "pgops - schema management, CRUD and pgvector similarity search for PostgreSQL. \
                 Every tool answers with a JSON result whose 'success' field tells whether it worked."
                    .to_string(),
            ),
            meta: None,
        }
    }

    fn tools(&self) -> Vec<Tool> {
        tools::list_tools(self.driver.read_only())
            .iter()
            .map(to_mcp_tool)
            .collect()
    }
}

fn to_mcp_tool(spec: &ToolSpec) -> Tool {
    let properties: HashMap<String, Map<String, Value>> = spec
        .properties
        .iter()
        .filter_map(|(name, schema)| match schema {
            Value::Object(schema) => Some((name.clone(), schema.clone())),
            _ => None,
        })
        .collect();

    Tool {
        name: spec.name.to_string(),
        description: Some(spec.description.to_string()),
        input_schema: ToolInputSchema::new(
            spec.required.iter().map(|s| s.to_string()).collect(),
            Some(properties),
        ),
        title: None,
        annotations: None,
        meta: None,
        output_schema: None,
    }
}

/// Pretty JSON text content, flagged as an error when the operation failed
fn to_call_result(result: &Value) -> Result<CallToolResult, CallToolError> {
    let text = serde_json::to_string_pretty(result)
        .map_err(|e| CallToolError::from_message(format!("Failed to serialize result: {}", e)))?;
    let failed = result.get("success").and_then(Value::as_bool) == Some(false);

    Ok(CallToolResult {
        content: vec![ContentBlock::TextContent(TextContent::new(text, None, None))],
        is_error: failed.then_some(true),
        meta: None,
        structured_content: None,
    })
}

#[async_trait]
impl ServerHandler for PgOpsServerHandler {
    async fn handle_list_tools_request(
        &self,
        _request: ListToolsRequest,
        _runtime: Arc<dyn McpServer>,
    ) -> std::result::Result<ListToolsResult, RpcError> {
        info!("Listing available tools");

        Ok(ListToolsResult {
            tools: self.tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn handle_call_tool_request(
        &self,
        request: CallToolRequest,
        _runtime: Arc<dyn McpServer>,
    ) -> std::result::Result<CallToolResult, CallToolError> {
        let name = request.params.name.clone();
        let arguments = request.params.arguments.map(Value::Object).unwrap_or(Value::Null);

        match tools::call_tool(self.driver.as_ref(), &name, arguments).await {
            Ok(result) => to_call_result(&result),
            Err(ToolError::UnknownTool(name)) => Err(CallToolError::unknown_tool(name)),
            Err(e) => {
                error!("Tool {} failed: {}", name, e);
                Err(CallToolError::from_message(e.to_string()))
            }
        }
    }
}
