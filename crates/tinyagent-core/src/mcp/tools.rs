//! MCP tools as registry handlers

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::logging::Logger;
use crate::tools::{HandlerError, HandlerResult, ToolArgs, ToolError, ToolHandler, ToolRegistry};
use crate::types::ToolSpec;

use super::client::{result_text, McpClient, McpError, McpResult};
use super::McpTool;

/// Forwards calls for one remote tool to its MCP server
pub struct McpToolHandler {
    client: Arc<McpClient>,
    tool_name: String,
}

impl McpToolHandler {
    pub fn new(client: Arc<McpClient>, tool_name: impl Into<String>) -> Self {
        Self {
            client,
            tool_name: tool_name.into(),
        }
    }
}

#[async_trait]
impl ToolHandler for McpToolHandler {
    async fn call(&self, args: &ToolArgs) -> HandlerResult {
        let result = self
            .client
            .call_tool(&self.tool_name, Value::Object(args.clone()))
            .await
            .map_err(|e| HandlerError::failed(e.to_string()))?;

        let text = result_text(&result);
        if result.is_error.unwrap_or(false) {
            return Err(HandlerError::failed(text));
        }
        Ok(text)
    }
}

/// Spec advertised for an MCP tool
pub fn spec_from_mcp(tool: &McpTool) -> ToolSpec {
    let schema = Value::Object(tool.input_schema.as_ref().clone());
    let description = tool.description.as_deref().unwrap_or_default();
    ToolSpec::from_json_schema(tool.name.to_string(), description, &schema)
}

/// Register every tool the server lists; returns how many were added
///
/// A name already taken by another tool is skipped with a warning.
pub async fn register_mcp_tools(
    registry: &ToolRegistry,
    client: Arc<McpClient>,
    logger: &Arc<dyn Logger>,
) -> McpResult<usize> {
    let tools = client.list_tools().await?;
    let source = format!("mcp:{}", client.name());

    let mut added = 0;
    for tool in &tools {
        let spec = spec_from_mcp(tool);
        let handler = Arc::new(McpToolHandler::new(Arc::clone(&client), spec.name.clone()));
        match registry.register_from(spec, handler, source.clone()) {
            Ok(()) => added += 1,
            Err(ToolError::Duplicate(name)) => {
                logger.warn(&format!("[mcp] {}: tool `{}` shadows an existing tool, skipped", source, name));
            }
            Err(e) => return Err(McpError::Protocol(e.to_string())),
        }
    }

    logger.info(&format!("[mcp] {}: registered {} of {} tools", source, added, tools.len()));
    Ok(added)
}
