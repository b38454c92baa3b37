//! MCP (Model Context Protocol) tool source
//!
//! Uses the official rmcp SDK to connect to MCP servers over Unix socket,
//! HTTP or a child process's stdio, then registers each listed tool as a handler that forwards calls.
//!
//! # Example
//!
//! ```rust,ignore
//! use tinyagent_core::mcp::{register_mcp_tools, McpClient};
//! use std::sync::Arc;
//!
//! let client = Arc::new(McpClient::connect_http("browser", "http://localhost:8931/mcp", logger.clone()).await?);
//! let added = register_mcp_tools(&registry, client, &logger).await?;
//! ```

mod client;
mod tools;

pub use client::{result_text, McpClient, McpError, McpResult};
pub use tools::{register_mcp_tools, spec_from_mcp, McpToolHandler};

// Re-export rmcp types that consumers might need
pub use rmcp::model::{CallToolResult as McpToolResult, Tool as McpTool};
