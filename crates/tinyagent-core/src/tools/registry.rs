//! Tool registry
//!
//! The ToolRegistry is the central component for:
//! - Registering tools from every source (built-ins, MCP servers, the front end)
//! - Filtering tools based on user preferences
//! - Resolving a tool name to its spec and handler

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;

use crate::logging::Logger;
use crate::types::ToolSpec;

use super::handler::ToolHandler;

/// Registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    #[error("Tool already registered: {0}")]
    Duplicate(String),

    #[error("Unknown tool: {0}")]
    Unknown(String),
}

pub type ToolRegistryResult<T> = Result<T, ToolError>;

/// Information about a tool with its source
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub spec: ToolSpec,
    /// Whether this tool is enabled
    pub enabled: bool,
    /// Source of this tool (e.g., "builtin", "mcp:server-name")
    pub source: String,
}

impl ToolInfo {
    pub fn name(&self) -> &str {
        &self.spec.name
    }
}

/// Filter for tool advertisement
#[derive(Debug, Clone)]
pub struct ToolFilter {
    /// If set, only include tools with these names
    pub include: Option<HashSet<String>>,
    /// Exclude tools with these names
    pub exclude: HashSet<String>,
    /// Only include enabled tools (default: true)
    pub only_enabled: bool,
}

impl Default for ToolFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolFilter {
    pub fn new() -> Self {
        Self {
            include: None,
            exclude: HashSet::new(),
            only_enabled: true,
        }
    }

    /// Include all tools, disabled ones too
    pub fn all() -> Self {
        Self {
            only_enabled: false,
            ..Self::new()
        }
    }

    /// Include only specific tools
    pub fn with_include(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.include = Some(names.into_iter().collect());
        self
    }

    /// Exclude specific tools
    pub fn with_exclude(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.exclude = names.into_iter().collect();
        self
    }

    /// Check if a tool matches this filter
    pub fn matches(&self, tool: &ToolInfo) -> bool {
        if self.only_enabled && !tool.enabled {
            return false;
        }

        if self.exclude.contains(tool.name()) {
            return false;
        }

        if let Some(ref include) = self.include {
            if !include.contains(tool.name()) {
                return false;
            }
        }

        true
    }
}

/// A tool ready to be invoked
#[derive(Clone)]
pub struct ResolvedTool {
    pub spec: ToolSpec,
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for ResolvedTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedTool").field("spec", &self.spec).finish_non_exhaustive()
    }
}

struct RegisteredTool {
    info: ToolInfo,
    handler: Arc<dyn ToolHandler>,
}

/// Tool registry for managing available tools
///
/// Names are unique; iteration follows registration order.
pub struct ToolRegistry {
    tools: RwLock<Vec<RegisteredTool>>,
    /// Filter applied to advertisement and resolution
    filter: RwLock<ToolFilter>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            tools: RwLock::new(Vec::new()),
            filter: RwLock::new(ToolFilter::new()),
            logger,
        }
    }

    /// Logger shared with the handlers this registry builds
    pub fn logger(&self) -> Arc<dyn Logger> {
        Arc::clone(&self.logger)
    }

    /// Register a built-in tool
    pub fn register(&self, spec: ToolSpec, handler: Arc<dyn ToolHandler>) -> ToolRegistryResult<()> {
        self.register_from(spec, handler, "builtin")
    }

    /// Register a tool and record where it came from
    pub fn register_from(
        &self,
        spec: ToolSpec,
        handler: Arc<dyn ToolHandler>,
        source: impl Into<String>,
    ) -> ToolRegistryResult<()> {
        let mut tools = self.tools.write();
        if tools.iter().any(|t| t.info.spec.name == spec.name) {
            self.logger.warn(&format!("[ToolRegistry] Duplicate registration: {}", spec.name));
            return Err(ToolError::Duplicate(spec.name));
        }

        let source = source.into();
        self.logger.debug(&format!("[ToolRegistry] Registered {} ({})", spec.name, source));
        tools.push(RegisteredTool {
            info: ToolInfo {
                spec,
                enabled: true,
                source,
            },
            handler,
        });
        Ok(())
    }

    /// Replace the advertisement filter
    pub fn set_filter(&self, filter: ToolFilter) {
        *self.filter.write() = filter;
    }

    /// Enable or disable a tool
    pub fn set_tool_enabled(&self, name: &str, enabled: bool) -> ToolRegistryResult<()> {
        let mut tools = self.tools.write();
        let tool = tools
            .iter_mut()
            .find(|t| t.info.spec.name == name)
            .ok_or_else(|| ToolError::Unknown(name.to_string()))?;
        tool.info.enabled = enabled;
        Ok(())
    }

    /// Specs of every tool the model may call, in registration order
    pub fn describe_all(&self) -> Vec<ToolSpec> {
        let filter = self.filter.read();
        self.tools
            .read()
            .iter()
            .filter(|t| filter.matches(&t.info))
            .map(|t| t.info.spec.clone())
            .collect()
    }

    /// Get tools matching a filter (ignores the registry's own filter)
    pub fn get_tools(&self, filter: &ToolFilter) -> Vec<ToolInfo> {
        self.tools
            .read()
            .iter()
            .filter(|t| filter.matches(&t.info))
            .map(|t| t.info.clone())
            .collect()
    }

    /// Look up an advertised tool by name
    pub fn resolve(&self, name: &str) -> ToolRegistryResult<ResolvedTool> {
        let filter = self.filter.read();
        self.tools
            .read()
            .iter()
            .find(|t| t.info.spec.name == name && filter.matches(&t.info))
            .map(|t| ResolvedTool {
                spec: t.info.spec.clone(),
                handler: Arc::clone(&t.handler),
            })
            .ok_or_else(|| ToolError::Unknown(name.to_string()))
    }

    /// Get count of registered tools
    pub fn tool_count(&self) -> usize {
        self.tools.read().len()
    }

    /// Get count of advertised tools
    pub fn enabled_tool_count(&self) -> usize {
        self.describe_all().len()
    }
}
