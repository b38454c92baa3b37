//! Tool management module
//!
//! This module provides tool registration, filtering and execution for
//! model tool calling.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ToolExecutor                               │
//! │    - resolves the name in the registry      │
//! │    - validates arguments against ToolSpec   │
//! │    - runs the handler under a timeout       │
//! │    - always yields exactly one ToolResult   │
//! └─────────────────────────────────────────────┘
//!           │
//!           ▼
//! ┌─────────────────────────────────────────────┐
//! │  ToolRegistry                               │
//! │    builtin: list_files, str_replace_editor, │
//! │             run_command                     │
//! │    mcp:<server>: tools listed by MCP        │
//! │    frontend: request_human_intervention     │
//! └─────────────────────────────────────────────┘
//! ```

mod handler;
mod registry;
mod executor;
pub mod builtin;

pub use handler::{
    opt_bool_arg, opt_i64_arg, opt_str_arg, str_arg, HandlerError, HandlerResult, ToolArgs, ToolHandler,
};
pub use registry::{ResolvedTool, ToolError, ToolFilter, ToolInfo, ToolRegistry, ToolRegistryResult};
pub use executor::{validate_arguments, ToolExecutor};
pub use builtin::register_builtin_tools;

use crate::config::ToolSettings;

impl ToolFilter {
    /// Filter from the `tools.include` / `tools.exclude` settings
    pub fn from_settings(settings: &ToolSettings) -> Self {
        let mut filter = ToolFilter::new().with_exclude(settings.exclude.iter().cloned());
        if let Some(include) = &settings.include {
            filter = filter.with_include(include.iter().cloned());
        }
        filter
    }
}
