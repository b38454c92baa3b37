//! Core types for agent interactions
//!
//! This module contains the shared types passed between the session loop,
//! the model client and the tool executor.

mod turn;
mod tool;
mod response;

pub use turn::{Attachment, Turn, TurnContent, TurnRole};
pub use tool::{value_kind, ParamKind, ParamSpec, ToolCallRequest, ToolErrorKind, ToolResult, ToolSpec};
pub use response::{ModelReply, ModelResponse, TokenUsage};
