//! Conversation turn types

use serde::{Deserialize, Serialize};

use super::tool::{ToolCallRequest, ToolResult};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
    Tool,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnRole::User => write!(f, "user"),
            TurnRole::Model => write!(f, "model"),
            TurnRole::Tool => write!(f, "tool"),
        }
    }
}

/// Payload of a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnContent {
    /// Plain text
    Text { text: String },
    /// Model output requesting tools, with optional explanatory text
    ToolCalls {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        calls: Vec<ToolCallRequest>,
    },
    /// Result of one tool call
    ToolResult { result: ToolResult },
}

/// One entry in the conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: TurnContent,
}

impl Turn {
    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: TurnContent::Text { text: text.into() },
        }
    }

    /// Create a model text turn
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            content: TurnContent::Text { text: text.into() },
        }
    }

    /// Create a model turn carrying tool calls
    pub fn model_tool_calls(text: Option<String>, calls: Vec<ToolCallRequest>) -> Self {
        Self {
            role: TurnRole::Model,
            content: TurnContent::ToolCalls { text, calls },
        }
    }

    /// Create a tool result turn
    pub fn tool_result(result: ToolResult) -> Self {
        Self {
            role: TurnRole::Tool,
            content: TurnContent::ToolResult { result },
        }
    }

    /// Text content, if any
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            TurnContent::Text { text } => Some(text),
            TurnContent::ToolCalls { text, .. } => text.as_deref(),
            TurnContent::ToolResult { .. } => None,
        }
    }

    /// Tool calls carried by this turn
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match &self.content {
            TurnContent::ToolCalls { calls, .. } => calls,
            _ => &[],
        }
    }

    /// Tool result carried by this turn
    pub fn tool_result_ref(&self) -> Option<&ToolResult> {
        match &self.content {
            TurnContent::ToolResult { result } => Some(result),
            _ => None,
        }
    }

    /// Character count of everything the model will see for this turn
    pub fn char_len(&self) -> usize {
        match &self.content {
            TurnContent::Text { text } => text.len(),
            TurnContent::ToolCalls { text, calls } => {
                text.as_ref().map_or(0, String::len)
                    + calls
                        .iter()
                        .map(|c| c.name.len() + c.arguments.to_string().len())
                        .sum::<usize>()
            }
            TurnContent::ToolResult { result } => result.model_content().len(),
        }
    }
}

/// Ancillary document kept beside the turns and sent as context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Display name (usually the file name)
    pub name: String,
    pub text: String,
}

impl Attachment {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Context block handed to the model
    pub fn render(&self) -> String {
        format!("<attachment name=\"{}\">\n{}\n</attachment>", self.name, self.text)
    }

    pub fn char_len(&self) -> usize {
        self.name.len() + self.text.len()
    }
}
