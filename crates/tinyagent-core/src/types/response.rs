//! Model response types

use serde::{Deserialize, Serialize};

use super::tool::ToolCallRequest;
use super::turn::Turn;

/// What the model produced for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelResponse {
    /// Natural-language answer, no tool calls
    FinalAnswer { text: String },
    /// Tool calls only
    ToolCallBatch { calls: Vec<ToolCallRequest> },
    /// Explanatory text alongside tool calls
    TextWithToolCalls {
        text: String,
        calls: Vec<ToolCallRequest>,
    },
}

impl ModelResponse {
    /// Create a final answer
    pub fn final_answer(text: impl Into<String>) -> Self {
        ModelResponse::FinalAnswer { text: text.into() }
    }

    /// Create a tool call batch
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Self {
        ModelResponse::ToolCallBatch { calls }
    }

    /// Build from the optional text and call list of a raw response
    ///
    /// `None` when there is neither text nor a tool call.
    pub fn from_parts(text: Option<String>, calls: Vec<ToolCallRequest>) -> Option<Self> {
        let text = text.filter(|t| !t.trim().is_empty());
        match (text, calls.is_empty()) {
            (None, true) => None,
            (Some(text), true) => Some(ModelResponse::FinalAnswer { text }),
            (None, false) => Some(ModelResponse::ToolCallBatch { calls }),
            (Some(text), false) => Some(ModelResponse::TextWithToolCalls { text, calls }),
        }
    }

    /// Text content, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            ModelResponse::FinalAnswer { text } | ModelResponse::TextWithToolCalls { text, .. } => Some(text),
            ModelResponse::ToolCallBatch { .. } => None,
        }
    }

    /// Requested tool calls (empty for a final answer)
    pub fn calls(&self) -> &[ToolCallRequest] {
        match self {
            ModelResponse::FinalAnswer { .. } => &[],
            ModelResponse::ToolCallBatch { calls } | ModelResponse::TextWithToolCalls { calls, .. } => calls,
        }
    }

    /// Check if the model requested tools
    pub fn has_tool_calls(&self) -> bool {
        !self.calls().is_empty()
    }

    /// Convert into the turn recorded in the conversation
    pub fn to_turn(&self) -> Turn {
        match self {
            ModelResponse::FinalAnswer { text } => Turn::model(text.clone()),
            ModelResponse::ToolCallBatch { calls } => Turn::model_tool_calls(None, calls.clone()),
            ModelResponse::TextWithToolCalls { text, calls } => {
                Turn::model_tool_calls(Some(text.clone()), calls.clone())
            }
        }
    }
}

/// Token counts reported by the model service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A model response plus service-reported usage
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    pub response: ModelResponse,
    pub usage: Option<TokenUsage>,
}

impl From<ModelResponse> for ModelReply {
    fn from(response: ModelResponse) -> Self {
        Self { response, usage: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_parts() {
        let call = ToolCallRequest::new("c1", "list_files", json!({}));

        assert_eq!(
            ModelResponse::from_parts(Some("done".into()), vec![]),
            Some(ModelResponse::final_answer("done"))
        );
        assert!(matches!(
            ModelResponse::from_parts(None, vec![call.clone()]),
            Some(ModelResponse::ToolCallBatch { .. })
        ));
        assert!(matches!(
            ModelResponse::from_parts(Some("  ".into()), vec![call.clone()]),
            Some(ModelResponse::ToolCallBatch { .. })
        ));
        let both = ModelResponse::from_parts(Some("Let me look".into()), vec![call]).unwrap();
        assert_eq!(both.text(), Some("Let me look"));
        assert!(both.has_tool_calls());
    }

    #[test]
    fn test_empty_reply_has_no_response() {
        assert_eq!(ModelResponse::from_parts(None, vec![]), None);
        assert_eq!(ModelResponse::from_parts(Some(" \n ".into()), vec![]), None);
    }

    #[test]
    fn test_to_turn() {
        let call = ToolCallRequest::new("c1", "list_files", json!({}));
        let turn = ModelResponse::TextWithToolCalls {
            text: "Looking".into(),
            calls: vec![call],
        }
        .to_turn();
        assert_eq!(turn.text(), Some("Looking"));
        assert_eq!(turn.tool_calls().len(), 1);
    }
}
