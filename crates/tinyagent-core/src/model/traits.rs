//! Model client trait definition

use async_trait::async_trait;

use crate::types::{Attachment, ModelReply, ToolSpec, Turn};

use super::error::ModelResult;

/// Everything the model sees for one call
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system_prompt: &'a str,
    /// Tools advertised for this call
    pub tools: &'a [ToolSpec],
    /// Conversation so far
    pub history: &'a [Turn],
    pub attachments: &'a [Attachment],
    /// New user turn not yet in `history`; `None` on follow-up calls after tool results
    pub input: Option<&'a Turn>,
}

impl<'a> ModelRequest<'a> {
    pub fn new(system_prompt: &'a str, tools: &'a [ToolSpec], history: &'a [Turn]) -> Self {
        Self {
            system_prompt,
            tools,
            history,
            attachments: &[],
            input: None,
        }
    }

    pub fn with_attachments(mut self, attachments: &'a [Attachment]) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn with_input(mut self, input: &'a Turn) -> Self {
        self.input = Some(input);
        self
    }

    /// History followed by the pending input, in the order sent
    pub fn turns(&self) -> impl Iterator<Item = &'a Turn> + 'a {
        self.history.iter().chain(self.input)
    }

    /// Text of the most recent user turn
    pub fn last_user_text(&self) -> Option<&'a str> {
        self.turns()
            .filter(|t| t.role == crate::types::TurnRole::User)
            .last()
            .and_then(|t| t.text())
    }
}

/// Boundary to the language-model service
///
/// Implementations:
/// - `GenaiModelClient`: remote providers through the `genai` crate
/// - `ScriptedModelClient`: deterministic responses for tests and offline runs
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Client name, used in logs and usage output
    fn name(&self) -> &str;

    /// Send one request and wait for the complete response
    async fn send(&self, request: ModelRequest<'_>) -> ModelResult<ModelReply>;

    /// Rough token count for text (4 characters per token)
    fn count_tokens(&self, text: &str) -> usize {
        text.len() / 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ToolResult, Turn};

    #[test]
    fn test_turns_include_input() {
        let history = vec![
            Turn::user("first"),
            Turn::model("answer"),
            Turn::tool_result(ToolResult::success("c1", "list_files", "a.txt")),
        ];
        let input = Turn::user("second");

        let request = ModelRequest::new("system", &[], &history).with_input(&input);
        assert_eq!(request.turns().count(), 4);
        assert_eq!(request.last_user_text(), Some("second"));

        let follow_up = ModelRequest::new("system", &[], &history);
        assert_eq!(follow_up.last_user_text(), Some("first"));
        assert!(follow_up.attachments.is_empty());
    }
}
