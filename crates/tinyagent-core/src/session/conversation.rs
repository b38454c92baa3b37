//! Conversation state
//!
//! Ordered log of turns plus attached documents. Turns are never edited
//! after they are appended; `reset` is the only way to remove them.

use serde::Serialize;
use thiserror::Error;

use crate::types::{Attachment, ToolResult, Turn};

/// Characters per token used for estimates
const CHARS_PER_TOKEN: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// A result whose call id is not pending in the last tool-call turn
    #[error("tool result `{0}` does not answer a pending tool call")]
    UnmatchedResult(String),
}

/// Size of the conversation, derived from its current content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenEstimate {
    pub turns: usize,
    pub attachments: usize,
    pub chars: usize,
    pub tokens: usize,
}

/// Ordered turns and attachments of one session
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
    attachments: Vec<Attachment>,
    /// Unanswered call ids of the most recent tool-call turn, in request order
    pending: Vec<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn at the end of the log
    pub fn append(&mut self, turn: Turn) {
        if !turn.tool_calls().is_empty() {
            self.pending = turn.tool_calls().iter().map(|c| c.id.clone()).collect();
        } else if let Some(result) = turn.tool_result_ref() {
            self.pending.retain(|id| id != &result.call_id);
        }
        self.turns.push(turn);
    }

    /// Append a tool result, checking it answers a pending call
    pub fn append_tool_result(&mut self, result: ToolResult) -> Result<(), ConversationError> {
        let Some(pos) = self.pending.iter().position(|id| id == &result.call_id) else {
            return Err(ConversationError::UnmatchedResult(result.call_id));
        };
        self.pending.remove(pos);
        self.turns.push(Turn::tool_result(result));
        Ok(())
    }

    /// Ids of calls in the most recent tool-call turn that have no result yet
    pub fn pending_call_ids(&self) -> Vec<&str> {
        self.pending.iter().map(String::as_str).collect()
    }

    /// Read-only view of the full log
    pub fn snapshot(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Add a document to the context; a document with the same name is replaced
    pub fn attach(&mut self, attachment: Attachment) {
        self.attachments.retain(|a| a.name != attachment.name);
        self.attachments.push(attachment);
    }

    /// Clear turns and attachments together
    pub fn reset(&mut self) {
        self.turns.clear();
        self.attachments.clear();
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty() && self.attachments.is_empty()
    }

    /// Estimate computed from the current content on every call
    pub fn token_usage(&self) -> TokenEstimate {
        let chars = self.turns.iter().map(Turn::char_len).sum::<usize>()
            + self.attachments.iter().map(Attachment::char_len).sum::<usize>();
        TokenEstimate {
            turns: self.turns.len(),
            attachments: self.attachments.len(),
            chars,
            tokens: chars / CHARS_PER_TOKEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCallRequest;
    use serde_json::json;

    fn calls(ids: &[&str]) -> Turn {
        Turn::model_tool_calls(
            None,
            ids.iter().map(|id| ToolCallRequest::new(*id, "list_files", json!({}))).collect(),
        )
    }

    #[test]
    fn test_append_preserves_order() {
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("one"));
        conversation.append(Turn::model("two"));
        conversation.append(Turn::user("three"));

        let texts: Vec<&str> = conversation.snapshot().iter().filter_map(Turn::text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(conversation.len(), 3);
    }

    #[test]
    fn test_tool_results_must_match_pending_calls() {
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("list"));
        conversation.append(calls(&["a", "b"]));
        assert_eq!(conversation.pending_call_ids(), vec!["a", "b"]);

        conversation
            .append_tool_result(ToolResult::success("b", "list_files", "x"))
            .unwrap();
        assert_eq!(conversation.pending_call_ids(), vec!["a"]);

        // Answering twice or answering an unknown id is rejected
        let err = conversation
            .append_tool_result(ToolResult::success("b", "list_files", "x"))
            .unwrap_err();
        assert_eq!(err, ConversationError::UnmatchedResult("b".to_string()));
        assert!(conversation
            .append_tool_result(ToolResult::success("zzz", "list_files", "x"))
            .is_err());

        conversation
            .append_tool_result(ToolResult::success("a", "list_files", "y"))
            .unwrap();
        assert!(conversation.pending_call_ids().is_empty());
        assert_eq!(conversation.len(), 4);
    }

    #[test]
    fn test_pending_calls_follow_latest_batch() {
        let mut conversation = Conversation::new();
        conversation.append(calls(&["a", "b"]));
        conversation.append(Turn::tool_result(ToolResult::success("a", "list_files", "x")));
        assert_eq!(conversation.pending_call_ids(), vec!["b"]);

        // A newer batch replaces whatever the previous one left open
        conversation.append(calls(&["c"]));
        assert_eq!(conversation.pending_call_ids(), vec!["c"]);
        assert!(conversation
            .append_tool_result(ToolResult::success("b", "list_files", "x"))
            .is_err());

        conversation.reset();
        assert!(conversation.pending_call_ids().is_empty());
        assert!(conversation
            .append_tool_result(ToolResult::success("c", "list_files", "x"))
            .is_err());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("hello"));
        conversation.attach(Attachment::new("doc.md", "content"));
        assert!(!conversation.is_empty());

        conversation.reset();
        assert!(conversation.is_empty());
        assert_eq!(conversation.token_usage(), TokenEstimate::default());
    }

    #[test]
    fn test_token_usage_tracks_content() {
        let mut conversation = Conversation::new();
        conversation.append(Turn::user("12345678"));
        assert_eq!(conversation.token_usage().tokens, 2);

        conversation.attach(Attachment::new("ab", "123456"));
        let usage = conversation.token_usage();
        assert_eq!(usage.chars, 16);
        assert_eq!(usage.tokens, 4);
        assert_eq!(usage.attachments, 1);

        // Re-attaching under the same name replaces the document
        conversation.attach(Attachment::new("ab", "12"));
        assert_eq!(conversation.token_usage().chars, 12);
    }
}
