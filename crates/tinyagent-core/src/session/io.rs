//! User-facing surface of the session loop

use async_trait::async_trait;
use serde::Serialize;

use crate::types::{TokenUsage, ToolCallRequest, ToolResult, Turn};

use super::conversation::TokenEstimate;
use super::state::SessionState;

/// Token figures shown to the user
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageReport {
    /// Estimate from the current conversation content
    pub estimate: TokenEstimate,
    /// Usage the service reported for the most recent call
    pub last_call: Option<TokenUsage>,
    /// Sum of reported usage since start or the last reset
    pub session_total: TokenUsage,
}

/// Something the session wants the user to see
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged { from: SessionState, to: SessionState },
    /// Explanatory text sent along with tool calls
    ModelText { text: String },
    ToolCall { call: ToolCallRequest },
    ToolResult { result: ToolResult },
    /// Final answer for the current request
    Answer { text: String },
    /// The request could not be completed; the session keeps going
    Error { message: String },
    History { turns: Vec<Turn> },
    Usage { report: UsageReport },
    Attached { name: String, chars: usize },
    Reset,
    Goodbye,
}

/// Line-oriented input and event output for a session
#[async_trait]
pub trait SessionIo: Send {
    /// Next line of input; `None` at end of input
    async fn read_line(&mut self) -> Option<String>;

    fn emit(&mut self, event: &SessionEvent);
}
