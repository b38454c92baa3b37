//! Scripted model client for testing
//!
//! Provides deterministic responses without network dependencies. Backs the
//! `mock` provider and the session loop tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::logging::Logger;
use crate::types::{Attachment, ModelReply, ModelResponse, TokenUsage, ToolCallRequest, Turn};

use super::error::{ModelError, ModelResult};
use super::genai_adapter::system_text;
use super::traits::{ModelClient, ModelRequest};

/// Response mode
#[derive(Debug, Clone, Default)]
pub enum ScriptMode {
    /// Answer with the last user message
    #[default]
    Echo,
    /// Pop the next queued response for every request
    Scripted,
}

/// Copy of one request, kept for assertions
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub system_prompt: String,
    /// Names of the advertised tools
    pub tools: Vec<String>,
    /// History plus pending input, in send order
    pub turns: Vec<Turn>,
    pub attachments: Vec<Attachment>,
}

/// Deterministic model client
pub struct ScriptedModelClient {
    mode: ScriptMode,
    script: Mutex<VecDeque<ModelResult<ModelResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    logger: Arc<dyn Logger>,
}

impl ScriptedModelClient {
    /// Create an echo client
    pub fn echo(logger: Arc<dyn Logger>) -> Self {
        Self {
            mode: ScriptMode::Echo,
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            logger,
        }
    }

    /// Create a client that replays `script` in order
    pub fn scripted(script: Vec<ModelResult<ModelResponse>>, logger: Arc<dyn Logger>) -> Self {
        Self {
            mode: ScriptMode::Scripted,
            script: Mutex::new(script.into()),
            ..Self::echo(logger)
        }
    }

    /// Scripted responses not consumed yet
    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Build a tool call with a fresh unique id
    pub fn call(name: impl Into<String>, arguments: Value) -> ToolCallRequest {
        ToolCallRequest::new(format!("call_{}", uuid::Uuid::new_v4().simple()), name, arguments)
    }

    fn record(&self, request: &ModelRequest<'_>) {
        self.requests.lock().push(RecordedRequest {
            system_prompt: system_text(request),
            tools: request.tools.iter().map(|t| t.name.clone()).collect(),
            turns: request.turns().cloned().collect(),
            attachments: request.attachments.to_vec(),
        });
    }

    fn estimate_usage(&self, request: &ModelRequest<'_>, response: &ModelResponse) -> TokenUsage {
        let prompt_chars = system_text(request).len() + request.turns().map(Turn::char_len).sum::<usize>();
        let completion_chars = response.to_turn().char_len();
        TokenUsage {
            prompt_tokens: self.count_tokens_chars(prompt_chars),
            completion_tokens: self.count_tokens_chars(completion_chars),
        }
    }

    fn count_tokens_chars(&self, chars: usize) -> u32 {
        (chars / 4) as u32
    }
}

#[async_trait]
impl ModelClient for ScriptedModelClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, request: ModelRequest<'_>) -> ModelResult<ModelReply> {
        self.logger.debug(&format!(
            "ScriptedModelClient: send called with {} turn(s)",
            request.turns().count()
        ));
        self.record(&request);

        let response = match self.mode {
            ScriptMode::Echo => {
                let text = request.last_user_text().unwrap_or("Hello from the mock model!");
                self.logger.debug(&format!("ScriptedModelClient: echoing: {}", text));
                ModelResponse::final_answer(format!("Echo: {}", text))
            }
            ScriptMode::Scripted => {
                let next = self.script.lock().pop_front();
                match next {
                    Some(Ok(response)) => response,
                    Some(Err(e)) => {
                        self.logger.debug(&format!("ScriptedModelClient: scripted error: {}", e));
                        return Err(e);
                    }
                    None => return Err(ModelError::protocol("mock", "script exhausted")),
                }
            }
        };

        let usage = self.estimate_usage(&request, &response);
        Ok(ModelReply {
            response,
            usage: Some(usage),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::{ToolResult, ToolSpec};
    use serde_json::json;

    fn test_logger() -> Arc<dyn Logger> {
        Arc::new(NoOpLogger)
    }

    #[tokio::test]
    async fn test_echo_mode() {
        let client = ScriptedModelClient::echo(test_logger());
        let input = Turn::user("Hello, world!");

        let reply = client
            .send(ModelRequest::new("system", &[], &[]).with_input(&input))
            .await
            .unwrap();

        assert_eq!(reply.response, ModelResponse::final_answer("Echo: Hello, world!"));
        assert!(reply.usage.unwrap().prompt_tokens > 0);
    }

    #[tokio::test]
    async fn test_scripted_mode_in_order() {
        let call = ScriptedModelClient::call("list_files", json!({}));
        let client = ScriptedModelClient::scripted(
            vec![
                Ok(ModelResponse::tool_calls(vec![call.clone()])),
                Ok(ModelResponse::final_answer("done")),
            ],
            test_logger(),
        );
        let tools = vec![ToolSpec::new("list_files", "List files")];
        let history = vec![Turn::user("go")];

        let first = client.send(ModelRequest::new("s", &tools, &history)).await.unwrap();
        assert_eq!(first.response.calls(), &[call.clone()]);

        let history = vec![
            Turn::user("go"),
            first.response.to_turn(),
            Turn::tool_result(ToolResult::success(&call.id, "list_files", "a.txt")),
        ];
        let second = client.send(ModelRequest::new("s", &tools, &history)).await.unwrap();
        assert_eq!(second.response.text(), Some("done"));
        assert_eq!(client.remaining(), 0);

        let recorded = client.requests();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].tools, vec!["list_files".to_string()]);
        assert_eq!(recorded[1].turns.len(), 3);
    }

    #[tokio::test]
    async fn test_scripted_error_and_exhaustion() {
        let client = ScriptedModelClient::scripted(
            vec![Err(ModelError::transient("mock", "connection reset"))],
            test_logger(),
        );

        let err = client.send(ModelRequest::new("s", &[], &[])).await.unwrap_err();
        assert!(err.is_transient());

        let err = client.send(ModelRequest::new("s", &[], &[])).await.unwrap_err();
        assert!(matches!(err, ModelError::Protocol { .. }));
        assert_eq!(client.request_count(), 2);
    }

    #[test]
    fn test_call_ids_are_unique() {
        let a = ScriptedModelClient::call("x", json!({}));
        let b = ScriptedModelClient::call("x", json!({}));
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("call_"));
    }
}
