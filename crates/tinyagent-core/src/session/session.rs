//! The session loop
//!
//! One user line is processed to completion before the next is read:
//!
//! ```text
//! AwaitingUserInput --line--> AwaitingModelResponse --final answer--> AwaitingUserInput
//!                                   ^          |
//!                                   |     tool calls
//!                                   |          v
//!                                   +---- DispatchingTools
//! AwaitingUserInput --exit / end of input--> Terminated
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SessionSettings;
use crate::logging::Logger;
use crate::model::{ModelClient, ModelRequest};
use crate::tools::ToolExecutor;
use crate::types::{Attachment, ModelResponse, TokenUsage, ToolCallRequest, Turn};
use crate::{log_debug, log_error, log_info, log_warn};

use super::conversation::Conversation;
use super::io::{SessionEvent, SessionIo, UsageReport};
use super::state::{Directive, SessionState};

/// Largest document accepted by `/attach`
const MAX_ATTACHMENT_BYTES: u64 = 1024 * 1024;

/// One conversational session
pub struct Session {
    settings: SessionSettings,
    model: Arc<dyn ModelClient>,
    executor: ToolExecutor,
    conversation: Conversation,
    state: SessionState,
    workspace: PathBuf,
    last_usage: Option<TokenUsage>,
    total_usage: TokenUsage,
    logger: Arc<dyn Logger>,
}

impl Session {
    pub fn new(
        model: Arc<dyn ModelClient>,
        executor: ToolExecutor,
        settings: SessionSettings,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            settings,
            model,
            executor,
            conversation: Conversation::new(),
            state: SessionState::AwaitingUserInput,
            workspace: PathBuf::from("."),
            last_usage: None,
            total_usage: TokenUsage::default(),
            logger,
        }
    }

    /// Directory `/attach` paths are resolved against
    pub fn with_workspace(mut self, workspace: impl AsRef<Path>) -> Self {
        self.workspace = workspace.as_ref().to_path_buf();
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn executor(&self) -> &ToolExecutor {
        &self.executor
    }

    /// Current usage figures
    pub fn usage(&self) -> UsageReport {
        UsageReport {
            estimate: self.conversation.token_usage(),
            last_call: self.last_usage,
            session_total: self.total_usage,
        }
    }

    /// Read lines until the session terminates
    pub async fn run(&mut self, io: &mut dyn SessionIo) {
        while !self.state.is_terminated() {
            match io.read_line().await {
                Some(line) => {
                    self.handle_line(&line, io).await;
                }
                None => {
                    log_debug!(self.logger, "[Session] end of input");
                    self.terminate(io);
                }
            }
        }
    }

    /// Process one line of input to completion and return the resulting state
    pub async fn handle_line(&mut self, line: &str, io: &mut dyn SessionIo) -> SessionState {
        if self.state.is_terminated() {
            return self.state;
        }

        match Directive::parse(line) {
            Directive::Exit => self.terminate(io),
            Directive::Reset => {
                self.conversation.reset();
                self.last_usage = None;
                self.total_usage = TokenUsage::default();
                log_info!(self.logger, "[Session] conversation reset");
                io.emit(&SessionEvent::Reset);
            }
            Directive::History => io.emit(&SessionEvent::History {
                turns: self.conversation.snapshot().to_vec(),
            }),
            Directive::Usage => io.emit(&SessionEvent::Usage { report: self.usage() }),
            Directive::Attach(path) => self.attach(&path, io).await,
            Directive::Empty => {}
            Directive::Message(text) => self.process_request(text, io).await,
        }
        self.state
    }

    fn transition(&mut self, to: SessionState, io: &mut dyn SessionIo) {
        if self.state == to {
            return;
        }
        let from = self.state;
        log_debug!(self.logger, "[Session] {} -> {}", from, to);
        self.state = to;
        io.emit(&SessionEvent::StateChanged { from, to });
    }

    fn terminate(&mut self, io: &mut dyn SessionIo) {
        io.emit(&SessionEvent::Goodbye);
        self.transition(SessionState::Terminated, io);
    }

    fn fail_request(&mut self, message: String, io: &mut dyn SessionIo) {
        log_warn!(self.logger, "[Session] request failed: {}", message);
        io.emit(&SessionEvent::Error { message });
        self.transition(SessionState::AwaitingUserInput, io);
    }

    async fn attach(&mut self, path: &str, io: &mut dyn SessionIo) {
        if path.is_empty() {
            io.emit(&SessionEvent::Error {
                message: "usage: /attach <path>".to_string(),
            });
            return;
        }

        let full = crate::tools::builtin::resolve_path(&self.workspace, path);
        let text = match tokio::fs::metadata(&full).await {
            Ok(meta) if meta.len() > MAX_ATTACHMENT_BYTES => Err(format!(
                "{} is too large to attach ({} bytes, limit {})",
                path,
                meta.len(),
                MAX_ATTACHMENT_BYTES
            )),
            Ok(_) => tokio::fs::read_to_string(&full)
                .await
                .map_err(|e| format!("cannot read {}: {}", path, e)),
            Err(e) => Err(format!("cannot read {}: {}", path, e)),
        };

        match text {
            Ok(text) => {
                let name = full
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.to_string());
                let chars = text.chars().count();
                self.conversation.attach(Attachment::new(name.clone(), text));
                log_info!(self.logger, "[Session] attached {} ({} chars)", name, chars);
                io.emit(&SessionEvent::Attached { name, chars });
            }
            Err(message) => io.emit(&SessionEvent::Error { message }),
        }
    }

    /// One user request: model calls and tool rounds until a final answer or an error
    async fn process_request(&mut self, text: String, io: &mut dyn SessionIo) {
        let input = Turn::user(text);
        let tools = self.executor.registry().describe_all();
        let mut input_appended = false;
        let mut rounds = 0usize;

        self.transition(SessionState::AwaitingModelResponse, io);

        loop {
            let request = ModelRequest::new(&self.settings.system_prompt, &tools, self.conversation.snapshot())
                .with_attachments(self.conversation.attachments());
            let request = if input_appended { request } else { request.with_input(&input) };

            let reply = match self.model.send(request).await {
                Ok(reply) => reply,
                Err(e) => {
                    log_error!(self.logger, "[Session] model call failed: {}", e);
                    return self.fail_request(e.to_string(), io);
                }
            };

            if let Some(usage) = reply.usage {
                self.last_usage = Some(usage);
                self.total_usage.prompt_tokens += usage.prompt_tokens;
                self.total_usage.completion_tokens += usage.completion_tokens;
            }

            if let Err(message) = check_batch(&reply.response) {
                return self.fail_request(message, io);
            }

            if !input_appended {
                self.conversation.append(input.clone());
                input_appended = true;
            }

            let calls = match &reply.response {
                ModelResponse::FinalAnswer { text } => {
                    self.conversation.append(Turn::model(text.clone()));
                    io.emit(&SessionEvent::Answer { text: text.clone() });
                    io.emit(&SessionEvent::Usage { report: self.usage() });
                    self.transition(SessionState::AwaitingUserInput, io);
                    return;
                }
                ModelResponse::ToolCallBatch { calls } | ModelResponse::TextWithToolCalls { calls, .. } => {
                    calls.clone()
                }
            };

            rounds += 1;
            if rounds > self.settings.max_tool_rounds {
                return self.fail_request(
                    format!(
                        "stopped after {} tool rounds without a final answer",
                        self.settings.max_tool_rounds
                    ),
                    io,
                );
            }

            self.conversation.append(reply.response.to_turn());
            if let Some(text) = reply.response.text() {
                io.emit(&SessionEvent::ModelText { text: text.to_string() });
            }

            self.transition(SessionState::DispatchingTools, io);
            if let Err(message) = self.dispatch(&calls, io).await {
                return self.fail_request(message, io);
            }
            self.transition(SessionState::AwaitingModelResponse, io);
        }
    }

    /// Run one batch and append every result in request order
    async fn dispatch(&mut self, calls: &[ToolCallRequest], io: &mut dyn SessionIo) -> Result<(), String> {
        log_info!(self.logger, "[Session] dispatching {} tool call(s)", calls.len());

        let results = if self.executor.is_parallel() {
            for call in calls {
                io.emit(&SessionEvent::ToolCall { call: call.clone() });
            }
            self.executor.execute_batch(calls).await
        } else {
            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                io.emit(&SessionEvent::ToolCall { call: call.clone() });
                let result = self.executor.execute(call).await;
                io.emit(&SessionEvent::ToolResult { result: result.clone() });
                results.push(result);
            }
            results
        };

        for result in results {
            if self.executor.is_parallel() {
                io.emit(&SessionEvent::ToolResult { result: result.clone() });
            }
            self.conversation
                .append_tool_result(result)
                .map_err(|e| e.to_string())?;
        }

        let pending = self.conversation.pending_call_ids();
        if !pending.is_empty() {
            return Err(format!("tool calls left unanswered: {}", pending.join(", ")));
        }
        Ok(())
    }
}

/// Reject batches whose calls cannot be matched to results
fn check_batch(response: &ModelResponse) -> Result<(), String> {
    if matches!(response, ModelResponse::FinalAnswer { .. }) {
        return Ok(());
    }
    if response.calls().is_empty() {
        return Err("model sent a tool call batch without calls".to_string());
    }
    let mut seen = HashSet::new();
    for call in response.calls() {
        if call.id.is_empty() {
            return Err(format!("model requested `{}` without a call id", call.name));
        }
        if !seen.insert(call.id.as_str()) {
            return Err(format!("model reused call id `{}` within one batch", call.id));
        }
    }
    Ok(())
}
