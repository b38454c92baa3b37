//! Terminal input and event rendering

use std::io::{self, Write};
use std::path::Path;

use async_trait::async_trait;
use crossterm::style::Stylize;
use tinyagent_core::session::UsageReport;
use tinyagent_core::{SessionEvent, SessionIo, SessionState, Turn, TurnContent};
use tracing::warn;

use crate::input::SharedStdin;

/// Longest tool output echoed to the terminal
const PREVIEW_CHARS: usize = 400;

pub struct Console {
    provider: String,
    model: String,
    input: SharedStdin,
}

impl Console {
    pub fn new(provider: &str, model: &str, input: SharedStdin) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            input,
        }
    }

    pub fn banner(&self, workspace: &Path) {
        println!("{}", "TinyAgent".bold());
        println!("  model:     {}/{}", self.provider, self.model);
        println!("  workspace: {}", workspace.display());
        println!(
            "{}",
            "Type a request, or /attach <path>, history, usage, reset, exit.".dark_grey()
        );
    }

    fn prompt(&self) {
        print!("\n{} ", ">".green().bold());
        let _ = io::stdout().flush();
    }
}

fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn print_usage(report: &UsageReport) {
    let mut line = format!(
        "context ~{} tokens ({} turns, {} attachments)",
        report.estimate.tokens, report.estimate.turns, report.estimate.attachments
    );
    if let Some(last) = report.last_call {
        line.push_str(&format!(
            " | last call {} in / {} out",
            last.prompt_tokens, last.completion_tokens
        ));
    }
    line.push_str(&format!(" | session {}", report.session_total.total()));
    println!("{}", line.dark_grey());
}

fn print_turn(index: usize, turn: &Turn) {
    let body = match &turn.content {
        TurnContent::Text { text } => text.clone(),
        TurnContent::ToolCalls { text, calls } => {
            let names: Vec<String> = calls.iter().map(|c| format!("{}({})", c.name, c.arguments)).collect();
            match text {
                Some(text) => format!("{} -> {}", text, names.join(", ")),
                None => names.join(", "),
            }
        }
        TurnContent::ToolResult { result } => format!("[{}] {}", result.call_id, preview(&result.model_content())),
    };
    println!("{:>3} {:<6} {}", index + 1, turn.role.to_string().cyan(), body);
}

#[async_trait]
impl SessionIo for Console {
    async fn read_line(&mut self) -> Option<String> {
        self.prompt();
        match self.input.next_line().await {
            Ok(line) => line,
            Err(e) => {
                warn!("stdin: {}", e);
                None
            }
        }
    }

    fn emit(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::StateChanged { to, .. } => {
                if *to == SessionState::AwaitingModelResponse {
                    println!("{}", "thinking...".dark_grey());
                }
            }
            SessionEvent::ModelText { text } => println!("{}", text.as_str().italic()),
            SessionEvent::ToolCall { call } => {
                println!("{} {} {}", "tool".yellow().bold(), call.name.as_str().yellow(), call.arguments);
            }
            SessionEvent::ToolResult { result } => {
                if result.success {
                    println!("{}", preview(&result.output).dark_grey());
                } else {
                    println!("{}", preview(&result.model_content()).red());
                }
            }
            SessionEvent::Answer { text } => println!("\n{}", text),
            SessionEvent::Error { message } => eprintln!("{} {}", "error:".red().bold(), message),
            SessionEvent::History { turns } => {
                if turns.is_empty() {
                    println!("{}", "(no history)".dark_grey());
                }
                for (i, turn) in turns.iter().enumerate() {
                    print_turn(i, turn);
                }
            }
            SessionEvent::Usage { report } => print_usage(report),
            SessionEvent::Attached { name, chars } => {
                println!("{} {} ({} chars)", "attached".green(), name, chars);
            }
            SessionEvent::Reset => println!("{}", "conversation cleared".green()),
            SessionEvent::Goodbye => println!("Goodbye!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_cuts_long_text() {
        assert_eq!(preview("short"), "short");
        let long = "é".repeat(PREVIEW_CHARS + 10);
        let cut = preview(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), PREVIEW_CHARS + 3);
    }
}
