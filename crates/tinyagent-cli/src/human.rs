//! Tool that hands control back to the person at the terminal

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crossterm::style::Stylize;
use tinyagent_core::tools::{opt_str_arg, HandlerError, HandlerResult};
use tinyagent_core::{ParamKind, ParamSpec, ToolArgs, ToolHandler, ToolSpec};
use tokio::io::{AsyncBufRead, BufReader, Stdin};

use crate::input::InputLines;

/// Waits for Enter on the same input the prompt reads from
pub struct HumanIntervention<R = BufReader<Stdin>> {
    input: Arc<InputLines<R>>,
    /// Bound on the wait, overriding the executor default
    timeout: Duration,
}

impl<R> HumanIntervention<R> {
    pub fn new(input: Arc<InputLines<R>>, timeout: Duration) -> Self {
        Self { input, timeout }
    }
}

impl HumanIntervention {
    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            "request_human_intervention",
            "Pause and ask the user to do something only a human can (log in, solve a captcha, \
             provide credentials). Returns once the user presses Enter.",
        )
        .with_param(ParamSpec::optional(
            "reason",
            ParamKind::String,
            "What the user needs to do",
        ))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send + 'static> ToolHandler for HumanIntervention<R> {
    async fn call(&self, args: &ToolArgs) -> HandlerResult {
        let reason = opt_str_arg(args, "reason").unwrap_or("The agent needs your help").to_string();
        println!("\n{} {}", "human intervention:".magenta().bold(), reason);
        print!("Press Enter when done... ");
        let _ = io::stdout().flush();

        match self.input.next_line().await? {
            Some(_) => Ok("Human intervention completed".to_string()),
            None => Err(HandlerError::failed("input closed before the user answered")),
        }
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.timeout)
    }
}
