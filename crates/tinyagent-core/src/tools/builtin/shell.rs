//! Shell command execution tool.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::logging::Logger;
use crate::tools::handler::{opt_i64_arg, str_arg, HandlerError, HandlerResult, ToolArgs, ToolHandler};
use crate::types::{ParamKind, ParamSpec, ToolSpec};

use super::{truncate_output, MAX_OUTPUT_CHARS};

/// Slack between the command's own bound and the executor's
const TIMEOUT_GRACE: Duration = Duration::from_secs(5);

/// Run a shell command in the workspace.
pub struct RunCommand {
    root: PathBuf,
    max_timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl RunCommand {
    pub fn new(root: impl AsRef<Path>, max_timeout: Duration, logger: Arc<dyn Logger>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            max_timeout,
            logger,
        }
    }

    pub fn spec() -> ToolSpec {
        ToolSpec::new(
            "run_command",
            "Execute a shell command in the workspace directory. Returns the exit code, stdout and stderr. \
             Use for running tests, building, searching, etc.",
        )
        .with_param(ParamSpec::required("command", ParamKind::String, "The shell command to execute"))
        .with_param(ParamSpec::optional(
            "timeout_secs",
            ParamKind::Integer,
            "Timeout in seconds (capped by the configured maximum)",
        ))
    }

    fn shell() -> (&'static str, &'static str) {
        if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        }
    }
}

#[async_trait]
impl ToolHandler for RunCommand {
    async fn call(&self, args: &ToolArgs) -> HandlerResult {
        let command = str_arg(args, "command")?;
        if command.trim().is_empty() {
            return Err(HandlerError::invalid("command", "must not be empty"));
        }
        let timeout = match opt_i64_arg(args, "timeout_secs") {
            Some(secs) if secs <= 0 => return Err(HandlerError::invalid("timeout_secs", "must be positive")),
            Some(secs) => Duration::from_secs(secs as u64).min(self.max_timeout),
            None => self.max_timeout,
        };

        self.logger.info(&format!(
            "[RunCommand] Executing `{}` (timeout={}ms)",
            command,
            timeout.as_millis()
        ));

        let (shell, shell_arg) = Self::shell();
        let child = Command::new(shell)
            .arg(shell_arg)
            .arg(command)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the future on timeout must not leave the process running
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(timeout, child)
            .await
            .map_err(|_| HandlerError::Timeout(timeout))?
            .map_err(|e| HandlerError::failed(format!("Failed to execute command: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);

        let mut result = format!("Exit code: {}\n", exit_code);

        if !stdout.is_empty() {
            result.push_str("\n--- stdout ---\n");
            result.push_str(&stdout);
        }

        if !stderr.is_empty() {
            result.push_str("\n--- stderr ---\n");
            result.push_str(&stderr);
        }

        Ok(truncate_output(result, MAX_OUTPUT_CHARS))
    }

    fn timeout(&self) -> Option<Duration> {
        Some(self.max_timeout + TIMEOUT_GRACE)
    }
}
