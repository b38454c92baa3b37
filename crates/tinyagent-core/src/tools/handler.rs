//! Tool handler boundary

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Argument mapping handed to a handler after validation
pub type ToolArgs = Map<String, Value>;

/// Failure reported by a tool's own action
#[derive(Error, Debug)]
pub enum HandlerError {
    /// An argument passed schema validation but is not acceptable to the tool
    #[error("invalid argument `{name}`: {message}")]
    InvalidArgument { name: String, message: String },

    /// The underlying action ran out of time
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

pub type HandlerResult = Result<String, HandlerError>;

/// The concrete action behind a registered tool
///
/// Handlers receive an argument mapping already checked against the tool's
/// `ToolSpec`. Side effects (files, processes, network) live here only.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool
    async fn call(&self, args: &ToolArgs) -> HandlerResult;

    /// Upper bound for one call; `None` uses the executor default
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// Required string argument
pub fn str_arg<'a>(args: &'a ToolArgs, name: &str) -> Result<&'a str, HandlerError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| HandlerError::invalid(name, "expected a string"))
}

/// Optional string argument
pub fn opt_str_arg<'a>(args: &'a ToolArgs, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}

/// Optional integer argument
pub fn opt_i64_arg(args: &ToolArgs, name: &str) -> Option<i64> {
    args.get(name).and_then(Value::as_i64)
}

/// Optional boolean argument
pub fn opt_bool_arg(args: &ToolArgs, name: &str) -> Option<bool> {
    args.get(name).and_then(Value::as_bool)
}
