//! TinyAgent Core
//!
//! A small tool-using agent loop. A user line becomes a turn, the model either
//! answers or asks for tools, the tools run, and their results go back to the
//! model until it produces a final answer.
//!
//! ## Session loop
//!
//! ```rust,ignore
//! use tinyagent_core::{Session, ToolExecutor, ToolRegistry};
//!
//! let registry = Arc::new(ToolRegistry::new(logger.clone()));
//! register_builtin_tools(&registry, &config.tools)?;
//!
//! let executor = ToolExecutor::new(registry, logger.clone());
//! let model = create_model_client(&config.model, &EnvSecretStore::new(), logger.clone())?;
//!
//! let mut session = Session::new(model, executor, config.session.clone(), logger);
//! session.run(&mut console).await;
//! ```

pub mod types;
pub mod logging;
pub mod secrets;
pub mod config;
pub mod model;
pub mod tools;
pub mod mcp;
pub mod session;

// Re-export commonly used types
pub use types::{
    Attachment, ModelReply, ModelResponse, ParamKind, ParamSpec, TokenUsage,
    ToolCallRequest, ToolErrorKind, ToolResult, ToolSpec, Turn, TurnContent, TurnRole,
};

pub use logging::{Logger, NoOpLogger, SharedLogger, TracingLogger};

pub use secrets::{EnvSecretStore, MemorySecretStore, SecretStore, SecretStoreError, SecretStoreResult};

pub use config::{AgentConfig, ConfigError, ConfigLoader, ModelSettings, SessionSettings, ToolSettings};

pub use model::{create_model_client, ModelClient, ModelError, ModelRequest, ScriptedModelClient};

pub use tools::{
    register_builtin_tools, HandlerError, ToolArgs, ToolExecutor, ToolFilter, ToolHandler, ToolInfo,
    ToolRegistry,
};

pub use mcp::{register_mcp_tools, McpClient, McpError};

pub use session::{Conversation, Session, SessionEvent, SessionIo, SessionState};
