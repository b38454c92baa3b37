//! Configuration
//!
//! - `AgentConfig` and its sections: the single configuration object
//! - `ConfigLoader`: YAML files at user and workspace level, merged key by key

mod error;
mod settings;
mod file;

pub use error::{ConfigError, ConfigResult};
pub use settings::{AgentConfig, McpServerConfig, McpTransport, ModelSettings, SessionSettings, ToolSettings};
pub use file::{load_layered, ConfigLevel, ConfigLoader};
