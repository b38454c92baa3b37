//! Agent configuration types
//!
//! One `AgentConfig` is built at startup (files, then CLI overrides) and
//! handed to every component that needs it.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use crate::secrets::SecretStore;

const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful coding assistant working in the user's workspace.
You have tools to list files, view and edit files, and run shell commands.

Editing workflow:
1. Always view a file before modifying it.
2. When using str_replace, old_str must match the file exactly, including whitespace and indentation.
3. Complete one tool operation before starting another that depends on it.
4. After making changes, summarize what you modified.

If you need information only the user has (credentials, a manual login), ask for human intervention.";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub model: ModelSettings,
    pub session: SessionSettings,
    pub tools: ToolSettings,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mcp_servers: Vec<McpServerConfig>,
}

impl AgentConfig {
    /// Check value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.model.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model.model must not be empty".to_string()));
        }
        if let Some(t) = self.model.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::Invalid(format!(
                    "model.temperature must be between 0.0 and 2.0, got {}",
                    t
                )));
            }
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::Invalid("model.timeout_secs must be positive".to_string()));
        }
        if self.session.max_tool_rounds == 0 {
            return Err(ConfigError::Invalid("session.max_tool_rounds must be positive".to_string()));
        }
        if self.tools.timeout_secs == 0 || self.tools.shell_timeout_secs == 0 || self.tools.human_timeout_secs == 0 {
            return Err(ConfigError::Invalid("tool timeouts must be positive".to_string()));
        }
        for server in &self.mcp_servers {
            if let McpTransport::Stdio { command, .. } = &server.transport {
                if command.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "mcp server {} needs a command",
                        server.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Model service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Provider name (anthropic, openai, gemini, ollama, mock, ...)
    pub provider: String,
    /// Model identifier; `provider/model` overrides `provider`
    pub model: String,
    /// Custom API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// API key (normally left out and resolved from the environment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub max_tokens: u32,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-7-sonnet-20250219".to_string(),
            api_base: None,
            api_key: None,
            temperature: None,
            max_tokens: 4000,
            timeout_secs: 120,
        }
    }
}

impl ModelSettings {
    /// Provider id, honoring a `provider/` prefix on the model string
    pub fn provider_id(&self) -> String {
        match self.model.split_once('/') {
            Some((provider, _)) if !provider.is_empty() => provider.to_lowercase(),
            _ => self.provider.to_lowercase(),
        }
    }

    /// Model name with any `provider/` prefix removed
    pub fn model_name(&self) -> &str {
        match self.model.split_once('/') {
            Some((_, name)) => name,
            None => &self.model,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the API key: explicit setting first, then the secret store
    pub fn resolve_api_key(&self, secrets: &dyn SecretStore) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| secrets.get(&self.provider_id()))
    }
}

/// Session loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub system_prompt: String,
    /// Upper bound on model/tool round trips for one user request
    pub max_tool_rounds: usize,
    /// Execute independent calls of one batch concurrently
    pub parallel_tools: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tool_rounds: 25,
            parallel_tools: false,
        }
    }
}

/// Tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Root directory for file and shell tools (default: current directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
    /// Default bound for any tool call
    pub timeout_secs: u64,
    /// Bound for `run_command`
    pub shell_timeout_secs: u64,
    /// Bound for waiting on the person at the terminal
    pub human_timeout_secs: u64,
    /// If set, only these tools are advertised
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    /// Tools never advertised
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            workspace: None,
            timeout_secs: 30,
            shell_timeout_secs: 60,
            human_timeout_secs: 1800,
            include: None,
            exclude: Vec::new(),
        }
    }
}

impl ToolSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn shell_timeout(&self) -> Duration {
        Duration::from_secs(self.shell_timeout_secs)
    }

    pub fn human_timeout(&self) -> Duration {
        Duration::from_secs(self.human_timeout_secs)
    }

    /// Workspace root, falling back to the process working directory
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// An external MCP server whose tools are registered at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    pub name: String,
    #[serde(flatten)]
    pub transport: McpTransport,
}

/// How to reach an MCP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum McpTransport {
    /// Streamable HTTP endpoint
    Http { url: String },
    /// Unix domain socket
    Unix { socket: PathBuf },
    /// Child process speaking over its stdin and stdout
    Stdio {
        command: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
    },
}
