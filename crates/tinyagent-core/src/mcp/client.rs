//! MCP Client using the official rmcp SDK
//!
//! Connects to MCP servers over Unix socket, HTTP or a child process's stdio.

#[cfg(unix)]
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use rmcp::{
    model::{CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation, RawContent, Tool},
    service::RunningService,
    RoleClient, ServiceExt,
};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};

#[cfg(unix)]
use tokio::net::UnixStream;

use crate::config::{McpServerConfig, McpTransport};
use crate::logging::Logger;

/// MCP client errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("Unsupported transport: {0}")]
    Unsupported(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type McpResult<T> = Result<T, McpError>;

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "tinyagent-core".to_string(),
            title: Some("TinyAgent".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// Join the text parts of a tool result
pub fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.clone()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Log a child server's stderr line by line until it closes
fn forward_stderr(name: String, stderr: ChildStderr, logger: Arc<dyn Logger>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            logger.debug(&format!("[McpClient] {} stderr: {}", name, line));
        }
    });
}

/// Client for one MCP server
pub struct McpClient {
    /// Name from configuration, used as the tool source
    name: String,
    /// The underlying rmcp running service
    client: RunningService<RoleClient, ClientInfo>,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Connect using a server entry from configuration
    pub async fn connect(server: &McpServerConfig, logger: Arc<dyn Logger>) -> McpResult<Self> {
        match &server.transport {
            McpTransport::Http { url } => Self::connect_http(&server.name, url, logger).await,
            McpTransport::Stdio { command, args } => Self::connect_stdio(&server.name, command, args, logger).await,
            #[cfg(unix)]
            McpTransport::Unix { socket } => Self::connect_unix(&server.name, socket, logger).await,
            #[cfg(not(unix))]
            McpTransport::Unix { .. } => Err(McpError::Unsupported(
                "unix sockets are not available on this platform".to_string(),
            )),
        }
    }

    /// Connect to an MCP server over a Unix socket
    #[cfg(unix)]
    pub async fn connect_unix<P: AsRef<Path>>(
        name: &str,
        socket_path: P,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        let path = socket_path.as_ref();
        logger.info(&format!("[McpClient] {}: connecting to Unix socket {:?}", name, path));

        let stream = UnixStream::connect(path)
            .await
            .map_err(|e| McpError::ConnectionFailed(e.to_string()))?;

        let client = client_info()
            .serve(stream)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info(&format!("[McpClient] {}: connected and initialized", name));

        Ok(Self {
            name: name.to_string(),
            client,
            logger,
        })
    }

    /// Connect to an MCP server over HTTP (Streamable HTTP transport)
    pub async fn connect_http(name: &str, url: &str, logger: Arc<dyn Logger>) -> McpResult<Self> {
        use rmcp::transport::StreamableHttpClientTransport;

        logger.info(&format!("[McpClient] {}: connecting to HTTP {}", name, url));

        let transport = StreamableHttpClientTransport::from_uri(url);

        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info(&format!("[McpClient] {}: connected and initialized", name));

        Ok(Self {
            name: name.to_string(),
            client,
            logger,
        })
    }

    /// Launch an MCP server as a child process and talk to it over stdio
    ///
    /// The server's stderr is forwarded to the logger at debug level. The
    /// process is shut down when the client is closed or dropped.
    pub async fn connect_stdio(
        name: &str,
        command: &str,
        args: &[String],
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        use rmcp::transport::{ConfigureCommandExt, TokioChildProcess};

        logger.info(&format!("[McpClient] {}: starting `{} {}`", name, command, args.join(" ")));

        let (transport, stderr) = TokioChildProcess::builder(Command::new(command).configure(|cmd| {
            cmd.args(args);
        }))
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| McpError::ConnectionFailed(format!("cannot start {}: {}", command, e)))?;

        if let Some(stderr) = stderr {
            forward_stderr(name.to_string(), stderr, Arc::clone(&logger));
        }

        let client = client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        logger.info(&format!("[McpClient] {}: connected and initialized", name));

        Ok(Self {
            name: name.to_string(),
            client,
            logger,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// List all available tools
    pub async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        let result = self
            .client
            .list_tools(Default::default())
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.info(&format!(
            "[McpClient] {}: listed {} tools",
            self.name,
            result.tools.len()
        ));

        Ok(result.tools)
    }

    /// Call a tool by name
    pub async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<CallToolResult> {
        self.logger.info(&format!("[McpClient] {}: calling tool {}", self.name, name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        self.client
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))
    }

    /// Get server info
    pub fn server_info(&self) -> Option<&Implementation> {
        self.client.peer_info().map(|info| &info.server_info)
    }

    /// Close the connection
    pub async fn close(self) -> McpResult<()> {
        self.logger.info(&format!("[McpClient] {}: closing connection", self.name));
        self.client
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use rmcp::model::Content;

    #[test]
    fn test_result_text_joins_text_parts() {
        let result = CallToolResult::success(vec![Content::text("first"), Content::text("second")]);
        assert_eq!(result_text(&result), "first\nsecond");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_connect_missing_socket_fails() {
        let dir = tempfile::tempdir().unwrap();
        let server = McpServerConfig {
            name: "ghost".to_string(),
            transport: McpTransport::Unix {
                socket: dir.path().join("missing.sock"),
            },
        };
        let result = McpClient::connect(&server, Arc::new(NoOpLogger)).await;
        assert!(matches!(result, Err(McpError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_connect_missing_command_fails() {
        let server = McpServerConfig {
            name: "nowhere".to_string(),
            transport: McpTransport::Stdio {
                command: "tinyagent-no-such-mcp-server".to_string(),
                args: vec!["--stdio".to_string()],
            },
        };
        let result = McpClient::connect(&server, Arc::new(NoOpLogger)).await;
        assert!(matches!(result, Err(McpError::ConnectionFailed(m)) if m.contains("tinyagent-no-such-mcp-server")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_connect_stdio_server_that_exits_fails_to_initialize() {
        // Starts fine but closes stdout without answering the handshake
        let result = McpClient::connect_stdio(
            "silent",
            "sh",
            &["-c".to_string(), "echo starting >&2; exit 0".to_string()],
            Arc::new(NoOpLogger),
        )
        .await;
        assert!(matches!(result, Err(McpError::InitializationFailed(_))));
    }
}
