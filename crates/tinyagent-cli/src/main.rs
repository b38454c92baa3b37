//! TinyAgent - interactive terminal front end
//!
//! Reads one line at a time, lets the model call tools in the workspace and
//! prints the answer.

mod console;
mod human;
mod input;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tinyagent_core::config::{load_layered, ConfigLevel, ConfigLoader};
use tinyagent_core::mcp::{register_mcp_tools, McpClient};
use tinyagent_core::{
    create_model_client, register_builtin_tools, AgentConfig, EnvSecretStore, Logger, MemorySecretStore,
    ModelClient, SecretStore, Session, ToolExecutor, ToolFilter, ToolRegistry, TracingLogger,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::console::Console;
use crate::human::HumanIntervention;
use crate::input::{InputLines, SharedStdin};

#[derive(Parser, Debug)]
#[command(name = "tinyagent", version, about = "A small tool-using agent for your terminal")]
struct Args {
    /// Model to use, optionally as provider/model
    #[arg(short, long)]
    model: Option<String>,

    /// Provider name when the model has no provider/ prefix
    #[arg(long)]
    provider: Option<String>,

    /// API key (defaults to the provider's environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Custom API base URL
    #[arg(long)]
    api_base: Option<String>,

    /// Workspace root for file and shell tools
    #[arg(short, long)]
    workspace: Option<PathBuf>,

    /// Extra config file, applied after the user and workspace files
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run the tool calls of one batch concurrently
    #[arg(long)]
    parallel_tools: bool,

    /// Upper bound on tool rounds per request
    #[arg(long)]
    max_tool_rounds: Option<usize>,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a config file with the current settings
    Init {
        /// Write the user-level file instead of the workspace one
        #[arg(long)]
        user: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("TINYAGENT_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Files first, then command line flags
fn load_config(args: &Args, workspace: &Path) -> anyhow::Result<AgentConfig> {
    let mut loaders = vec![ConfigLoader::user(), ConfigLoader::workspace(workspace)];
    if let Some(path) = &args.config {
        if !path.exists() {
            bail!("config file not found: {}", path.display());
        }
        loaders.push(ConfigLoader::new(path.clone(), ConfigLevel::Workspace));
    }
    let mut config = load_layered(&loaders).context("failed to load configuration")?;

    if let Some(model) = &args.model {
        config.model.model = model.clone();
    }
    if let Some(provider) = &args.provider {
        config.model.provider = provider.clone();
    }
    if let Some(api_base) = &args.api_base {
        config.model.api_base = Some(api_base.clone());
    }
    if args.parallel_tools {
        config.session.parallel_tools = true;
    }
    if let Some(rounds) = args.max_tool_rounds {
        config.session.max_tool_rounds = rounds;
    }
    config.tools.workspace = Some(workspace.to_path_buf());
    config.validate()?;
    Ok(config)
}

fn init_config(config: &AgentConfig, workspace: &Path, user: bool) -> anyhow::Result<()> {
    let loader = if user {
        ConfigLoader::user()
    } else {
        ConfigLoader::workspace(workspace)
    };
    if let Some(backup) = loader.backup()? {
        println!("Backed up existing config to {}", backup.display());
    }

    // The workspace path is implied by where the file lives
    let mut config = config.clone();
    config.tools.workspace = None;
    config.model.api_key = None;
    loader.save(&config)?;
    println!("Wrote {} config to {}", loader.level().as_str(), loader.path().display());
    Ok(())
}

async fn build_registry(
    config: &AgentConfig,
    input: &SharedStdin,
    logger: &Arc<dyn Logger>,
) -> anyhow::Result<Arc<ToolRegistry>> {
    let registry = Arc::new(ToolRegistry::new(Arc::new(TracingLogger::new("tools"))));
    register_builtin_tools(&registry, &config.tools)?;
    registry.register(
        HumanIntervention::spec(),
        Arc::new(HumanIntervention::new(Arc::clone(input), config.tools.human_timeout())),
    )?;

    for server in &config.mcp_servers {
        let mcp_logger: Arc<dyn Logger> = Arc::new(TracingLogger::new("mcp"));
        match McpClient::connect(server, mcp_logger).await {
            Ok(client) => {
                if let Err(e) = register_mcp_tools(&registry, Arc::new(client), logger).await {
                    warn!("MCP server {}: {}", server.name, e);
                }
            }
            Err(e) => warn!("MCP server {} unavailable: {}", server.name, e),
        }
    }

    registry.set_filter(ToolFilter::from_settings(&config.tools));
    info!(
        "{} tools registered, {} advertised",
        registry.tool_count(),
        registry.enabled_tool_count()
    );
    Ok(registry)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let workspace = match &args.workspace {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("cannot determine the working directory")?,
    };
    let workspace = workspace
        .canonicalize()
        .with_context(|| format!("workspace not found: {}", workspace.display()))?;

    let config = load_config(&args, &workspace)?;
    if let Some(Command::Init { user }) = &args.command {
        return init_config(&config, &workspace, *user);
    }

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger::new("session"));
    let secrets: Box<dyn SecretStore> = match &args.api_key {
        Some(key) => Box::new(MemorySecretStore::with_secret(config.model.provider_id(), key.clone())),
        None => Box::new(EnvSecretStore::new()),
    };
    let model = create_model_client(&config.model, secrets.as_ref(), Arc::new(TracingLogger::new("model")))?;

    let input = InputLines::stdin();
    let registry = build_registry(&config, &input, &logger).await?;
    let executor = ToolExecutor::new(registry, Arc::new(TracingLogger::new("executor")))
        .with_timeout(config.tools.timeout())
        .with_parallel(config.session.parallel_tools);

    let mut console = Console::new(model.name(), config.model.model_name(), input);
    console.banner(&workspace);

    let mut session = Session::new(model, executor, config.session.clone(), logger).with_workspace(&workspace);
    session.run(&mut console).await;
    Ok(())
}
