//! buildkite-mcp-server - MCP server exposing Buildkite to AI assistants.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use buildkite_api::BuildkiteClient;
use buildkite_core::config::Config;
use buildkite_mcp::handlers::catalog;
use buildkite_mcp::McpServer;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "buildkite-mcp-server")]
#[command(author, version, about = "MCP server for Buildkite", long_about = None)]
struct Cli {
    /// Buildkite API access token
    #[arg(long, env = "BUILDKITE_API_TOKEN", hide_env_values = true, global = true)]
    api_token: Option<String>,

    /// Buildkite API base URL
    #[arg(long, env = "BUILDKITE_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Extra HTTP header sent with every request, as "Key: Value"
    #[arg(
        long = "http-header",
        env = "BUILDKITE_HTTP_HEADERS",
        value_delimiter = ',',
        global = true
    )]
    http_headers: Vec<String>,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout
    Stdio,

    /// Print every tool definition as one JSON document per line
    Tools,

    /// Manage the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Print the config file path
    Path,

    /// Get a value by key (e.g. buildkite.base_url)
    Get { key: String },

    /// Set a value by key (e.g. buildkite.headers.X-Team)
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    let config = Config::load_from(&config_path)?;

    // Stdout carries the JSON-RPC stream, so logs go to stderr.
    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log_level().unwrap_or("info")))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Stdio => {
            let Some(token) = cli.api_token.as_deref().filter(|t| !t.is_empty()) else {
                bail!("a Buildkite API token is required (--api-token or BUILDKITE_API_TOKEN)");
            };
            let client = build_client(&config, cli.base_url.as_deref(), &cli.http_headers, token);

            info!(version = env!("CARGO_PKG_VERSION"), "Starting buildkite-mcp-server");
            let mut server = McpServer::new(Arc::new(client));
            server.run().await?;
        }
        Commands::Tools => {
            for tool in catalog() {
                println!("{}", serde_json::to_string(&tool)?);
            }
        }
        Commands::Config { command } => run_config(command, config, &config_path)?,
    }

    Ok(())
}

fn run_config(command: ConfigCommands, mut config: Config, path: &Path) -> anyhow::Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Get { key } => match config.get(&key)? {
            Some(value) => println!("{}", value),
            None => println!("(not set)"),
        },
        ConfigCommands::Set { key, value } => {
            config.set(&key, &value)?;
            config
                .save_to(path)
                .with_context(|| format!("saving {}", path.display()))?;
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}

/// Client configured from the config file, overridden by flags.
fn build_client(
    config: &Config,
    base_url: Option<&str>,
    cli_headers: &[String],
    token: &str,
) -> BuildkiteClient {
    let base_url = base_url.unwrap_or(&config.buildkite.base_url);

    let mut headers = config.buildkite.headers.clone();
    headers.extend(parse_headers(cli_headers));

    let client = BuildkiteClient::with_base_url(base_url, token).with_headers(headers);
    match &config.buildkite.user_agent {
        Some(user_agent) => client.with_user_agent(user_agent),
        None => client,
    }
}

/// Parse `Key: Value` strings, skipping malformed entries.
fn parse_headers(raw: &[String]) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    for entry in raw.iter().map(|h| h.trim()).filter(|h| !h.is_empty()) {
        match entry.split_once(':') {
            Some((key, value)) if !key.trim().is_empty() => {
                headers.insert(key.trim().to_string(), value.trim().to_string());
            }
            _ => warn!(header = entry, "Ignoring malformed HTTP header"),
        }
    }

    headers
}
