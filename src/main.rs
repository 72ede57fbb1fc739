use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use wikigraphd::{config::GraphdConfig, rest, wikipedia::WikipediaSource, AppContext};

#[derive(Parser)]
#[command(
    name = "wikigraphd",
    about = "wikigraphd — bounded-depth Wikipedia link-graph service",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// REST API port
    #[arg(long, env = "WIKIGRAPHD_PORT")]
    port: Option<u16>,

    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "WIKIGRAPHD_BIND")]
    bind_address: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "WIKIGRAPHD_LOG")]
    log: Option<String>,

    /// Path to a TOML config file
    #[arg(long, env = "WIKIGRAPHD_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// MediaWiki action API endpoint override
    #[arg(long, env = "WIKIGRAPHD_API_URL")]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Build a graph once and print it as JSON, without starting the server
    Crawl {
        /// Root topic, e.g. Albert_Einstein
        topic: String,

        /// Recursion depth (0 = root node only)
        #[arg(long, default_value_t = 0)]
        depth: u32,
    },
}

fn load_config(args: &Args) -> Result<GraphdConfig> {
    let mut config = GraphdConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind) = &args.bind_address {
        config.bind_address = bind.clone();
    }
    if let Some(log) = &args.log {
        config.log_level = log.clone();
    }
    if let Some(api_url) = &args.api_url {
        config.api_url = api_url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Flags win over the config file, so pick the filter from both.
    let log_level = args.log.clone().unwrap_or_else(|| {
        GraphdConfig::load(args.config.as_deref())
            .map(|c| c.log_level)
            .unwrap_or_else(|_| "info".to_string())
    });
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .compact()
        .init();

    let config = Arc::new(load_config(&args)?);
    let source =
        Arc::new(WikipediaSource::new(&config).context("building Wikipedia API client")?);
    let ctx = Arc::new(AppContext::new(config, source));

    match args.command {
        Some(Command::Crawl { topic, depth }) => {
            let graph = ctx
                .builder
                .build(&topic, depth)
                .await
                .with_context(|| format!("building graph for {topic}"))?;
            println!("{}", serde_json::to_string_pretty(&graph)?);
            Ok(())
        }
        None => {
            info!(
                version = env!("CARGO_PKG_VERSION"),
                api_url = %ctx.config.api_url,
                "starting wikigraphd"
            );
            rest::start_rest_server(ctx).await
        }
    }
}
