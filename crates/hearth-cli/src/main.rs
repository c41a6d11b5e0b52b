//! Command-line entry point for Hearth.
//!
//! One binary covers every deployment shape: the combined chat + tools
//! service, the tools service alone (with chat pointed at it over HTTP),
//! a one-shot chat exchange, and a catalog dump.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::time::Duration;
use tracing::{info, warn};

use hearth_api::{ChatState, ToolsState};
use hearth_core::Config;
use hearth_core::config::env_vars;
use hearth_hub::{
    HubClient, HubConnectionConfig, HubService, StateCache, SubscriptionHandle,
    spawn_subscription,
};
use hearth_llm::{OllamaConfig, OllamaEngine, TextEngine};
use hearth_router::{HttpInvoker, InProcessInvoker, RequestRouter, ToolInvoker};
use hearth_storage::{DurableStore, EphemeralStore, InteractionLifecycle};
use hearth_tools::{ToolContext, ToolRegistry};

/// Hearth - keyword and model routed home assistant.
#[derive(Parser, Debug)]
#[command(name = "hearth")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Start the chat and tools services in one process.
    Serve {
        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind to.
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
        /// Delegate tool execution to a remote tools service at this URL.
        #[arg(long)]
        tools_url: Option<String>,
    },
    /// Start the tools service alone.
    Tools {
        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        /// Port to bind to.
        #[arg(short, long, default_value_t = 8081)]
        port: u16,
    },
    /// Route a single message and print the reply.
    Chat {
        /// The message to send.
        message: String,
        /// Session the interaction is filed under.
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Print the tool catalog as JSON.
    Catalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::from_env();

    match args.command {
        Command::Serve {
            host,
            port,
            tools_url,
        } => serve(config, &host, port, tools_url).await,
        Command::Tools { host, port } => tools(config, &host, port).await,
        Command::Chat { message, session } => chat(config, &message, session).await,
        Command::Catalog => catalog(),
    }
}

/// Initialize logging. `HEARTH_LOG_JSON=true` switches to JSON lines for
/// container environments; `RUST_LOG` overrides the level either way.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if Config::log_json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .compact()
            .init();
    }
}

/// Run the combined service, or the chat half alone when a remote tools
/// URL is configured (flag first, then `HEARTH_TOOLS_URL`).
async fn serve(config: Config, host: &str, port: u16, tools_url: Option<String>) -> Result<()> {
    let addr = parse_addr(host, port)?;
    let engine = build_engine(&config).await?;
    let lifecycle = open_lifecycle(&config)?;

    let tools_url = tools_url.or_else(|| config.tools_url.clone());
    if let Some(url) = tools_url {
        info!("Delegating tool execution to {}", url);
        let invoker: Arc<dyn ToolInvoker> = Arc::new(HttpInvoker::new(&url)?);
        let router = Arc::new(RequestRouter::new(
            engine.clone(),
            invoker,
            lifecycle,
            config.net.default_ping_host.clone(),
        ));
        let app = hearth_api::chat_router(ChatState::new(router, engine));
        return hearth_api::run(addr, app).await;
    }

    let (hub, subscription) = connect_hub(&config)?.unzip();
    let registry = build_registry(&config, hub)?;
    let invoker: Arc<dyn ToolInvoker> = Arc::new(InProcessInvoker::new(registry.clone()));
    let router = Arc::new(RequestRouter::new(
        engine.clone(),
        invoker,
        lifecycle,
        config.net.default_ping_host.clone(),
    ));
    let app = hearth_api::combined_router(
        ToolsState::new(registry),
        ChatState::new(router, engine),
    );

    let result = hearth_api::run(addr, app).await;
    if let Some(handle) = subscription {
        handle.shutdown().await;
    }
    result
}

/// Run the tools service alone: the catalog, the executor, and the hub
/// subscription, with no engine or interaction storage.
async fn tools(config: Config, host: &str, port: u16) -> Result<()> {
    let addr = parse_addr(host, port)?;
    let (hub, subscription) = connect_hub(&config)?.unzip();
    let registry = build_registry(&config, hub)?;
    let app = hearth_api::tools_router(ToolsState::new(registry));

    let result = hearth_api::run(addr, app).await;
    if let Some(handle) = subscription {
        handle.shutdown().await;
    }
    result
}

/// Route one message through the full local stack and print the reply.
async fn chat(config: Config, message: &str, session: Option<String>) -> Result<()> {
    let session_id = session.unwrap_or_else(|| format!("cli-{:08x}", rand::random::<u32>()));

    let engine = build_engine(&config).await?;
    let lifecycle = open_lifecycle(&config)?;
    let (hub, subscription) = connect_hub(&config)?.unzip();
    let registry = build_registry(&config, hub)?;
    let invoker: Arc<dyn ToolInvoker> = Arc::new(InProcessInvoker::new(registry));
    let router = RequestRouter::new(
        engine,
        invoker,
        lifecycle,
        config.net.default_ping_host.clone(),
    );

    let reply = router.route(message, &session_id).await;
    println!("{}", reply.response);
    if reply.tools_used.is_empty() {
        println!("\n[{} | session {}]", reply.routing.as_str(), session_id);
    } else {
        println!(
            "\n[{} via {} | session {}]",
            reply.routing.as_str(),
            reply.tools_used.join(", "),
            session_id
        );
    }

    if let Some(handle) = subscription {
        handle.shutdown().await;
    }
    Ok(())
}

/// Print the fixed tool catalog as pretty JSON.
fn catalog() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&hearth_tools::catalog())?);
    Ok(())
}

fn parse_addr(host: &str, port: u16) -> Result<SocketAddr> {
    format!("{}:{}", host, port)
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid address: {}:{}", host, port))
}

/// Build the engine and log whether it is answering right now. An
/// unreachable backend is not fatal; chat degrades until it comes up.
async fn build_engine(config: &Config) -> Result<Arc<dyn TextEngine>> {
    let engine = OllamaEngine::new(OllamaConfig::from_config(&config.engine))?;
    if engine.is_available().await {
        info!(
            "Text engine ready: {} at {}",
            engine.model_name(),
            config.engine.endpoint
        );
    } else {
        warn!(
            "Text engine at {} is unreachable; chat degrades until it is up",
            config.engine.endpoint
        );
    }
    Ok(Arc::new(engine))
}

/// Connect the hub half: shared REST client, TTL state cache, and the
/// supervised push subscription that keeps the cache fresh. `None` when
/// no hub token is configured; device tools then answer with their
/// unconfigured error instead of failing startup.
fn connect_hub(config: &Config) -> Result<Option<(HubService, SubscriptionHandle)>> {
    let Some(conn) = HubConnectionConfig::from_config(&config.hub) else {
        warn!(
            "{} not set; device tools are unconfigured",
            env_vars::HUB_TOKEN
        );
        return Ok(None);
    };

    let cache = StateCache::with_ttl(Duration::from_secs(config.hub.state_ttl_secs));
    let client = HubClient::new(conn.clone())?;
    let handle = spawn_subscription(conn, cache.clone());
    Ok(Some((HubService::new(client, cache), handle)))
}

fn build_registry(config: &Config, hub: Option<HubService>) -> Result<Arc<ToolRegistry>> {
    let context = ToolContext::new(hub, config.net.clone(), config.sun.clone())?;
    Ok(Arc::new(ToolRegistry::new(context)))
}

fn open_lifecycle(config: &Config) -> Result<InteractionLifecycle> {
    let durable = DurableStore::open(config.storage.database_path())?;
    Ok(InteractionLifecycle::new(
        EphemeralStore::new(),
        Arc::new(durable),
    ))
}
