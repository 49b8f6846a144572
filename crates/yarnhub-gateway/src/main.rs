use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;
use yarnhub_assistant::{CompletionWaiter, OpenAiAssistants, PollPolicy};
use yarnhub_channels::WebhookClient;
use yarnhub_core::YarnhubConfig;

mod app;
mod http;

/// Relay chat and comment messages to a hosted assistant.
#[derive(Parser)]
#[command(name = "yarnhub", version)]
struct Cli {
    /// Path to the TOML config file (default: $YARNHUB_CONFIG or ./yarnhub.toml).
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the webhook gateway (default).
    Serve,
    /// Run the Discord bot, forwarding messages to the webhook.
    Discord,
    /// Watch a YouTube video's comments and answer the newest one.
    Youtube,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "yarnhub=info,yarnhub_assistant=info,yarnhub_channels=info,\
                 yarnhub_discord=info,yarnhub_youtube=info,tower_http=debug"
                    .into()
            }),
        )
        .init();

    let cli = Cli::parse();

    let config = YarnhubConfig::load(cli.config.as_deref()).map_err(|e| {
        tracing::error!(error = %e, "config load failed");
        e
    })?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Discord => run_discord(config).await,
        Command::Youtube => run_youtube(config).await,
    }
}

async fn serve(config: YarnhubConfig) -> anyhow::Result<()> {
    let assistant_id = config.assistant.assistant_id()?.to_string();
    let backend = OpenAiAssistants::from_config(&config.assistant)?;
    info!(
        base_url = %config.assistant.base_url,
        assistant_id = %assistant_id,
        "assistant backend: OpenAI Assistants"
    );

    let policy = PollPolicy::from_config(&config.assistant);
    let waiter = CompletionWaiter::new(Arc::new(backend), assistant_id)
        .with_policy(policy)
        .with_fallback(config.assistant.fallback_reply.clone());

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let state = Arc::new(app::AppState::new(config.gateway, waiter));
    let router = app::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("YarnHub gateway listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway stopped");
    Ok(())
}

async fn run_discord(config: YarnhubConfig) -> anyhow::Result<()> {
    let discord = config.channels.discord;
    let relay = WebhookClient::new(
        discord.webhook_url.clone(),
        Duration::from_secs(discord.request_timeout_secs),
    )?;
    info!(webhook = %relay.url(), "Discord adapter forwarding to webhook");

    let adapter = yarnhub_discord::DiscordAdapter::new(&discord, Arc::new(relay))?;

    tokio::select! {
        _ = adapter.run() => {}
        _ = shutdown_signal() => info!("Discord adapter stopping"),
    }
    Ok(())
}

async fn run_youtube(config: YarnhubConfig) -> anyhow::Result<()> {
    let youtube = config.channels.youtube;
    let api = yarnhub_youtube::YouTubeClient::from_config(&youtube)?;
    let relay = WebhookClient::new(
        youtube.webhook_url.clone(),
        Duration::from_secs(youtube.request_timeout_secs),
    )?;
    info!(
        video_id = %api.video_id(),
        webhook = %relay.url(),
        every_secs = youtube.poll_interval_secs,
        "watching YouTube comments"
    );

    let watcher = yarnhub_youtube::CommentWatcher::new(
        api,
        relay,
        Duration::from_secs(youtube.poll_interval_secs),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let task = tokio::spawn(watcher.run(shutdown_rx));

    shutdown_signal().await;
    let _ = shutdown_tx.send(true);
    task.await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
