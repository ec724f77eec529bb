use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use edge_api::{app, config, AppState};

#[derive(Parser)]
#[command(name = "edge-api")]
#[command(about = "HTTP API with key-value and item storage behind bearer-token auth")]
#[command(version)]
struct Cli {
    #[arg(long, help = "Address to bind (overrides SERVER_HOST)")]
    host: Option<String>,

    #[arg(long, help = "Port to listen on (overrides PORT / EDGE_API_PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Apply the items schema at startup regardless of DATABASE_AUTO_MIGRATE")]
    init_schema: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, KV_BACKEND, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("edge_api=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = config::config().clone();
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if cli.init_schema {
        config.database.auto_migrate = true;
    }
    tracing::info!("Starting edge-api in {:?} mode", config.environment);

    let bind_addr = config.bind_address();
    let state = AppState::bootstrap(config)
        .await
        .context("failed to initialise storage")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("edge-api listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
