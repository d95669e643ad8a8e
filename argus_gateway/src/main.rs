mod config;
mod ws;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{routing::get, Json, Router};
use clap::Parser;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use argus_core::bus::{RobotBus, RosbridgeBus};
use argus_core::Relay;

use config::GatewayConfig;

#[derive(Parser, Debug)]
#[command(name = "argus_gateway")]
#[command(about = "ARGUS robot telemetry and command gateway", long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// rosbridge endpoint, overrides the config file
    #[arg(long)]
    bus_url: Option<String>,

    /// Directory served under /static, overrides the config file
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "argus_gateway=debug,argus_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => GatewayConfig::load(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(bus_url) = args.bus_url {
        config.bus_url = bus_url;
    }
    if let Some(static_dir) = args.static_dir {
        config.static_dir = Some(static_dir);
    }

    // The robot bus is a hard dependency: no listener until it is up.
    let bus = connect_bus(&config).await?;

    let relay = Arc::new(Relay::new(bus, config.relay_config()));
    relay.start().await.context("failed to start relay")?;

    let mut app = Router::new()
        .route("/ping", get(ping))
        .route("/ws/realtime", get(ws::realtime))
        .with_state(relay);

    if let Some(dir) = &config.static_dir {
        if dir.is_dir() {
            app = app.nest_service("/static", ServeDir::new(dir));
        } else {
            tracing::warn!("static dir {} missing, not serving /static", dir.display());
        }
    }

    // Add CORS and request tracing
    let app = app
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!("ARGUS gateway listening on {}", config.listen);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Dial the robot bus with capped exponential backoff. Returns an error
/// once the configured attempts are spent, which exits the process.
async fn connect_bus(config: &GatewayConfig) -> anyhow::Result<Arc<dyn RobotBus>> {
    let policy = &config.startup;
    let mut backoff = Duration::from_millis(policy.backoff_ms);
    let max_backoff = Duration::from_millis(policy.max_backoff_ms);

    for attempt in 1..=policy.max_attempts {
        match RosbridgeBus::connect(&config.bus_url).await {
            Ok(bus) => {
                tracing::info!("connected to robot bus {} (attempt {})", config.bus_url, attempt);
                return Ok(Arc::new(bus));
            }
            Err(e) => {
                tracing::warn!(
                    "robot bus connection failed (attempt {}/{}): {}",
                    attempt,
                    policy.max_attempts,
                    e
                );
            }
        }
        if attempt < policy.max_attempts {
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(max_backoff);
        }
    }

    anyhow::bail!(
        "robot bus {} unreachable after {} attempts",
        config.bus_url,
        policy.max_attempts
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {}", e);
    }
}
