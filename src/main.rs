//! Wagerhall server binary
//!
//! Starts the session engine and the HTTP API in front of it.

use clap::Parser;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use wagerhall::api::{create_router, AppState};
use wagerhall::broadcast::ChannelBroadcaster;
use wagerhall::config::ConfigLoader;
use wagerhall::engine::GameEngine;
use wagerhall::resolver::ThreadDraw;
use wagerhall::settlement::DryRunTransfer;

#[derive(Parser, Debug)]
#[command(name = "wagerhall")]
#[command(about = "Wagerhall game session server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long)]
    config: Option<String>,

    /// API server host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// API server port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Platform fee rate (overrides config)
    #[arg(long)]
    fee_rate: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wagerhall=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(ref path) = args.config {
        loader = loader.with_path(path);
    }
    let mut config = loader.load()?;
    if let Some(host) = args.host {
        config.api.listen_address = host;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(fee_rate) = args.fee_rate {
        config.engine.fee_rate = fee_rate;
    }
    ConfigLoader::new().validate(&config)?;

    let broadcaster = Arc::new(ChannelBroadcaster::new(1024));
    let engine = GameEngine::new(
        config.engine.clone(),
        broadcaster.clone(),
        Arc::new(DryRunTransfer),
        Arc::new(ThreadDraw),
    );

    // Keep a subscription alive so early events are not dropped before a
    // transport attaches; real delivery is the transport's concern.
    let mut events = broadcaster.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!(session_id = %event.session_id(), "event published");
        }
    });

    let state = Arc::new(AppState {
        engine: Arc::clone(&engine),
    });
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = format!("{}:{}", config.api.listen_address, config.api.port);
    info!(%addr, fee_rate = config.engine.fee_rate, "wagerhall listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    engine.shutdown();
    Ok(())
}
