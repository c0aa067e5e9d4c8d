//! Background Removal Gateway - authenticated HTTP front for rembg.

use std::env;
use std::sync::Arc;

use tokio::net::TcpListener;

use rembg_gateway::{api, build_engine, logging, AppState, Config};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    println!("rembg-gateway {}", VERSION);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        print_version();
        return Ok(());
    }

    // Load configuration
    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Check config.toml (or the file named by REMBG_CONFIG) \
             and the REMBG__* environment variables.",
            e
        )
    })?;

    logging::init_tracing(&config.logging.level);
    tracing::info!("Starting rembg-gateway {}", VERSION);

    if config.auth.api_key().is_none() {
        tracing::warn!("No API key configured (X_API_KEY); authentication is disabled");
    }

    // Create engine and check it can be reached
    let engine = build_engine(&config.engine);
    tracing::info!("Using {} engine", engine.engine_type());

    let state = Arc::new(AppState::initialize(config.clone(), engine).await?);
    let app = api::app(state);

    // Start server
    let addr = config.server.address();
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
