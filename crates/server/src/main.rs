use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reliefmap_core::{
    load_config, validate_config, CountryCatalog, MapPipeline, ProcessRunner, ToolRunner,
};
use reliefmap_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("RELIEFMAP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Source datasets: {:?}", config.paths.source_dir);
    info!("Workspace root: {:?}", config.paths.workspace_root);
    info!("Public directory: {:?}", config.paths.public_dir);

    // Load country catalog
    let catalog = CountryCatalog::load(&config.paths.catalog_file)
        .await
        .with_context(|| format!("Failed to load catalog from {:?}", config.paths.catalog_file))?;
    info!("Country catalog loaded ({} countries)", catalog.len());

    // Create tool runner
    let stage_timeout = config.pipeline.stage_timeout_secs.map(Duration::from_secs);
    let runner: Arc<dyn ToolRunner> =
        Arc::new(ProcessRunner::new(config.tools.clone(), stage_timeout));
    match runner.validate().await {
        Ok(()) => info!("All pipeline tools found"),
        Err(e) => warn!("Pipeline tool check failed, runs will fail until fixed: {}", e),
    }

    // Create pipeline
    let pipeline = Arc::new(MapPipeline::new(&config, runner, Arc::new(catalog)));
    info!(
        "Map pipeline ready (max {} concurrent runs)",
        config.pipeline.max_concurrent_runs
    );

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), pipeline));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
