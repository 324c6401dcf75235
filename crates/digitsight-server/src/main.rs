//! Digitsight server binary: load the checkpoint, bind, serve.

use anyhow::Result;
use clap::Parser;
use digitsight_classifier::SiglipDigitClassifier;
use digitsight_server::{create_router, AppState, Cli, ServerConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);

    info!("Starting Digitsight server");

    // Load configuration
    let config = ServerConfig::load(&cli.config, &cli)?;
    info!("Model: {} @ {}", config.model_repo, config.revision);
    info!("Device: {}", config.device);

    // Initialize metrics
    let metrics_handle = init_metrics()?;

    // Load the model. Failure here is fatal: the process must not come
    // up without a usable checkpoint.
    info!("Loading digit classifier...");
    let classifier_config = config.classifier_config()?;
    let classifier =
        tokio::task::spawn_blocking(move || SiglipDigitClassifier::load(&classifier_config))
            .await??;
    info!("Digit classifier loaded successfully");

    let state = AppState::new(Arc::new(classifier), metrics_handle);

    let addr: SocketAddr = format!("{}:{}", config.listen, config.port).parse()?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    // Graceful shutdown handler
    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("digitsight=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("digitsight=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "digitsight_requests_total",
        "Total number of inference requests received"
    );
    metrics::describe_counter!(
        "digitsight_errors_total",
        "Total number of error responses by status"
    );
    metrics::describe_histogram!(
        "digitsight_inference_latency_us",
        metrics::Unit::Microseconds,
        "Forward-pass latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
