//! Honeypot Scan HTTP API Server
//!
//! REST API over the honeypot detection pipeline
//!
//! Usage:
//!   cargo run --bin honeypot_api
//!
//! Environment:
//!   PORT / HONEYPOT_PORT - Server port (default: 8080)
//!   HOST / HONEYPOT_HOST - Server host (default: 0.0.0.0)
//!   ETHERSCAN_API_KEY_1..6, ETHERSCAN_API_KEYS - Explorer API keys
//!   RUST_LOG             - Log level (default: info)

use honeypot_scan::api::{create_router, start_cleanup_task, AppState};
use honeypot_scan::AppConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    print_banner();

    let config = AppConfig::from_env();
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    // Create app state
    let state = Arc::new(AppState::new(config)?);
    let state_for_shutdown = state.clone();

    // Rate limiter windows and expired cache entries
    start_cleanup_task(state.clone());
    info!("🧹 Background cleanup task started");

    let app = create_router(state);

    info!("🚀 Honeypot Scan API starting on http://{}", addr);
    info!("📖 Health check: http://{}/v1/health", addr);
    info!("");
    info!("Endpoints:");
    info!("  POST /v1/scan          - Scan a deployed contract by address");
    info!("  POST /v1/scan/code     - Scan pasted Solidity source");
    info!("  POST /v1/scan/batch    - Scan up to 3 addresses");
    info!("  GET  /v1/patterns      - Detection pattern catalog");
    info!("  GET  /v1/stats         - Scan statistics");
    info!("  GET  /v1/health        - Health check");
    info!("");
    info!("Press Ctrl+C for graceful shutdown");
    info!("");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    // Graceful shutdown sequence
    info!("");
    info!("🛑 Shutdown signal received, cleaning up...");

    let stats = state_for_shutdown.analyzer.telemetry().get_stats();
    info!("   Total scans: {}", stats.total_scans);
    info!("   Code scans: {}", stats.code_scans);
    info!("   Honeypots detected: {}", stats.honeypots_detected);
    info!("   Errors: {}", stats.errors);
    if let Some(cache) = state_for_shutdown.analyzer.cache() {
        let cache_stats = cache.stats();
        info!(
            "   Cache: {} entries, {} hits, {} misses",
            cache_stats.entries, cache_stats.hits, cache_stats.misses
        );
    }

    info!("👋 Honeypot Scan API shutdown complete");

    Ok(())
}

fn print_banner() {
    println!(
        r#"
    ╔══════════════════════════════════════════════════════════════╗
    ║                                                              ║
    ║        H O N E Y P O T   S C A N                             ║
    ║                                                              ║
    ║        Static honeypot detection for EVM contracts           ║
    ║        Ethereum · Polygon · Arbitrum                         ║
    ║                                                              ║
    ╚══════════════════════════════════════════════════════════════╝
    "#
    );
}
