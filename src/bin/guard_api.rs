//! Wallet Guard API Server
//!
//! REST surface over the guard pipeline.
//!
//! Usage:
//!   cargo run --bin guard_api
//!
//! Environment:
//!   PORT / GUARD_PORT   - Server port (default: 8080)
//!   GUARD_HOST          - Server host (default: 0.0.0.0)
//!   GUARD_RPC_URL       - JSON-RPC node for gas simulation (optional)
//!   GUARD_SENSITIVITY   - low | medium | high
//!   RUST_LOG            - Log filter (default: info)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wallet_guard::api::{create_router, AppState};
use wallet_guard::{GuardAnalyzer, GuardConfig, APP_NAME, APP_VERSION};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = GuardConfig::from_env();
    let analyzer = GuardAnalyzer::from_config(&config)?;
    let state = Arc::new(AppState::new(analyzer));
    let stats_state = state.clone();

    let app = create_router(state);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("🛡️ {} API v{} starting on http://{}", APP_NAME, APP_VERSION, addr);
    info!(
        enabled = config.settings.enabled,
        fail_open = config.settings.fail_open,
        sensitivity = ?config.settings.sensitivity,
        simulation = config.settings.rpc_url.is_some(),
        "Guard settings loaded"
    );
    info!("Endpoints:");
    info!("  POST /v1/check            - CHECK in, VERDICT out");
    info!("  POST /v1/analyze          - Full analysis of a provider call");
    info!("  POST /v1/address/screen   - Address heuristics");
    info!("  GET  /v1/stats            - Guard counters");
    info!("  GET  /v1/health           - Health check");

    let listener = TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("⚠️ Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("🛑 Shutdown signal received");
    let stats = stats_state.guard_state().stats();
    info!("   Checked: {}", stats.checked);
    info!("   Warned:  {}", stats.warned);
    info!("   Blocked: {}", stats.blocked);
    info!("   Failures: {}", stats.internal_failures);
    info!("👋 {} API shutdown complete", APP_NAME);

    Ok(())
}
