pub mod handlers;
pub mod state;
pub mod types;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::ledger::{BalanceService, LedgerStore};
use state::AppState;

/// Build the HTTP router over a balance service
pub fn router<S: LedgerStore + 'static>(balance: BalanceService<S>) -> Router {
    let state = Arc::new(AppState::new(balance));

    let balance_routes = Router::new()
        .route("/operations", post(handlers::apply_operation::<S>))
        .route("/{profile_id}", get(handlers::get_balance::<S>));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check::<S>))
        .nest("/api/v1/balance", balance_routes)
        .with_state(state)
}

/// Start HTTP Gateway server; returns after Ctrl-C
pub async fn run_server<S: LedgerStore + 'static>(
    host: &str,
    port: u16,
    balance: BalanceService<S>,
) -> anyhow::Result<()> {
    let store_name = balance.store().name();
    let app = router(balance);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} (port already in use?)", addr))?;

    tracing::info!(store = store_name, "Gateway listening on http://{}", addr);
    tracing::info!("Balance API: /api/v1/balance/*");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, keep serving
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
