//! Balance Service entry point
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────────┐    ┌──────────────┐
//! │  Config  │───▶│ Gateway  │───▶│BalanceService│───▶│ LedgerStore  │
//! │  (YAML)  │    │  (axum)  │    │ (validation) │    │ (PG/memory)  │
//! └──────────┘    └──────────┘    └──────────────┘    └──────────────┘
//! ```
//!
//! Usage: `balance_service [--env dev] [--port 8080]`

use std::sync::Arc;

use anyhow::Context;
use balance_service::config::{AppConfig, StorageBackend};
use balance_service::db::Database;
use balance_service::gateway;
use balance_service::ledger::{BalanceService, MemoryLedger, PgLedger};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env)?;
    let _log_guard = balance_service::logging::init_logging(&app_config);

    tracing::info!(
        version = env!("GIT_HASH"),
        "Starting Balance Service in {} mode",
        env
    );

    let port = get_port_override().unwrap_or(app_config.gateway.port);
    let host = app_config.gateway.host.as_str();
    let timeout = app_config.operation_timeout();

    match app_config.storage.backend {
        StorageBackend::Postgres => {
            let url = app_config
                .storage
                .postgres_url
                .as_deref()
                .context("postgres_url is not configured")?;
            let db = Database::connect(
                url,
                app_config.storage.max_connections,
                app_config.storage.acquire_timeout_ms,
            )
            .await
            .context("Could not construct the pool")?;
            db.migrate().await.context("Could not apply ledger schema")?;

            let store = Arc::new(PgLedger::new(db.pool().clone()));
            gateway::run_server(host, port, BalanceService::with_timeout(store, timeout)).await
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory ledger: operations are lost on restart");
            let store = Arc::new(MemoryLedger::new());
            gateway::run_server(host, port, BalanceService::with_timeout(store, timeout)).await
        }
    }
}
