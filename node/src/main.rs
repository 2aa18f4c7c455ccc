// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;

use tokio::net::TcpListener;
use anchor_node::config::NodeConfig;
use anchor_node::errors::AnchorError;
use anchor_node::server::{build_router, AppState, SharedLog, SharedLedger};
use anchor_node::services::{FileLog, InMemoryLedger, InMemoryLog};

#[tokio::main]
async fn main() {
    anchor_node::telemetry::init_telemetry();

    if let Err(e) = run().await {
        tracing::error!("node failed: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run() -> Result<(), AnchorError> {
    let cfg = NodeConfig::from_env()?;
    tracing::info!("Initializing Anchor Node with config: {:?}", cfg);

    let log: SharedLog = match &cfg.log_path {
        Some(path) => {
            tracing::info!("Using file-backed log at {:?}", path);
            Arc::new(FileLog::open(path, cfg.max_message_bytes).map_err(|e| AnchorError::Config(e.to_string()))?)
        }
        None => Arc::new(InMemoryLog::new(cfg.max_message_bytes)),
    };
    let ledger: SharedLedger = Arc::new(InMemoryLedger::new(cfg.contract_id.clone(), cfg.operator_id.clone()));

    let addr = cfg.bind_addr;
    let app = build_router(AppState::new(cfg, log, ledger));

    tracing::info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AnchorError::Config(format!("cannot bind {}: {}", addr, e)))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| AnchorError::Internal(e.to_string()))
}
