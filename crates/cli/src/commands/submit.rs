// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::Path;

use anchor_kernel::ProofParams;
use anchor_node::config::NodeConfig;
use anchor_node::errors::AnchorError;
use anchor_node::network::{GatewayClient, GatewayLedger, GatewayLog};
use anchor_node::orchestrator::Submitter;

use crate::input::read_input;

/// Anchor a proof through a node's gateway.
pub fn run(config: &NodeConfig, params_path: &Path) -> anyhow::Result<serde_json::Value> {
    let raw = read_input(params_path)?;
    let params: ProofParams = serde_json::from_slice(&raw)
        .map_err(|e| AnchorError::InvalidInput(format!("proof params: {}", e)))?;

    let client = GatewayClient::new(&config.gateway_url, config.auth_token.clone())?;
    let submitter = Submitter::new(config, GatewayLog::new(client.clone()), GatewayLedger::new(client));

    let outcome = submitter.submit(params)?;
    tracing::info!(uri = %outcome.uri, replayed = outcome.replayed, "submitted");
    Ok(serde_json::to_value(&outcome)?)
}
