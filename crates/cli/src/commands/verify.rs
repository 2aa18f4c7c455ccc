// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anchor_kernel::Hash256;
use anchor_node::config::NodeConfig;
use anchor_node::errors::AnchorError;
use anchor_node::network::{GatewayClient, GatewayLedger, GatewayLog};
use anchor_node::verifier::{VerificationReport, Verifier};

/// Triple-equality check of an anchored transaction.
pub fn run(
    config: &NodeConfig,
    transaction_id: &str,
    expected: Option<&str>,
) -> anyhow::Result<VerificationReport> {
    let expected = expected
        .map(|h| h.parse::<Hash256>())
        .transpose()
        .map_err(AnchorError::from)?;

    let client = GatewayClient::new(&config.gateway_url, config.auth_token.clone())?;
    let verifier = Verifier::new(config, GatewayLog::new(client.clone()), GatewayLedger::new(client));
    Ok(verifier.verify(transaction_id, expected)?)
}
