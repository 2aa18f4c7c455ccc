// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anchor_kernel::{compute_inputs_hash, compute_rule_hash, Reference};
use anchor_node::errors::AnchorError;
use serde_json::json;

/// Binding hashes for a set of inputs and a rule, without building a record.
pub fn run(domain: &str, operator: &str, inputs: &[String]) -> anyhow::Result<serde_json::Value> {
    let refs = inputs
        .iter()
        .map(Reference::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(AnchorError::from)?;

    let inputs_hash = compute_inputs_hash(&refs, domain, operator).map_err(AnchorError::from)?;
    let rule_hash = compute_rule_hash(domain, operator).map_err(AnchorError::from)?;

    Ok(json!({
        "inputsHash": inputs_hash.to_hex(),
        "ruleHash": rule_hash.to_hex(),
    }))
}
