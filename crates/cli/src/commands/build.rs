// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::Path;

use anchor_kernel::{ProofBuilder, ProofParams};
use anchor_node::errors::AnchorError;
use serde_json::json;

use crate::input::read_input;

/// Build a proof record from a params file. Touches no network.
///
/// `out` receives the exact canonical bytes that `submit` would append.
pub fn run(params_path: &Path, max_bytes: usize, out: Option<&Path>) -> anyhow::Result<serde_json::Value> {
    let raw = read_input(params_path)?;
    let params: ProofParams = serde_json::from_slice(&raw)
        .map_err(|e| AnchorError::InvalidInput(format!("proof params: {}", e)))?;

    let built = ProofBuilder::new(max_bytes).build(params).map_err(AnchorError::from)?;

    if let Some(out) = out {
        std::fs::write(out, &built.canonical_bytes)
            .map_err(|e| AnchorError::InvalidInput(format!("{}: {}", out.display(), e)))?;
    }

    Ok(json!({
        "hashes": built.hashes,
        "bytes": built.canonical_bytes.len(),
        "limit": max_bytes,
        "canonical": built.canonical_str(),
    }))
}
