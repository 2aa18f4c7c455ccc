// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::path::Path;

use anchor_kernel::canonical::{canonicalize, hash_bytes, Value};
use anchor_node::errors::AnchorError;
use serde_json::json;

use crate::input::read_input;

/// Canonicalize an arbitrary JSON document and hash it.
pub fn run(path: &Path) -> anyhow::Result<serde_json::Value> {
    let raw = read_input(path)?;
    let value = Value::from_slice(&raw).map_err(AnchorError::from)?;
    let canonical = canonicalize(&value).map_err(AnchorError::from)?;
    let hash = hash_bytes(&canonical);

    Ok(json!({
        "canonical": String::from_utf8_lossy(&canonical),
        "hash": hash.to_hex(),
        "bytes": canonical.len(),
        "inputWasCanonical": canonical == raw,
    }))
}
