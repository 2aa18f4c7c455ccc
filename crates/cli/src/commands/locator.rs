// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use anchor_kernel::Locator;
use anchor_node::errors::AnchorError;
use serde_json::json;

pub fn run(uri: &str) -> anyhow::Result<serde_json::Value> {
    let locator = Locator::parse(uri).map_err(AnchorError::from)?;
    Ok(json!({
        "scheme": locator.scheme,
        "topicId": locator.topic_id,
        "timestamp": locator.timestamp.to_string(),
        "uri": locator.to_uri(),
    }))
}
