// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use serde::{Deserialize, Serialize};
use anchor_kernel::ConsensusTimestamp;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::errors::AnchorError;

/// Message bodies travel base64-encoded.
pub fn encode_bytes(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

pub fn decode_bytes(field: &str, encoded: &str) -> Result<Vec<u8>, AnchorError> {
    BASE64
        .decode(encoded)
        .map_err(|e| AnchorError::InvalidInput(format!("{} is not valid base64: {}", field, e)))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AppendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendMessageResponse {
    pub topic_id: String,
    pub sequence_number: u64,
    pub consensus_timestamp: ConsensusTimestamp,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicMessageResponse {
    pub topic_id: String,
    pub consensus_timestamp: ConsensusTimestamp,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContractCallRequest {
    pub function: String,
    /// Base64 of the argument bytes.
    pub args: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    pub expected: Option<String>,
}
