// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Blocking clients for a node's devnet gateway routes.
//!
//! `GatewayLog` and `GatewayLedger` implement the service traits over HTTP,
//! so a submitter or verifier can run against a remote node.
//! They use `reqwest::blocking` and must not be called from inside an
//! async runtime thread.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use anchor_kernel::ConsensusTimestamp;

use crate::api::{
    decode_bytes, encode_bytes, AppendMessageRequest, AppendMessageResponse, ContractCallRequest,
    TopicMessageResponse,
};
use crate::errors::AnchorError;
use crate::services::{AppendLog, AppendReceipt, CallReceipt, Ledger};

#[derive(Debug, Clone)]
pub struct GatewayClient {
    base_url: Url,
    client: Client,
    auth_token: Option<String>,
}

impl GatewayClient {
    pub fn new(url: &str, auth_token: Option<String>) -> Result<Self, AnchorError> {
        let base_url = Url::parse(url.trim_end_matches('/'))
            .map_err(|e| AnchorError::Config(format!("gateway url {:?}: {}", url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AnchorError::Config(format!("gateway url {:?} cannot be a base", url)));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AnchorError::Config(e.to_string()))?;
        Ok(Self { base_url, client, auth_token })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, AnchorError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AnchorError::Config("gateway url cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, AnchorError> {
        self.authorized(req)
            .send()
            .map_err(|e| AnchorError::Network(e.to_string()))
    }
}

/// Turn a non-success response into the error it reports.
fn error_from_response(resp: Response) -> AnchorError {
    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return AnchorError::Config(format!("gateway refused credentials ({}); check ANCHOR_AUTH_TOKEN", status));
    }
    let body: serde_json::Value = resp.json().unwrap_or_default();
    let message = body
        .get("error")
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
        .to_string();

    match body.get("kind").and_then(|v| v.as_str()) {
        Some("InvalidInput") => AnchorError::InvalidInput(message),
        Some("InvalidLocator") => AnchorError::InvalidLocator(message),
        Some("AppendFailure") | Some("PayloadTooLargeError") => AnchorError::AppendFailure(message),
        Some("NotFoundError") => AnchorError::NotFound(message),
        _ if status.is_server_error() => AnchorError::Network(format!("{}: {}", status, message)),
        _ => AnchorError::InvalidInput(format!("{}: {}", status, message)),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, AnchorError> {
    resp.json()
        .map_err(|e| AnchorError::Network(format!("malformed gateway response: {}", e)))
}

#[derive(Debug, Clone)]
pub struct GatewayLog {
    client: GatewayClient,
}

impl GatewayLog {
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }
}

impl AppendLog for GatewayLog {
    fn append(&self, topic_id: &str, message: &[u8]) -> Result<AppendReceipt, AnchorError> {
        let url = self.client.endpoint(&["v1", "topics", topic_id, "messages"])?;
        let body = AppendMessageRequest { message: encode_bytes(message) };
        let resp = self
            .client
            .send(self.client.client.post(url).json(&body))
            .map_err(AnchorError::into_append_failure)?;
        if !resp.status().is_success() {
            // Rejected credentials mean nothing was appended.
            return Err(match error_from_response(resp) {
                e @ AnchorError::Config(_) => e,
                e => e.into_append_failure(),
            });
        }
        let appended: AppendMessageResponse = read_json(resp).map_err(AnchorError::into_append_failure)?;
        Ok(AppendReceipt {
            sequence_number: appended.sequence_number,
            timestamp: appended.consensus_timestamp,
        })
    }

    fn read_at(&self, topic_id: &str, timestamp: ConsensusTimestamp) -> Result<Option<Vec<u8>>, AnchorError> {
        let ts = timestamp.to_string();
        let url = self.client.endpoint(&["v1", "topics", topic_id, "messages", &ts])?;
        let resp = self.client.send(self.client.client.get(url))?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => {
                let msg: TopicMessageResponse = read_json(resp)?;
                decode_bytes("message", &msg.message).map(Some)
            }
            _ => Err(error_from_response(resp)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GatewayLedger {
    client: GatewayClient,
}

impl GatewayLedger {
    pub fn new(client: GatewayClient) -> Self {
        Self { client }
    }
}

impl Ledger for GatewayLedger {
    fn call(&self, contract_id: &str, function: &str, args: &[u8]) -> Result<CallReceipt, AnchorError> {
        let url = self.client.endpoint(&["v1", "contracts", contract_id, "call"])?;
        let body = ContractCallRequest { function: function.to_string(), args: encode_bytes(args) };
        let resp = self.client.send(self.client.client.post(url).json(&body))?;
        if !resp.status().is_success() {
            return Err(error_from_response(resp));
        }
        read_json(resp)
    }

    fn transaction(&self, transaction_id: &str) -> Result<Option<CallReceipt>, AnchorError> {
        let url = self.client.endpoint(&["v1", "transactions", transaction_id])?;
        let resp = self.client.send(self.client.client.get(url))?;
        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => read_json(resp).map(Some),
            _ => Err(error_from_response(resp)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_escapes_segments() {
        let client = GatewayClient::new("http://127.0.0.1:3000/", None).unwrap();
        let url = client.endpoint(&["v1", "transactions", "0.0.1001@1.000000002"]).unwrap();
        assert_eq!(url.path(), "/v1/transactions/0.0.1001@1.000000002");

        let odd = client.endpoint(&["v1", "topics", "a/b", "messages"]).unwrap();
        assert_eq!(odd.path(), "/v1/topics/a%2Fb/messages");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(matches!(GatewayClient::new("not a url", None), Err(AnchorError::Config(_))));
        assert!(matches!(GatewayClient::new("mailto:x@y", None), Err(AnchorError::Config(_))));
    }
}
