// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anchor_kernel::config::{DEFAULT_LOCATOR_SCHEME, DEFAULT_MAX_MESSAGE_BYTES};

use crate::errors::AnchorError;

/// Startup configuration. Built once and passed into constructors.
#[derive(Clone)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    /// Bearer token required on every route when set.
    pub auth_token: Option<String>,
    pub topic_id: String,
    pub contract_id: String,
    pub contract_version: String,
    /// Signer recorded in proofs and payer of ledger transactions.
    pub operator_id: String,
    /// Base URL of the node the CLI talks to.
    pub gateway_url: String,
    /// Back the devnet log with a file instead of memory.
    pub log_path: Option<PathBuf>,
    pub max_message_bytes: usize,
    pub locator_scheme: String,
    pub read_retries: u32,
    pub read_retry_delay: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            auth_token: None,
            topic_id: "0.0.6006".to_string(),
            contract_id: "0.0.5005".to_string(),
            contract_version: "v1".to_string(),
            operator_id: "0.0.1001".to_string(),
            gateway_url: "http://127.0.0.1:3000".to_string(),
            log_path: None,
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            locator_scheme: DEFAULT_LOCATOR_SCHEME.to_string(),
            read_retries: 3,
            read_retry_delay: Duration::from_millis(250),
        }
    }
}

impl NodeConfig {
    pub fn from_env() -> Result<Self, AnchorError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay `ANCHOR_*` values from `lookup` onto the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AnchorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("ANCHOR_BIND_ADDR") {
            cfg.bind_addr = parse_var("ANCHOR_BIND_ADDR", &v)?;
        }
        if let Some(v) = get("ANCHOR_AUTH_TOKEN") {
            cfg.auth_token = Some(v);
        }
        if let Some(v) = get("ANCHOR_TOPIC_ID") {
            cfg.topic_id = v;
        }
        if let Some(v) = get("ANCHOR_CONTRACT_ID") {
            cfg.contract_id = v;
        }
        if let Some(v) = get("ANCHOR_CONTRACT_VERSION") {
            cfg.contract_version = v;
        }
        if let Some(v) = get("ANCHOR_OPERATOR_ID") {
            cfg.operator_id = v;
        }
        if let Some(v) = get("ANCHOR_GATEWAY_URL") {
            cfg.gateway_url = v;
        }
        if let Some(v) = get("ANCHOR_LOG_PATH") {
            cfg.log_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("ANCHOR_MAX_MESSAGE_BYTES") {
            cfg.max_message_bytes = parse_var("ANCHOR_MAX_MESSAGE_BYTES", &v)?;
        }
        if let Some(v) = get("ANCHOR_LOCATOR_SCHEME") {
            cfg.locator_scheme = v;
        }
        if let Some(v) = get("ANCHOR_READ_RETRIES") {
            cfg.read_retries = parse_var("ANCHOR_READ_RETRIES", &v)?;
        }
        if let Some(v) = get("ANCHOR_READ_RETRY_DELAY_MS") {
            cfg.read_retry_delay = Duration::from_millis(parse_var("ANCHOR_READ_RETRY_DELAY_MS", &v)?);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AnchorError> {
        if self.max_message_bytes == 0 {
            return Err(AnchorError::Config("max message bytes must be positive".into()));
        }
        for (name, value) in [
            ("topic id", &self.topic_id),
            ("contract id", &self.contract_id),
            ("operator id", &self.operator_id),
        ] {
            if value.is_empty() || value.contains('/') {
                return Err(AnchorError::Config(format!("invalid {}: {:?}", name, value)));
            }
        }
        // Any locator we would emit must parse back.
        anchor_kernel::Locator::new(
            self.locator_scheme.clone(),
            self.topic_id.clone(),
            anchor_kernel::ConsensusTimestamp::default(),
        )
        .map_err(|e| AnchorError::Config(e.to_string()))?;
        Ok(())
    }
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, AnchorError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e| AnchorError::Config(format!("{}={:?}: {}", key, value, e)))
}

impl fmt::Debug for NodeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeConfig")
            .field("bind_addr", &self.bind_addr)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("topic_id", &self.topic_id)
            .field("contract_id", &self.contract_id)
            .field("contract_version", &self.contract_version)
            .field("operator_id", &self.operator_id)
            .field("gateway_url", &self.gateway_url)
            .field("log_path", &self.log_path)
            .field("max_message_bytes", &self.max_message_bytes)
            .field("locator_scheme", &self.locator_scheme)
            .field("read_retries", &self.read_retries)
            .field("read_retry_delay", &self.read_retry_delay)
            .finish()
    }
}
