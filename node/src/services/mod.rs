// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! External Services
//!
//! The two collaborators a submission touches: an append-only log that
//! stores canonical records, and a ledger contract that binds their hashes.
//! Both are synchronous; the HTTP node drives them from the blocking pool.
//!
//! # Anchor contract protocol
//! - `anchorProof` takes canonical JSON args
//!   `{"inputsHash","proofHash","ruleHash","uri"}` and emits `ProofAnchored`
//!   on first sight of a proof hash, `ProofAlreadyRecorded` (with the
//!   original binding) afterwards.
//! - `lookupProof` takes `{"proofHash"}` and is read-only: it emits
//!   `ProofAlreadyRecorded` when bound and nothing otherwise.

pub mod file_log;
pub mod memory;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use anchor_kernel::binding::{CanonicalHashSet, ReportedHashes};
use anchor_kernel::canonical::to_canonical_bytes;
use anchor_kernel::config::{EVENT_PROOF_ALREADY_RECORDED, EVENT_PROOF_ANCHORED};
use anchor_kernel::{ConsensusTimestamp, Hash256};

use crate::errors::AnchorError;

pub use file_log::FileLog;
pub use memory::{InMemoryLedger, InMemoryLog};

pub const FN_ANCHOR_PROOF: &str = "anchorProof";
pub const FN_LOOKUP_PROOF: &str = "lookupProof";

/// Where an appended message landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendReceipt {
    pub sequence_number: u64,
    pub timestamp: ConsensusTimestamp,
}

pub trait AppendLog {
    /// Store `message` at the tail of `topic_id`. Not idempotent.
    fn append(&self, topic_id: &str, message: &[u8]) -> Result<AppendReceipt, AnchorError>;

    /// Fetch the message stored at `timestamp`, `None` when nothing is there.
    fn read_at(
        &self,
        topic_id: &str,
        timestamp: ConsensusTimestamp,
    ) -> Result<Option<Vec<u8>>, AnchorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    Success,
    Reverted,
    InvalidSelector,
    InsufficientGas,
    InvalidContractId,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Success => "SUCCESS",
            TxStatus::Reverted => "REVERTED",
            TxStatus::InvalidSelector => "INVALID_SELECTOR",
            TxStatus::InsufficientGas => "INSUFFICIENT_GAS",
            TxStatus::InvalidContractId => "INVALID_CONTRACT_ID",
        }
    }

    pub fn is_success(&self) -> bool {
        *self == TxStatus::Success
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named event with string fields, as a contract log decodes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub name: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl LedgerEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: BTreeMap::new() }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    fn hash_field(&self, key: &str) -> Result<Option<Hash256>, AnchorError> {
        self.field(key)
            .map(|raw| {
                raw.parse::<Hash256>().map_err(|e| {
                    AnchorError::UnrecognizedEvent(format!("{} field {}: {}", self.name, key, e))
                })
            })
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallReceipt {
    pub transaction_id: String,
    pub status: TxStatus,
    #[serde(default)]
    pub events: Vec<LedgerEvent>,
}

pub trait Ledger {
    fn call(&self, contract_id: &str, function: &str, args: &[u8]) -> Result<CallReceipt, AnchorError>;

    /// Receipt of a past state-changing call, `None` when unknown.
    fn transaction(&self, transaction_id: &str) -> Result<Option<CallReceipt>, AnchorError>;
}

impl<T: AppendLog + ?Sized> AppendLog for Arc<T> {
    fn append(&self, topic_id: &str, message: &[u8]) -> Result<AppendReceipt, AnchorError> {
        (**self).append(topic_id, message)
    }

    fn read_at(&self, topic_id: &str, timestamp: ConsensusTimestamp) -> Result<Option<Vec<u8>>, AnchorError> {
        (**self).read_at(topic_id, timestamp)
    }
}

impl<T: AppendLog + ?Sized> AppendLog for &T {
    fn append(&self, topic_id: &str, message: &[u8]) -> Result<AppendReceipt, AnchorError> {
        (**self).append(topic_id, message)
    }

    fn read_at(&self, topic_id: &str, timestamp: ConsensusTimestamp) -> Result<Option<Vec<u8>>, AnchorError> {
        (**self).read_at(topic_id, timestamp)
    }
}

impl<T: Ledger + ?Sized> Ledger for Arc<T> {
    fn call(&self, contract_id: &str, function: &str, args: &[u8]) -> Result<CallReceipt, AnchorError> {
        (**self).call(contract_id, function, args)
    }

    fn transaction(&self, transaction_id: &str) -> Result<Option<CallReceipt>, AnchorError> {
        (**self).transaction(transaction_id)
    }
}

impl<T: Ledger + ?Sized> Ledger for &T {
    fn call(&self, contract_id: &str, function: &str, args: &[u8]) -> Result<CallReceipt, AnchorError> {
        (**self).call(contract_id, function, args)
    }

    fn transaction(&self, transaction_id: &str) -> Result<Option<CallReceipt>, AnchorError> {
        (**self).transaction(transaction_id)
    }
}

/// Arguments of `anchorProof`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorCallArgs {
    pub proof_hash: Hash256,
    pub inputs_hash: Hash256,
    pub rule_hash: Hash256,
    pub uri: String,
}

impl AnchorCallArgs {
    pub fn new(hashes: &CanonicalHashSet, uri: impl Into<String>) -> Self {
        Self {
            proof_hash: hashes.proof_hash,
            inputs_hash: hashes.inputs_hash,
            rule_hash: hashes.rule_hash,
            uri: uri.into(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AnchorError> {
        Ok(to_canonical_bytes(self)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AnchorError> {
        serde_json::from_slice(bytes)
            .map_err(|e| AnchorError::InvalidInput(format!("anchorProof args: {}", e)))
    }
}

/// Arguments of `lookupProof`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupArgs {
    pub proof_hash: Hash256,
}

impl LookupArgs {
    pub fn to_bytes(&self) -> Result<Vec<u8>, AnchorError> {
        Ok(to_canonical_bytes(self)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AnchorError> {
        serde_json::from_slice(bytes)
            .map_err(|e| AnchorError::InvalidInput(format!("lookupProof args: {}", e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BindingOutcome {
    /// First binding of this proof hash.
    Fresh,
    /// The proof hash was already bound; fields describe that binding.
    Replay,
}

/// Decoded `ProofAnchored` / `ProofAlreadyRecorded` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorEvent {
    pub outcome: BindingOutcome,
    pub proof_hash: Hash256,
    pub inputs_hash: Option<Hash256>,
    pub rule_hash: Option<Hash256>,
    pub uri: String,
    /// Transaction that created the binding, carried by replay events.
    pub bound_transaction: Option<String>,
}

impl AnchorEvent {
    /// The first recognized anchor event in `receipt`, if any.
    pub fn from_receipt(receipt: &CallReceipt) -> Result<Option<Self>, AnchorError> {
        receipt
            .events
            .iter()
            .find_map(|event| {
                let outcome = match event.name.as_str() {
                    EVENT_PROOF_ANCHORED => BindingOutcome::Fresh,
                    EVENT_PROOF_ALREADY_RECORDED => BindingOutcome::Replay,
                    _ => return None,
                };
                Some(Self::decode(outcome, event))
            })
            .transpose()
    }

    fn decode(outcome: BindingOutcome, event: &LedgerEvent) -> Result<Self, AnchorError> {
        let proof_hash = event.hash_field("proofHash")?.ok_or_else(|| {
            AnchorError::UnrecognizedEvent(format!("{} without proofHash", event.name))
        })?;
        let uri = event
            .field("uri")
            .ok_or_else(|| AnchorError::UnrecognizedEvent(format!("{} without uri", event.name)))?
            .to_string();

        Ok(Self {
            outcome,
            proof_hash,
            inputs_hash: event.hash_field("inputsHash")?,
            rule_hash: event.hash_field("ruleHash")?,
            uri,
            bound_transaction: event.field("transactionId").map(str::to_string),
        })
    }

    pub fn reported(&self) -> ReportedHashes {
        ReportedHashes {
            proof_hash: Some(self.proof_hash),
            inputs_hash: self.inputs_hash,
            rule_hash: self.rule_hash,
        }
    }

    pub fn to_ledger_event(&self) -> LedgerEvent {
        let name = match self.outcome {
            BindingOutcome::Fresh => EVENT_PROOF_ANCHORED,
            BindingOutcome::Replay => EVENT_PROOF_ALREADY_RECORDED,
        };
        let mut event = LedgerEvent::new(name)
            .with_field("proofHash", self.proof_hash.to_hex())
            .with_field("uri", self.uri.clone());
        if let Some(h) = self.inputs_hash {
            event = event.with_field("inputsHash", h.to_hex());
        }
        if let Some(h) = self.rule_hash {
            event = event.with_field("ruleHash", h.to_hex());
        }
        if let Some(tx) = &self.bound_transaction {
            event = event.with_field("transactionId", tx.clone());
        }
        event
    }
}
