// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Proof Records and the Proof Builder.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::binding::{compute_inputs_hash, compute_rule_hash, CanonicalHashSet};
use crate::canonical::{hash_bytes, to_canonical_bytes};
use crate::config::{DEFAULT_MAX_MESSAGE_BYTES, PROOF_SCHEMA_VERSION};
use crate::error::{KernelError, KernelResult};
use crate::types::enums::Layer;
use crate::types::hash::Hash256;
use crate::types::reference::{sort_references, Reference};

/// Output of a proof claim: one reference plus an integer quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOutput {
    pub token: Reference,
    pub amount: u64,
}

/// The contract deployment a record is bound to, plus its semantic rule hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleMetadata {
    pub contract: String,
    pub contract_version: String,
    pub rule_hash: Hash256,
}

/// A claim anchored to the external log and ledger.
///
/// This struct is serialized canonically (sorted keys, no whitespace) and the
/// resulting bytes are what gets appended to the log and hashed into
/// `proofHash`. Field insertion order in memory never affects the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRecord {
    /// Schema version tag.
    pub version: String,
    pub layer: Layer,
    pub domain: String,
    pub operator: String,
    /// Sorted for commutative layers, caller order otherwise.
    pub inputs: Vec<Reference>,
    pub output: ProofOutput,
    pub rule_metadata: RuleMetadata,
    pub signer: String,
    /// RFC 3339 UTC.
    pub timestamp: String,
    /// Topic the record is destined for, when known before append.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_topic: Option<String>,
}

impl ProofRecord {
    pub fn canonical_bytes(&self) -> KernelResult<Vec<u8>> {
        to_canonical_bytes(self)
    }

    pub fn proof_hash(&self) -> KernelResult<Hash256> {
        Ok(hash_bytes(&self.canonical_bytes()?))
    }

    pub fn inputs_hash(&self) -> KernelResult<Hash256> {
        compute_inputs_hash(&self.inputs, &self.domain, &self.operator)
    }

    /// Recompute the full hash set from the record alone.
    pub fn hash_set(&self) -> KernelResult<CanonicalHashSet> {
        Ok(CanonicalHashSet {
            proof_hash: self.proof_hash()?,
            inputs_hash: self.inputs_hash()?,
            rule_hash: compute_rule_hash(&self.domain, &self.operator)?,
        })
    }

    /// Decode a record from log bytes (canonical or not).
    pub fn from_slice(bytes: &[u8]) -> KernelResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| KernelError::Encoding(format!("not a proof record: {}", e)))
    }
}

/// The contract deployment a new record binds to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBinding {
    pub contract: String,
    pub contract_version: String,
}

/// Caller-supplied parameters for [`ProofBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofParams {
    #[serde(default)]
    pub layer: Layer,
    pub domain: String,
    pub operator: String,
    pub inputs: Vec<Reference>,
    pub output: ProofOutput,
    pub rule: RuleBinding,
    pub signer: String,
    #[serde(default)]
    pub log_topic: Option<String>,
    /// RFC 3339; wall clock at build time when absent.
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A record together with its canonical bytes and derived hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltProof {
    pub record: ProofRecord,
    pub canonical_bytes: Vec<u8>,
    pub proof_hash: Hash256,
    pub hashes: CanonicalHashSet,
}

impl BuiltProof {
    /// Canonical bytes as a UTF-8 string (always valid UTF-8).
    pub fn canonical_str(&self) -> &str {
        std::str::from_utf8(&self.canonical_bytes).unwrap_or_default()
    }
}

/// Builds proof records. Pure apart from reading the clock when the caller
/// supplies no timestamp.
#[derive(Debug, Clone)]
pub struct ProofBuilder {
    version: String,
    max_payload_bytes: usize,
}

impl Default for ProofBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_BYTES)
    }
}

impl ProofBuilder {
    pub fn new(max_payload_bytes: usize) -> Self {
        Self {
            version: PROOF_SCHEMA_VERSION.to_string(),
            max_payload_bytes,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }

    /// Assemble, canonicalize and hash a proof record.
    ///
    /// # Errors
    /// - `InvalidInput` for empty domain/operator/signer/contract or no inputs
    /// - `Encoding` if the record cannot be canonicalized
    /// - `PayloadTooLarge` if the canonical bytes exceed the log's cap
    pub fn build(&self, params: ProofParams) -> KernelResult<BuiltProof> {
        // 1. Validate
        require_non_empty("domain", &params.domain)?;
        require_non_empty("operator", &params.operator)?;
        require_non_empty("signer", &params.signer)?;
        require_non_empty("rule.contract", &params.rule.contract)?;
        if params.inputs.is_empty() {
            return Err(KernelError::InvalidInput("at least one input is required".into()));
        }

        let timestamp = match params.timestamp {
            // Normalized to UTC millis so equal instants hash equally.
            Some(ts) => DateTime::parse_from_rfc3339(&ts)
                .map_err(|e| {
                    KernelError::InvalidInput(format!("timestamp {:?} is not RFC 3339: {}", ts, e))
                })?
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            None => Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        // 2. Normalize input order for commutative layers
        let inputs = if params.layer.is_commutative() {
            sort_references(&params.inputs)
        } else {
            params.inputs
        };

        // 3. Assemble
        let rule_hash = compute_rule_hash(&params.domain, &params.operator)?;
        let inputs_hash = compute_inputs_hash(&inputs, &params.domain, &params.operator)?;

        let record = ProofRecord {
            version: self.version.clone(),
            layer: params.layer,
            domain: params.domain,
            operator: params.operator,
            inputs,
            output: params.output,
            rule_metadata: RuleMetadata {
                contract: params.rule.contract,
                contract_version: params.rule.contract_version,
                rule_hash,
            },
            signer: params.signer,
            timestamp,
            log_topic: params.log_topic,
        };

        // 4. Canonicalize + size guard (before any network call)
        let canonical_bytes = record.canonical_bytes()?;
        if canonical_bytes.len() > self.max_payload_bytes {
            return Err(KernelError::PayloadTooLarge {
                size: canonical_bytes.len(),
                limit: self.max_payload_bytes,
            });
        }

        // 5. Hash
        let proof_hash = hash_bytes(&canonical_bytes);

        Ok(BuiltProof {
            record,
            canonical_bytes,
            proof_hash,
            hashes: CanonicalHashSet {
                proof_hash,
                inputs_hash,
                rule_hash,
            },
        })
    }
}

/// Build with the default schema version and an explicit size cap.
pub fn build_proof(params: ProofParams, max_payload_bytes: usize) -> KernelResult<BuiltProof> {
    ProofBuilder::new(max_payload_bytes).build(params)
}

fn require_non_empty(field: &str, value: &str) -> KernelResult<()> {
    if value.trim().is_empty() {
        return Err(KernelError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}
