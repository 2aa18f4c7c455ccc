// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Binding Hashes
//!
//! The auxiliary hashes passed to the anchor contract next to the proof hash.
//!
//! - `inputsHash`: binds a proof hash to its (sorted) inputs and rule tags, so a
//!   replayed `proofHash` carrying different inputs is detectable.
//! - `ruleHash`: identifies the semantic rule (domain + operator) regardless of
//!   which contract deployment enforces it.
//!
//! Both are pure and recomputable without the full record.

use serde::{Deserialize, Serialize};

use crate::canonical::{hash_canonical, Value};
use crate::error::KernelResult;
use crate::types::hash::Hash256;
use crate::types::reference::{sort_references, Reference};

/// The hash triple derived from a proof record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalHashSet {
    pub proof_hash: Hash256,
    pub inputs_hash: Hash256,
    pub rule_hash: Hash256,
}

/// Hash of `[[sorted inputs...], domain, operator]` in canonical form.
///
/// Inputs are sorted here regardless of caller order: `(A,B)` and `(B,A)`
/// always bind to the same value.
pub fn compute_inputs_hash(
    inputs: &[Reference],
    domain: &str,
    operator: &str,
) -> KernelResult<Hash256> {
    let sorted = sort_references(inputs);
    let encoded = Value::Array(vec![
        Value::Array(sorted.into_iter().map(|r| Value::String(r.into())).collect()),
        Value::from(domain),
        Value::from(operator),
    ]);
    hash_canonical(&encoded)
}

/// Hash of `[domain, operator]` in canonical form.
pub fn compute_rule_hash(domain: &str, operator: &str) -> KernelResult<Hash256> {
    hash_canonical(&Value::Array(vec![Value::from(domain), Value::from(operator)]))
}

/// Rule hash over contract bytecode and address.
///
/// Ties the rule to one deployment, so a redeployed contract yields a new
/// hash for the same logical rule. Kept for reading old anchors only.
#[deprecated(note = "rule identity is semantic; use compute_rule_hash(domain, operator)")]
pub fn contract_rule_hash(bytecode: &[u8], contract_address: &str) -> Hash256 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(bytecode);
    hasher.update(contract_address.trim().to_ascii_lowercase().as_bytes());
    Hash256::from(hasher.finalize())
}

/// Which bound hash disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoundField {
    ProofHash,
    InputsHash,
    RuleHash,
}

impl BoundField {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundField::ProofHash => "proofHash",
            BoundField::InputsHash => "inputsHash",
            BoundField::RuleHash => "ruleHash",
        }
    }
}

/// A locally computed hash that differs from the one a ledger reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMismatch {
    pub field: BoundField,
    pub local: Hash256,
    pub reported: Hash256,
}

/// Hashes as reported back by a ledger event. Fields the event does not
/// carry are `None` and skipped during reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedHashes {
    pub proof_hash: Option<Hash256>,
    pub inputs_hash: Option<Hash256>,
    pub rule_hash: Option<Hash256>,
}

/// Compare every reported hash against the local set.
///
/// An empty result means the binding is consistent.
pub fn reconcile(local: &CanonicalHashSet, reported: &ReportedHashes) -> Vec<FieldMismatch> {
    let pairs = [
        (BoundField::ProofHash, local.proof_hash, reported.proof_hash),
        (BoundField::InputsHash, local.inputs_hash, reported.inputs_hash),
        (BoundField::RuleHash, local.rule_hash, reported.rule_hash),
    ];

    pairs
        .into_iter()
        .filter_map(|(field, local, reported)| match reported {
            Some(r) if r != local => Some(FieldMismatch { field, local, reported: r }),
            _ => None,
        })
        .collect()
}
