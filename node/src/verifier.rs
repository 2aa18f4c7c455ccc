// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Triple-Equality Verifier
//!
//! Given a transaction reference: read the anchor event, follow its locator
//! into the log, recompute the stored record's hash and compare it with the
//! event (and an optional caller-supplied expectation).

use serde::Serialize;
use anchor_kernel::canonical::{canonicalize, hash_bytes, hash_canonical, Value};
use anchor_kernel::verify::{InputsBinding, TripleCheck, TripleHashes};
use anchor_kernel::{Hash256, Locator, ProofRecord};

use crate::config::NodeConfig;
use crate::errors::AnchorError;
use crate::retry::{with_retry, FixedBackoff, RetryPolicy};
use crate::services::{AnchorEvent, AppendLog, Ledger};
use crate::telemetry::VERIFICATIONS_TOTAL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub transaction_id: String,
    pub uri: String,
    #[serde(flatten)]
    pub check: TripleCheck,
    /// Whether the stored bytes were already in canonical form.
    pub stored_canonical: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<InputsBinding>,
}

impl VerificationReport {
    pub fn pass(&self) -> bool {
        self.check.pass
    }
}

pub struct Verifier<L, C> {
    log: L,
    ledger: C,
    read_retry: Box<dyn RetryPolicy>,
}

impl<L: AppendLog, C: Ledger> Verifier<L, C> {
    pub fn new(config: &NodeConfig, log: L, ledger: C) -> Self {
        Self {
            log,
            ledger,
            read_retry: Box::new(FixedBackoff::new(config.read_retries.max(1), config.read_retry_delay)),
        }
    }

    pub fn with_retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.read_retry = Box::new(policy);
        self
    }

    pub fn verify(
        &self,
        transaction_id: &str,
        expected: Option<Hash256>,
    ) -> Result<VerificationReport, AnchorError> {
        // 1. Event
        let receipt = with_retry(self.read_retry.as_ref(), "transaction fetch", || {
            self.ledger.transaction(transaction_id)
        })?
        .ok_or_else(|| AnchorError::NotFound(format!("transaction {}", transaction_id)))?;

        let event = AnchorEvent::from_receipt(&receipt)?.ok_or_else(|| {
            AnchorError::UnrecognizedEvent(format!(
                "transaction {} carries no ProofAnchored or ProofAlreadyRecorded event",
                transaction_id
            ))
        })?;

        // 2. Locator
        let locator = Locator::parse(&event.uri)?;

        // 3. Stored message
        let stored = with_retry(self.read_retry.as_ref(), "log read", || {
            self.log.read_at(&locator.topic_id, locator.timestamp)
        })?
        .ok_or_else(|| AnchorError::DanglingReference(locator.to_uri()))?;

        // 4. Recompute
        let (log_stored, stored_canonical) = match Value::from_slice(&stored) {
            Ok(value) => (hash_canonical(&value)?, canonicalize(&value)? == stored),
            Err(e) => {
                // Unparseable contents are compared by their raw hash.
                tracing::warn!(uri = %locator, "stored message is not JSON: {}", e);
                (hash_bytes(&stored), false)
            }
        };
        if !stored_canonical {
            tracing::warn!(uri = %locator, "stored message is not in canonical form");
        }

        let inputs = event.inputs_hash.and_then(|bound| match ProofRecord::from_slice(&stored) {
            Ok(record) => match record.inputs_hash() {
                Ok(recomputed) => Some(InputsBinding { bound, recomputed }),
                Err(e) => {
                    tracing::warn!(uri = %locator, "cannot recompute inputs hash: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!(uri = %locator, "stored message is not a proof record: {}", e);
                None
            }
        });

        // 5. Compare
        let check = TripleCheck::evaluate(
            TripleHashes {
                local: expected,
                event_emitted: event.proof_hash,
                log_stored,
            },
            inputs,
        );

        let result = if check.pass { "pass" } else { "fail" };
        metrics::counter!(VERIFICATIONS_TOTAL, 1, "result" => result);
        if check.pass {
            tracing::info!(tx = transaction_id, uri = %locator, "triple equality holds");
        } else {
            for m in &check.mismatches {
                tracing::warn!(tx = transaction_id, pair = m.pair.as_str(), left = %m.left, right = %m.right, "hash mismatch");
            }
        }

        Ok(VerificationReport {
            transaction_id: transaction_id.to_string(),
            uri: locator.to_uri(),
            check,
            stored_canonical,
            inputs,
        })
    }
}
