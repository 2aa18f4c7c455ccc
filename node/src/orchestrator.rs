// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Submission Orchestrator
//!
//! Drives one proof through canonicalize -> idempotency guard -> append ->
//! bind -> reconcile.
//!
//! The append is the only non-idempotent step and is never retried. A
//! binding that fails after the append leaves an orphaned log message; it
//! is logged with its locator and not repaired.

use std::time::Instant;

use serde::Serialize;
use anchor_kernel::binding::{reconcile, BoundField, CanonicalHashSet, FieldMismatch};
use anchor_kernel::{BuiltProof, ExternalAnchor, Locator, ProofBuilder, ProofParams};

use crate::config::NodeConfig;
use crate::errors::AnchorError;
use crate::retry::{with_retry, FixedBackoff, RetryPolicy};
use crate::services::{
    AnchorCallArgs, AnchorEvent, AppendLog, BindingOutcome, CallReceipt, Ledger, LookupArgs,
    FN_ANCHOR_PROOF, FN_LOOKUP_PROOF,
};
use crate::telemetry::{BINDING_MISMATCHES_TOTAL, REPLAYS_TOTAL, SUBMISSIONS_TOTAL, SUBMIT_DURATION_SECONDS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    /// Where the record lives. For replays, the earlier binding's locator.
    pub locator: Locator,
    pub uri: String,
    /// Append result, present only when this submission appended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<ExternalAnchor>,
    pub receipt: CallReceipt,
    pub hashes: CanonicalHashSet,
    pub replayed: bool,
}

pub struct Submitter<L, C> {
    log: L,
    ledger: C,
    builder: ProofBuilder,
    topic_id: String,
    contract_id: String,
    scheme: String,
    read_retry: Box<dyn RetryPolicy>,
}

impl<L: AppendLog, C: Ledger> Submitter<L, C> {
    pub fn new(config: &NodeConfig, log: L, ledger: C) -> Self {
        Self {
            log,
            ledger,
            builder: ProofBuilder::new(config.max_message_bytes),
            topic_id: config.topic_id.clone(),
            contract_id: config.contract_id.clone(),
            scheme: config.locator_scheme.clone(),
            read_retry: Box::new(FixedBackoff::new(config.read_retries.max(1), config.read_retry_delay)),
        }
    }

    pub fn with_retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.read_retry = Box::new(policy);
        self
    }

    pub fn builder(&self) -> &ProofBuilder {
        &self.builder
    }

    pub fn submit(&self, params: ProofParams) -> Result<SubmitOutcome, AnchorError> {
        let built = self.builder.build(params)?;
        self.submit_built(&built)
    }

    pub fn submit_built(&self, built: &BuiltProof) -> Result<SubmitOutcome, AnchorError> {
        let started = Instant::now();
        let hashes = built.hashes;
        tracing::debug!(proof_hash = %hashes.proof_hash, bytes = built.canonical_bytes.len(), "submitting proof");

        // 1. Idempotency guard
        if let Some(previous) = self.lookup_binding(&hashes)? {
            return Ok(previous);
        }

        // 2. Append
        let receipt = self
            .log
            .append(&self.topic_id, &built.canonical_bytes)
            .map_err(AnchorError::into_append_failure)?;
        let anchor = ExternalAnchor {
            topic_id: self.topic_id.clone(),
            sequence_number: receipt.sequence_number,
            timestamp: receipt.timestamp,
        };
        let locator = anchor.locator(&self.scheme)?;
        let uri = locator.to_uri();
        tracing::info!(uri = %uri, seq = anchor.sequence_number, "record appended");

        // 3. Bind
        let args = AnchorCallArgs::new(&hashes, uri.clone()).to_bytes()?;
        let call = match self.ledger.call(&self.contract_id, FN_ANCHOR_PROOF, &args) {
            Ok(call) => call,
            Err(e) => {
                tracing::error!(uri = %uri, "orphaned append: bind call failed: {}", e);
                return Err(e);
            }
        };
        if !call.status.is_success() {
            tracing::error!(uri = %uri, tx = %call.transaction_id, status = %call.status, "orphaned append: bind rejected");
            return Err(AnchorError::LedgerRejected {
                status: call.status,
                message: format!("anchorProof in {}", call.transaction_id),
            });
        }

        // 4. Reconcile
        let event = match AnchorEvent::from_receipt(&call)? {
            Some(event) => event,
            None => {
                tracing::error!(uri = %uri, tx = %call.transaction_id, "orphaned append: no anchor event");
                return Err(AnchorError::UnrecognizedEvent(format!(
                    "transaction {} emitted no anchor event",
                    call.transaction_id
                )));
            }
        };

        if event.outcome == BindingOutcome::Replay {
            // A concurrent submitter bound this proof first.
            tracing::error!(uri = %uri, bound = %event.uri, "orphaned append: proof was bound concurrently");
            return self.resolve_replay(&hashes, event);
        }

        let mismatches = reconcile(&hashes, &event.reported());
        if !mismatches.is_empty() {
            metrics::counter!(BINDING_MISMATCHES_TOTAL, 1);
            tracing::error!(uri = %uri, tx = %call.transaction_id, "orphaned append: ledger reported different hashes");
            return Err(AnchorError::BindingMismatch { mismatches });
        }
        if event.uri != uri {
            metrics::counter!(BINDING_MISMATCHES_TOTAL, 1);
            tracing::error!(uri = %uri, reported = %event.uri, tx = %call.transaction_id, "orphaned append: ledger bound a different locator");
            return Err(AnchorError::LocatorMismatch { local: uri, reported: event.uri });
        }

        metrics::counter!(SUBMISSIONS_TOTAL, 1);
        metrics::histogram!(SUBMIT_DURATION_SECONDS, started.elapsed().as_secs_f64());
        tracing::info!(proof_hash = %hashes.proof_hash, tx = %call.transaction_id, "proof anchored");

        Ok(SubmitOutcome {
            locator,
            uri,
            anchor: Some(anchor),
            receipt: call,
            hashes,
            replayed: false,
        })
    }

    /// Read-only check whether `proof_hash` is already bound.
    fn lookup_binding(&self, hashes: &CanonicalHashSet) -> Result<Option<SubmitOutcome>, AnchorError> {
        let args = LookupArgs { proof_hash: hashes.proof_hash }.to_bytes()?;
        let receipt = with_retry(self.read_retry.as_ref(), "proof lookup", || {
            self.ledger.call(&self.contract_id, FN_LOOKUP_PROOF, &args)
        })?;
        if !receipt.status.is_success() {
            return Err(AnchorError::LedgerRejected {
                status: receipt.status,
                message: "lookupProof".into(),
            });
        }

        match AnchorEvent::from_receipt(&receipt)? {
            Some(event) if event.outcome == BindingOutcome::Replay => {
                self.resolve_replay(hashes, event).map(Some)
            }
            Some(_) => Err(AnchorError::UnrecognizedEvent(
                "lookupProof answered with a fresh-binding event".into(),
            )),
            None => Ok(None),
        }
    }

    /// Return the earlier binding after checking it binds the same inputs.
    fn resolve_replay(
        &self,
        hashes: &CanonicalHashSet,
        event: AnchorEvent,
    ) -> Result<SubmitOutcome, AnchorError> {
        if event.proof_hash != hashes.proof_hash {
            return Err(AnchorError::BindingMismatch {
                mismatches: vec![FieldMismatch {
                    field: BoundField::ProofHash,
                    local: hashes.proof_hash,
                    reported: event.proof_hash,
                }],
            });
        }
        match event.inputs_hash {
            Some(bound) if bound != hashes.inputs_hash => {
                metrics::counter!(BINDING_MISMATCHES_TOTAL, 1);
                tracing::warn!(proof_hash = %hashes.proof_hash, "replayed proof hash is bound to different inputs");
                return Err(AnchorError::BindingMismatch {
                    mismatches: vec![FieldMismatch {
                        field: BoundField::InputsHash,
                        local: hashes.inputs_hash,
                        reported: bound,
                    }],
                });
            }
            Some(_) => {}
            None => {
                return Err(AnchorError::UnrecognizedEvent(
                    "replay event carries no inputsHash".into(),
                ))
            }
        }

        let locator = Locator::parse(&event.uri)?;
        let bound_tx = event.bound_transaction.as_deref().ok_or_else(|| {
            AnchorError::UnrecognizedEvent("replay event carries no transactionId".into())
        })?;
        let receipt = with_retry(self.read_retry.as_ref(), "bound transaction fetch", || {
            self.ledger.transaction(bound_tx)
        })?
        .ok_or_else(|| AnchorError::NotFound(format!("bound transaction {}", bound_tx)))?;

        metrics::counter!(REPLAYS_TOTAL, 1);
        tracing::info!(proof_hash = %hashes.proof_hash, uri = %event.uri, "proof already recorded");

        Ok(SubmitOutcome {
            uri: locator.to_uri(),
            locator,
            anchor: None,
            receipt,
            hashes: *hashes,
            replayed: true,
        })
    }
}
