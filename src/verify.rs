// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Triple-Equality Comparison
//!
//! Pure comparison step of verification. Fetching the three sources is the
//! node's job; this module only decides pass/fail and names the pairs that
//! disagree.
//!
//! ```text
//! eventEmitted ── event-log ── logStored
//!        \                      /
//!     event-local          log-local
//!          \                  /
//!           local (optional, caller-supplied)
//! ```
//!
//! `pass` is true only when every available pair is equal. A single
//! mismatch is never reported as a partial pass.

use serde::{Deserialize, Serialize};

use crate::types::hash::Hash256;

/// The three independently obtained copies of the proof hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripleHashes {
    /// Caller-supplied expected hash, when one was given.
    pub local: Option<Hash256>,
    /// Hash carried by the ledger event.
    pub event_emitted: Hash256,
    /// Hash recomputed from the message fetched from the log.
    pub log_stored: Hash256,
}

/// A pair of sources that disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MismatchPair {
    EventLog,
    EventLocal,
    LogLocal,
    /// Inputs hash bound on-chain vs. recomputed from the stored record.
    Inputs,
}

impl MismatchPair {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchPair::EventLog => "event-log",
            MismatchPair::EventLocal => "event-local",
            MismatchPair::LogLocal => "log-local",
            MismatchPair::Inputs => "inputs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mismatch {
    pub pair: MismatchPair,
    pub left: Hash256,
    pub right: Hash256,
}

/// Inputs binding as bound on-chain and as recomputed from the log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputsBinding {
    pub bound: Hash256,
    pub recomputed: Hash256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripleCheck {
    pub pass: bool,
    pub hashes: TripleHashes,
    pub mismatches: Vec<Mismatch>,
}

impl TripleCheck {
    /// Compare all available pairs.
    pub fn evaluate(hashes: TripleHashes, inputs: Option<InputsBinding>) -> Self {
        let mut mismatches = Vec::new();

        if hashes.event_emitted != hashes.log_stored {
            mismatches.push(Mismatch {
                pair: MismatchPair::EventLog,
                left: hashes.event_emitted,
                right: hashes.log_stored,
            });
        }

        if let Some(local) = hashes.local {
            if hashes.event_emitted != local {
                mismatches.push(Mismatch {
                    pair: MismatchPair::EventLocal,
                    left: hashes.event_emitted,
                    right: local,
                });
            }
            if hashes.log_stored != local {
                mismatches.push(Mismatch {
                    pair: MismatchPair::LogLocal,
                    left: hashes.log_stored,
                    right: local,
                });
            }
        }

        if let Some(binding) = inputs {
            if binding.bound != binding.recomputed {
                mismatches.push(Mismatch {
                    pair: MismatchPair::Inputs,
                    left: binding.bound,
                    right: binding.recomputed,
                });
            }
        }

        Self {
            pass: mismatches.is_empty(),
            hashes,
            mismatches,
        }
    }

    pub fn disagrees(&self, pair: MismatchPair) -> bool {
        self.mismatches.iter().any(|m| m.pair == pair)
    }
}
