// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

//! anchor-kernel: deterministic canonical-JSON hashing and proof binding.
//!
//! Pure, I/O-free core shared by the submitting node, the verifier and the
//! CLI. Everything here is recomputable from inputs alone.

pub mod config;
pub mod error;
pub mod types;
pub mod canonical;
pub mod binding;
pub mod proof;
pub mod locator;
pub mod verify;

pub use binding::{compute_inputs_hash, compute_rule_hash, CanonicalHashSet};
pub use canonical::{canonicalize, hash_canonical, Value};
pub use error::{KernelError, KernelResult};
pub use locator::{ConsensusTimestamp, ExternalAnchor, Locator};
pub use proof::{build_proof, BuiltProof, ProofBuilder, ProofParams, ProofRecord};
pub use types::{Hash256, Layer, Reference};

#[cfg(test)]
pub mod tests;
