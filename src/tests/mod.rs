pub mod locator_tests;

use crate::proof::{ProofOutput, ProofParams, RuleBinding};
use crate::types::{Layer, Reference};

pub(crate) const TOKEN_A: &str = "0.0.4801";
pub(crate) const TOKEN_B: &str = "0.0.4802";
pub(crate) const TOKEN_C: &str = "0.0.4803";
pub(crate) const FIXED_TS: &str = "2025-03-01T12:00:00.000Z";

pub(crate) fn refs(raw: &[&str]) -> Vec<Reference> {
    raw.iter().map(|r| Reference::new(r).unwrap()).collect()
}

/// The "light-mix / add-v1" scenario with a fixed timestamp.
pub(crate) fn light_mix_params(inputs: &[&str]) -> ProofParams {
    ProofParams {
        layer: Layer::Additive,
        domain: "light-mix".into(),
        operator: "add-v1".into(),
        inputs: refs(inputs),
        output: ProofOutput {
            token: Reference::new(TOKEN_C).unwrap(),
            amount: 1,
        },
        rule: RuleBinding {
            contract: "0.0.5005".into(),
            contract_version: "v2".into(),
        },
        signer: "0.0.1001".into(),
        log_topic: Some("0.0.6006".into()),
        timestamp: Some(FIXED_TS.into()),
    }
}
