// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Canonical BLAKE3 Hashing
//!
//! **BLAKE3 = the proof hash standard for this workspace.**
//!
//! Every hash that crosses a process boundary (proof hash, inputs hash,
//! rule hash, verifier recomputation) is BLAKE3 over canonical bytes.
//! Producer and verifier must agree; there is no algorithm negotiation.

use serde::Serialize;

use crate::canonical::encode::{canonicalize, to_canonical_bytes};
use crate::canonical::value::Value;
use crate::error::KernelResult;
use crate::types::hash::Hash256;

/// BLAKE3 of raw bytes.
pub fn hash_bytes(data: &[u8]) -> Hash256 {
    Hash256::from(blake3::hash(data))
}

/// Canonicalize, then hash.
pub fn hash_canonical(value: &Value) -> KernelResult<Hash256> {
    Ok(hash_bytes(&canonicalize(value)?))
}

/// Canonicalize a serializable type, then hash.
pub fn hash_serialize<T: Serialize + ?Sized>(value: &T) -> KernelResult<Hash256> {
    Ok(hash_bytes(&to_canonical_bytes(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blake3_bytes_hash() {
        let h1 = hash_bytes(b"test data");
        let h2 = hash_bytes(b"test data");
        assert_eq!(h1, h2);
        assert_ne!(h1, hash_bytes(b"test datb"));
    }

    #[test]
    fn test_hash_canonical_is_hash_of_bytes() {
        let v = Value::object([("b", Value::from(2u64)), ("a", Value::from(1u64))]);
        assert_eq!(hash_canonical(&v).unwrap(), hash_bytes(br#"{"a":1,"b":2}"#));
    }

    #[test]
    fn test_known_vector() {
        // BLAKE3("") reference digest.
        assert_eq!(
            hash_bytes(b"").to_hex(),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }
}
