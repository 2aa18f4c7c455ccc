// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! 256-bit digest type.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{KernelError, KernelResult};

/// A 32-byte digest.
///
/// Renders as lowercase hex without prefix. Parsing is case-insensitive and
/// accepts an optional `0x`/`0X` prefix, so hashes copied out of explorers
/// and contract logs compare equal to locally computed ones.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub const ZERO: Hash256 = Hash256([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// `0x`-prefixed form, as passed to contract calls.
    pub fn to_prefixed_hex(&self) -> String {
        format!("0x{}", self.to_hex())
    }

    pub fn from_hex(s: &str) -> KernelResult<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != 64 {
            return Err(KernelError::InvalidHash(format!(
                "expected 64 hex digits, found {}",
                digits.len()
            )));
        }

        let mut out = [0u8; 32];
        hex::decode_to_slice(digits, &mut out)
            .map_err(|e| KernelError::InvalidHash(e.to_string()))?;
        Ok(Hash256(out))
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Hash256(bytes)
    }
}

impl From<blake3::Hash> for Hash256 {
    fn from(hash: blake3::Hash) -> Self {
        Hash256(*hash.as_bytes())
    }
}

impl FromStr for Hash256 {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash256::from_hex(s)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({})", self.to_hex())
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_case_and_prefix_insensitive() {
        let lower = Hash256::from_hex(&"ab".repeat(32)).unwrap();
        let upper = Hash256::from_hex(&format!("0x{}", "AB".repeat(32))).unwrap();
        assert_eq!(lower, upper);
        assert_eq!(upper.to_hex(), "ab".repeat(32));
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(matches!(
            Hash256::from_hex("abcd"),
            Err(KernelError::InvalidHash(_))
        ));
        assert!(Hash256::from_hex(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let h = Hash256([7u8; 32]);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, format!("\"{}\"", "07".repeat(32)));
        let back: Hash256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, h);
    }
}
