// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Input/output references (token ids, account ids, EVM addresses).

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};

/// A normalized reference to a ledger entity.
///
/// Normalization: surrounding whitespace is trimmed and `0x`-prefixed hex
/// addresses are lowercased. Ordering is byte order of the normalized
/// string, which is the order used when sorting commutative inputs.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reference(String);

impl Reference {
    pub fn new(raw: impl AsRef<str>) -> KernelResult<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(KernelError::InvalidInput("empty reference".into()));
        }
        if trimmed.chars().any(|c| c.is_control()) {
            return Err(KernelError::InvalidInput(format!(
                "reference contains control characters: {:?}",
                trimmed
            )));
        }

        let normalized = if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            format!("0x{}", trimmed[2..].to_ascii_lowercase())
        } else {
            trimmed.to_string()
        };

        Ok(Reference(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl TryFrom<String> for Reference {
    type Error = KernelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Reference::new(value)
    }
}

impl From<Reference> for String {
    fn from(r: Reference) -> Self {
        r.0
    }
}

impl FromStr for Reference {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reference::new(s)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sorts references by the byte order of their normalized encoding.
pub fn sort_references(refs: &[Reference]) -> Vec<Reference> {
    let mut sorted = refs.to_vec();
    sorted.sort_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
    sorted
}
