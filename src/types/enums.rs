// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Proof layer classification.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KernelError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Layer {
    /// Combination of inputs (mixing, merging). Input order is irrelevant.
    Additive = 0,
    /// Removal of one input from another. Input order is significant.
    Subtractive = 1,
    /// Claims about a single entity or an unordered set of entities.
    Entity = 2,
}

impl Layer {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Layer::Additive),
            1 => Some(Layer::Subtractive),
            2 => Some(Layer::Entity),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Additive => "additive",
            Layer::Subtractive => "subtractive",
            Layer::Entity => "entity",
        }
    }

    /// Whether inputs are sorted into canonical order inside the record.
    pub fn is_commutative(&self) -> bool {
        !matches!(self, Layer::Subtractive)
    }
}

impl Default for Layer {
    fn default() -> Self {
        Layer::Additive
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "additive" => Ok(Layer::Additive),
            "subtractive" => Ok(Layer::Subtractive),
            "entity" => Ok(Layer::Entity),
            other => Err(KernelError::InvalidInput(format!("unknown layer: {}", other))),
        }
    }
}
