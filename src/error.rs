// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Error types.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// Value has no canonical encoding (NaN, Infinity, malformed JSON).
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Canonical bytes exceed the external log's per-message cap.
    #[error("Payload too large: {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    #[error("Invalid hash: {0}")]
    InvalidHash(String),
}

pub type KernelResult<T> = core::result::Result<T, KernelError>;
pub type Result<T> = KernelResult<T>;
