// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use anchor_kernel::binding::FieldMismatch;
use anchor_kernel::error::KernelError;

use crate::services::TxStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Payload too large: {size} bytes exceeds limit of {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// The log rejected or lost the append. Never retried.
    #[error("Append failed: {0}")]
    AppendFailure(String),

    #[error("Ledger rejected call with status {status}: {message}")]
    LedgerRejected { status: TxStatus, message: String },

    #[error("Binding mismatch: {}", describe_mismatches(.mismatches))]
    BindingMismatch { mismatches: Vec<FieldMismatch> },

    /// The ledger bound a different locator than the one just appended.
    #[error("Binding mismatch: appended at {local} but ledger bound {reported}")]
    LocatorMismatch { local: String, reported: String },

    #[error("Dangling reference: no message at {0}")]
    DanglingReference(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unrecognized event: {0}")]
    UnrecognizedEvent(String),

    /// Transport failure on a read. The only kind a retry policy acts on.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Stable name for each error variant, used in JSON bodies and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    EncodingError,
    PayloadTooLargeError,
    InvalidInput,
    InvalidLocator,
    AppendFailure,
    LedgerRejected,
    BindingMismatchError,
    DanglingReferenceError,
    NotFoundError,
    UnrecognizedEventError,
    Network,
    Config,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::EncodingError => "EncodingError",
            ErrorKind::PayloadTooLargeError => "PayloadTooLargeError",
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::InvalidLocator => "InvalidLocator",
            ErrorKind::AppendFailure => "AppendFailure",
            ErrorKind::LedgerRejected => "LedgerRejected",
            ErrorKind::BindingMismatchError => "BindingMismatchError",
            ErrorKind::DanglingReferenceError => "DanglingReferenceError",
            ErrorKind::NotFoundError => "NotFoundError",
            ErrorKind::UnrecognizedEventError => "UnrecognizedEventError",
            ErrorKind::Network => "Network",
            ErrorKind::Config => "Config",
            ErrorKind::Internal => "Internal",
        }
    }

    /// Process exit code. Codes below 10 are left to usage errors and
    /// failed verifications.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::EncodingError => 10,
            ErrorKind::PayloadTooLargeError => 11,
            ErrorKind::InvalidInput => 12,
            ErrorKind::InvalidLocator => 13,
            ErrorKind::AppendFailure => 20,
            ErrorKind::LedgerRejected => 21,
            ErrorKind::BindingMismatchError => 22,
            ErrorKind::Network => 23,
            ErrorKind::NotFoundError => 30,
            ErrorKind::UnrecognizedEventError => 31,
            ErrorKind::DanglingReferenceError => 32,
            ErrorKind::Config => 40,
            ErrorKind::Internal => 50,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::EncodingError
            | ErrorKind::InvalidInput
            | ErrorKind::InvalidLocator => StatusCode::BAD_REQUEST,
            ErrorKind::PayloadTooLargeError => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::NotFoundError => StatusCode::NOT_FOUND,
            ErrorKind::BindingMismatchError => StatusCode::CONFLICT,
            ErrorKind::UnrecognizedEventError
            | ErrorKind::DanglingReferenceError => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::AppendFailure
            | ErrorKind::LedgerRejected
            | ErrorKind::Network => StatusCode::BAD_GATEWAY,
            ErrorKind::Config | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AnchorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnchorError::Encoding(_) => ErrorKind::EncodingError,
            AnchorError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLargeError,
            AnchorError::InvalidInput(_) => ErrorKind::InvalidInput,
            AnchorError::InvalidLocator(_) => ErrorKind::InvalidLocator,
            AnchorError::AppendFailure(_) => ErrorKind::AppendFailure,
            AnchorError::LedgerRejected { .. } => ErrorKind::LedgerRejected,
            AnchorError::BindingMismatch { .. } | AnchorError::LocatorMismatch { .. } => {
                ErrorKind::BindingMismatchError
            }
            AnchorError::DanglingReference(_) => ErrorKind::DanglingReferenceError,
            AnchorError::NotFound(_) => ErrorKind::NotFoundError,
            AnchorError::UnrecognizedEvent(_) => ErrorKind::UnrecognizedEventError,
            AnchorError::Network(_) => ErrorKind::Network,
            AnchorError::Config(_) => ErrorKind::Config,
            AnchorError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, AnchorError::Network(_))
    }

    /// Rewrap anything that went wrong during an append as `AppendFailure`.
    pub fn into_append_failure(self) -> Self {
        match self {
            AnchorError::AppendFailure(_) => self,
            other => AnchorError::AppendFailure(other.to_string()),
        }
    }
}

fn describe_mismatches(mismatches: &[FieldMismatch]) -> String {
    mismatches
        .iter()
        .map(|m| format!("{} local={} reported={}", m.field.as_str(), m.local, m.reported))
        .collect::<Vec<_>>()
        .join("; ")
}

impl IntoResponse for AnchorError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let mut body = json!({
            "error": self.to_string(),
            "kind": kind.as_str(),
        });
        if let AnchorError::BindingMismatch { mismatches } = &self {
            body["mismatches"] = json!(mismatches);
        }
        if let AnchorError::LocatorMismatch { local, reported } = &self {
            body["locator"] = json!({ "local": local, "reported": reported });
        }

        (kind.status_code(), Json(body)).into_response()
    }
}

impl From<KernelError> for AnchorError {
    fn from(e: KernelError) -> Self {
        match e {
            KernelError::Encoding(msg) => AnchorError::Encoding(msg),
            KernelError::PayloadTooLarge { size, limit } => AnchorError::PayloadTooLarge { size, limit },
            KernelError::InvalidInput(msg) | KernelError::InvalidHash(msg) => AnchorError::InvalidInput(msg),
            KernelError::InvalidLocator(msg) => AnchorError::InvalidLocator(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_exit_codes_are_distinct() {
        let kinds = [
            ErrorKind::EncodingError,
            ErrorKind::PayloadTooLargeError,
            ErrorKind::InvalidInput,
            ErrorKind::InvalidLocator,
            ErrorKind::AppendFailure,
            ErrorKind::LedgerRejected,
            ErrorKind::BindingMismatchError,
            ErrorKind::DanglingReferenceError,
            ErrorKind::NotFoundError,
            ErrorKind::UnrecognizedEventError,
            ErrorKind::Network,
            ErrorKind::Config,
            ErrorKind::Internal,
        ];
        let codes: HashSet<i32> = kinds.iter().map(|k| k.exit_code()).collect();
        assert_eq!(codes.len(), kinds.len());
        assert!(codes.iter().all(|c| *c > 2));
    }

    #[test]
    fn test_kernel_errors_keep_their_kind() {
        let e: AnchorError = KernelError::PayloadTooLarge { size: 2000, limit: 1024 }.into();
        assert_eq!(e.kind(), ErrorKind::PayloadTooLargeError);
        let e: AnchorError = KernelError::InvalidLocator("x".into()).into();
        assert_eq!(e.kind(), ErrorKind::InvalidLocator);
    }

    #[test]
    fn test_append_failure_wrapping() {
        let e = AnchorError::Network("connection reset".into()).into_append_failure();
        assert_eq!(e.kind(), ErrorKind::AppendFailure);
        assert!(e.to_string().contains("connection reset"));
        assert!(!e.is_transient());
    }

    #[test]
    fn test_locator_mismatch_is_a_binding_mismatch() {
        let e = AnchorError::LocatorMismatch {
            local: "hcs://0.0.6006/1.000000001".into(),
            reported: "hcs://0.0.6006/2.000000002".into(),
        };
        assert_eq!(e.kind(), ErrorKind::BindingMismatchError);
        assert_eq!(e.exit_code(), 22);
        assert!(e.to_string().contains("2.000000002"));
    }
}
