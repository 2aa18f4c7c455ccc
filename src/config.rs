// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Configuration constants.

/// Schema version stamped into every proof record.
pub const PROOF_SCHEMA_VERSION: &str = "1.0";

/// Single-message cap of the external append-only log, in bytes.
pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 1024;

/// Scheme used when rendering log locators (`hcs://<topic>/<timestamp>`).
pub const DEFAULT_LOCATOR_SCHEME: &str = "hcs";

/// Event emitted by the anchor contract on a fresh binding.
pub const EVENT_PROOF_ANCHORED: &str = "ProofAnchored";

/// Event emitted by the anchor contract when the proof hash is already bound.
pub const EVENT_PROOF_ALREADY_RECORDED: &str = "ProofAlreadyRecorded";
