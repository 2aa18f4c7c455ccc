// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Canonical JSON
//!
//! Deterministic JSON encoding used as the sole input to proof hashing.
//!
//! # Rules
//! - No whitespace anywhere
//! - Object keys sorted by byte order (not locale)
//! - Integers in plain decimal; integral floats render as integers
//! - Other finite floats use the shortest round-trip decimal, never an exponent
//! - NaN / Infinity are rejected
//!
//! # Guarantee
//! Same logical value → same bytes → same hash (producer = verifier)

pub mod value;
pub mod encode;
pub mod blake3;

pub use value::{Number, Value};
pub use encode::{canonicalize, canonicalize_json, is_canonical, to_canonical_bytes};
pub use self::blake3::{hash_bytes, hash_canonical, hash_serialize};
