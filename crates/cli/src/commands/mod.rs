// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod build;
pub mod canonicalize;
pub mod hashes;
pub mod locator;
pub mod submit;
pub mod verify;
