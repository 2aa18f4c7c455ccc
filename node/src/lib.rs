// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod config;
pub mod errors;
pub mod api;
pub mod services;
pub mod retry;
pub mod orchestrator;
pub mod verifier;
pub mod network;
pub mod server;
pub mod telemetry;
