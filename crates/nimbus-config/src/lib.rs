// crates/nimbus-config/src/lib.rs
// ============================================================================
// Module: Nimbus Config Library
// Description: Canonical config model and validation for nimbus.toml.
// Purpose: Single source of truth for compute client configuration.
// Dependencies: nimbus-compute, serde, toml, url
// ============================================================================

//! ## Overview
//! `nimbus-config` loads and validates `nimbus.toml`, then turns it into a
//! ready [`nimbus_compute::ComputeClient`]. Validation is strict and fails
//! closed; tokens may be inlined or read from an environment variable.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
