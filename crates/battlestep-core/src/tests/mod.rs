//! Test module for scenario, property and determinism tests.
//!
//! # Test Structure
//!
//! - `scenarios.rs`: Golden phase sequences for representative battles
//! - `properties.rs`: Property tests over generated battles
//! - `determinism.rs`: Idempotence and resumption across serialization
//! - `helpers.rs`: Unit factories, snapshots and a recording collaborator

pub mod helpers;
mod properties;

// Re-export for convenience
pub use helpers::*;
