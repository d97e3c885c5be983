//! Shared fixtures for building claim/execution/witness entries in tests
//! across the workspace (ground: `mqk-testkit`). Not used by any shipping
//! binary.

mod builders;
mod chaining;

pub use builders::{ClaimBuilder, ExecutionBuilder, WitnessBuilder};
pub use chaining::chain_entries;
