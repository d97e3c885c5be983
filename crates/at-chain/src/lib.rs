//! Canonical serialization (§4.A) and the hash-chain primitive (§4.B).
//!
//! Both are pure: no I/O, no clock reads. Storage and recovery live in
//! `at-store`.

mod canonical;
mod hashchain;

pub use canonical::canonical_json;
pub use hashchain::{hash_entry, verify_chain, verify_entry_hash, ChainVerification};
