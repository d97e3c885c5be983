//! §4.L: turns a correlation report into findings, folds those into a
//! proportional witness-confidence score, and composes the final weighted
//! trust verdict (ground: `mqk-risk`'s scoring/aggregation style — a pure
//! evaluator over typed inputs, no I/O).

mod findings;
mod verdict;
mod witness_confidence;

pub use findings::{build_findings, Finding, FindingKind, Severity};
pub use verdict::{compose_verdict, integrity_score, Components, TrustLevel, TrustVerdict};
pub use witness_confidence::witness_confidence;
