//! The correlation engine (§4.J/§4.K): matches witness observations against
//! agent executions across three modalities, then classifies the leftovers.

mod by_id;
mod classify;
mod file_correlator;
mod greedy;
mod match_rules;
mod network_correlator;
mod process_correlator;
mod types;

pub use by_id::ById;
pub use classify::{classify, Classification};
pub use types::{CorrelationResult, Discrepancy, DiscrepancyKind, Match, Severity};

use at_config::InfrastructurePattern;
use at_schemas::{ExecutionEntry, WitnessEntry};

/// The combined output of running all three correlators then classifying
/// whatever is left over.
#[derive(Debug, Clone, Default)]
pub struct CorrelationReport {
    pub matches: Vec<Match>,
    pub unmatched_executions: Vec<String>,
    pub classification: Classification,
}

/// Runs the file, process, and network correlators independently (each
/// modality only ever competes against itself for a match — §4.J candidate
/// pairs are modality-scoped) and classifies the residue (§4.K).
pub fn correlate(
    witnesses: &[WitnessEntry],
    executions: &[ExecutionEntry],
    infrastructure_patterns: &[InfrastructurePattern],
) -> CorrelationReport {
    let file_result = file_correlator::correlate(witnesses, executions);
    let process_result = process_correlator::correlate(witnesses, executions);
    let network_result = network_correlator::correlate(witnesses, executions);

    let mut matches = Vec::new();
    matches.extend(file_result.matches);
    matches.extend(process_result.matches);
    matches.extend(network_result.matches);

    let mut unmatched_executions = Vec::new();
    unmatched_executions.extend(file_result.unmatched_execution_ids);
    unmatched_executions.extend(process_result.unmatched_execution_ids);
    unmatched_executions.extend(network_result.unmatched_execution_ids);

    // Witnesses outside the three modalities' candidate universe (e.g. a
    // `file_accessed` witness, which the file correlator doesn't pair at
    // all) are "unmatched" by construction — they never appear in any
    // correlator's own matched set either.
    let witness_by_id = ById::build(witnesses, |w| w.id.as_str());
    let matched_witness_ids: std::collections::HashSet<&str> =
        matches.iter().map(|m| m.witness_id.as_str()).collect();
    let unmatched: Vec<&WitnessEntry> = witnesses
        .iter()
        .map(|w| w.id.as_str())
        .filter(|id| !matched_witness_ids.contains(id))
        .filter_map(|id| witness_by_id.get(id))
        .collect();

    let classification = classify::classify(&unmatched, infrastructure_patterns);

    CorrelationReport {
        matches,
        unmatched_executions,
        classification,
    }
}
