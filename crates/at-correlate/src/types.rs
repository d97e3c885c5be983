use at_schemas::{ExecutionEntry, WitnessEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscrepancyKind {
    TimingDiscrepancy,
    TargetDiscrepancy,
    EvidenceMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    pub severity: Severity,
    pub detail: String,
}

/// One matched (witness, execution) pair produced by a §4.J correlator.
#[derive(Debug, Clone)]
pub struct Match {
    pub witness_id: String,
    pub execution_id: String,
    pub confidence: i32,
    pub discrepancies: Vec<Discrepancy>,
}

/// Everything one correlator produced for its modality: matches plus the
/// leftover witnesses/executions it could not pair.
#[derive(Debug, Clone, Default)]
pub struct CorrelationResult {
    pub matches: Vec<Match>,
    pub unmatched_witness_ids: Vec<String>,
    pub unmatched_execution_ids: Vec<String>,
}

pub(crate) fn clamp_confidence(score: i32) -> i32 {
    score.clamp(0, 100)
}

pub(crate) fn time_skew_seconds(witness: &WitnessEntry, execution: &ExecutionEntry) -> f64 {
    (witness.ts - execution.ts).num_milliseconds() as f64 / 1000.0
}
