use crate::types::Match;

pub(crate) struct Candidate {
    pub witness_idx: usize,
    pub execution_idx: usize,
    pub abs_skew_ms: i64,
    pub witness_id: String,
    pub m: Match,
}

/// Greedy assignment shared by all three §4.J correlators: sort candidates
/// by lower absolute time skew, then lower witness id, and take each one
/// whose witness and execution are both still free (§4.J "Tie-breaks").
pub(crate) fn assign(mut candidates: Vec<Candidate>) -> (Vec<Match>, Vec<usize>, Vec<usize>) {
    candidates.sort_by(|a, b| {
        a.abs_skew_ms
            .cmp(&b.abs_skew_ms)
            .then_with(|| a.witness_id.cmp(&b.witness_id))
    });

    let mut used_witness = std::collections::HashSet::new();
    let mut used_execution = std::collections::HashSet::new();
    let mut matches = Vec::new();

    for candidate in candidates {
        if used_witness.contains(&candidate.witness_idx)
            || used_execution.contains(&candidate.execution_idx)
        {
            continue;
        }
        used_witness.insert(candidate.witness_idx);
        used_execution.insert(candidate.execution_idx);
        matches.push(candidate.m);
    }

    let matched_witness: Vec<usize> = used_witness.into_iter().collect();
    let matched_execution: Vec<usize> = used_execution.into_iter().collect();
    (matches, matched_witness, matched_execution)
}
