use crate::greedy::{self, Candidate};
use crate::match_rules::paths_match;
use crate::types::{clamp_confidence, time_skew_seconds, CorrelationResult, Discrepancy, DiscrepancyKind, Match, Severity};
use at_schemas::{ActionType, ExecutionEntry, WitnessEntry, WitnessEvent};

const WINDOW_SECS: f64 = 10.0;

/// §4.J file correlator: witness `source=filesystem` against execution
/// `action.type ∈ {file.read, file.write, file.delete}`.
pub fn correlate(witnesses: &[WitnessEntry], executions: &[ExecutionEntry]) -> CorrelationResult {
    let mut candidates = Vec::new();

    for (wi, witness) in witnesses.iter().enumerate() {
        if witness.payload.source != at_schemas::WitnessSource::Filesystem {
            continue;
        }
        let Some(witness_path) = witness.payload.event.path() else {
            continue;
        };

        for (ei, execution) in executions.iter().enumerate() {
            if !execution.payload.action.action_type.is_file() {
                continue;
            }
            let skew = time_skew_seconds(witness, execution);
            if skew.abs() > WINDOW_SECS {
                continue;
            }
            if !paths_match(witness_path, &execution.payload.action.target) {
                continue;
            }

            let m = score(witness, execution, skew);
            candidates.push(Candidate {
                witness_idx: wi,
                execution_idx: ei,
                abs_skew_ms: (skew.abs() * 1000.0) as i64,
                witness_id: witness.id.clone(),
                m,
            });
        }
    }

    let (matches, matched_witness, matched_execution) = greedy::assign(candidates);

    let unmatched_witness_ids = witnesses
        .iter()
        .enumerate()
        .filter(|(i, w)| {
            w.payload.source == at_schemas::WitnessSource::Filesystem && !matched_witness.contains(i)
        })
        .map(|(_, w)| w.id.clone())
        .collect();
    let unmatched_execution_ids = executions
        .iter()
        .enumerate()
        .filter(|(i, e)| e.payload.action.action_type.is_file() && !matched_execution.contains(i))
        .map(|(_, e)| e.id.clone())
        .collect();

    CorrelationResult {
        matches,
        unmatched_witness_ids,
        unmatched_execution_ids,
    }
}

fn score(witness: &WitnessEntry, execution: &ExecutionEntry, skew: f64) -> Match {
    let mut confidence = 100;
    let mut discrepancies = Vec::new();

    if skew.abs() > 5.0 {
        discrepancies.push(Discrepancy {
            kind: DiscrepancyKind::TimingDiscrepancy,
            severity: Severity::Info,
            detail: format!("{skew:.1}s skew between witness and execution"),
        });
        confidence -= 5;
    }

    if event_type_mismatches_action(&witness.payload.event, execution.payload.action.action_type) {
        discrepancies.push(Discrepancy {
            kind: DiscrepancyKind::TargetDiscrepancy,
            severity: Severity::Critical,
            detail: "witnessed file event does not match the claimed action type".into(),
        });
        confidence = 70;
    }

    if let Some(expected) = execution.payload.file_evidence_content_hash_prefix() {
        if let Some(observed) = witness_content_hash(&witness.payload.event) {
            if expected != observed {
                discrepancies.push(Discrepancy {
                    kind: DiscrepancyKind::EvidenceMismatch,
                    severity: Severity::Warning,
                    detail: "content hash prefix differs from witnessed evidence".into(),
                });
                confidence -= 20;
            }
        }
    }

    Match {
        witness_id: witness.id.clone(),
        execution_id: execution.id.clone(),
        confidence: clamp_confidence(confidence),
        discrepancies,
    }
}

fn event_type_mismatches_action(event: &WitnessEvent, action_type: ActionType) -> bool {
    matches!(
        (event, action_type),
        (WitnessEvent::FileDeleted { .. }, ActionType::FileWrite | ActionType::FileRead)
            | (WitnessEvent::FileModified { .. } | WitnessEvent::FileCreated { .. }, ActionType::FileDelete)
    )
}

fn witness_content_hash(event: &WitnessEvent) -> Option<&str> {
    match event {
        WitnessEvent::FileCreated { stat: Some(s), .. }
        | WitnessEvent::FileModified { stat: Some(s), .. }
        | WitnessEvent::FileAccessed { stat: Some(s), .. } => s.content_hash_prefix.as_deref(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use at_schemas::{Action, ExecutionContext, ExecutionPayload, Outcome, OutcomeStatus, Risk};
    use chrono::Utc;

    fn execution_entry(id: &str, action_type: ActionType, target: &str) -> ExecutionEntry {
        ExecutionEntry {
            id: id.into(),
            v: at_schemas::CURRENT_VERSION,
            ts: Utc::now(),
            prev_hash: String::new(),
            hash: String::new(),
            payload: ExecutionPayload {
                agent: "agent-1".into(),
                session: "sess-1".into(),
                action: Action {
                    action_type,
                    target: target.into(),
                    detail: String::new(),
                },
                context: ExecutionContext {
                    goal: "g".into(),
                    trigger: "t".into(),
                    parent_action: None,
                },
                outcome: Outcome {
                    status: OutcomeStatus::Success,
                    duration_ms: None,
                    detail: None,
                },
                risk: Risk {
                    score: 1,
                    labels: vec![],
                    auto_flagged: false,
                },
                meta: None,
            },
        }
    }

    #[test]
    fn unwitnessed_file_create_execution_is_unmatched() {
        let executions = vec![execution_entry("e1", ActionType::FileCreate, "/tmp/new.txt")];
        let result = correlate(&[], &executions);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_execution_ids, vec!["e1".to_string()]);
    }
}
