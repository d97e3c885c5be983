use crate::greedy::{self, Candidate};
use crate::match_rules::{extract_hostname, hosts_match};
use crate::types::{clamp_confidence, time_skew_seconds, CorrelationResult, Discrepancy, DiscrepancyKind, Match, Severity};
use at_schemas::{ExecutionEntry, WitnessEntry, WitnessEvent, WitnessSource};

const WINDOW_SECS: f64 = 10.0;

/// §4.J network correlator: witness `connection_opened` against execution
/// with a URL/hostname-bearing action (`api.call`, `web.fetch`,
/// `web.search`, `web.browse`).
pub fn correlate(witnesses: &[WitnessEntry], executions: &[ExecutionEntry]) -> CorrelationResult {
    let mut candidates = Vec::new();

    for (wi, witness) in witnesses.iter().enumerate() {
        let WitnessEvent::ConnectionOpened {
            remote_host,
            remote_port,
            ..
        } = &witness.payload.event
        else {
            continue;
        };
        if witness.payload.source != WitnessSource::Network {
            continue;
        }

        for (ei, execution) in executions.iter().enumerate() {
            if !execution.payload.action.action_type.is_network() {
                continue;
            }
            let skew = time_skew_seconds(witness, execution);
            if skew.abs() > WINDOW_SECS {
                continue;
            }
            let execution_host = extract_hostname(&execution.payload.action.target);
            if !hosts_match(remote_host, execution_host) {
                continue;
            }

            let m = score(witness, execution, skew, *remote_port);
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
            matches!(w.payload.event, WitnessEvent::ConnectionOpened { .. }) && !matched_witness.contains(i)
        })
        .map(|(_, w)| w.id.clone())
        .collect();
    let unmatched_execution_ids = executions
        .iter()
        .enumerate()
        .filter(|(i, e)| e.payload.action.action_type.is_network() && !matched_execution.contains(i))
        .map(|(_, e)| e.id.clone())
        .collect();

    CorrelationResult {
        matches,
        unmatched_witness_ids,
        unmatched_execution_ids,
    }
}

fn score(witness: &WitnessEntry, execution: &ExecutionEntry, skew: f64, observed_port: Option<u16>) -> Match {
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

    if let Some(expected_port) = execution.payload.network_evidence_port() {
        if Some(expected_port) != observed_port {
            discrepancies.push(Discrepancy {
                kind: DiscrepancyKind::EvidenceMismatch,
                severity: Severity::Warning,
                detail: format!(
                    "execution recorded port {expected_port}, witness observed {:?}",
                    observed_port
                ),
            });
            confidence -= 15;
        }
    }

    Match {
        witness_id: witness.id.clone(),
        execution_id: execution.id.clone(),
        confidence: clamp_confidence(confidence),
        discrepancies,
    }
}
