use crate::findings::{Finding, FindingKind, Severity};

/// Proportional witness-confidence model (§4.L). `total_witness` is every
/// witness entry observed; `background_noise`/`infrastructure_traffic` are
/// the classifier's first two buckets (§4.K); `total_executions` is the
/// size of the execution stream over the same window.
///
/// The `r == 0.05` boundary is folded into the zero-penalty tier rather than
/// the `r*100` tier — the only reading of §4.L/§8 together that satisfies
/// all three named boundary examples at once (documented in DESIGN.md).
///
/// §4.L also lists a flat `totalAgentEvents == 0 && totalExecutions > 0 ->
/// score 50` branch alongside the fixed `phantom_process`/`evidence_mismatch`
/// penalties, but applying both at once contradicts §8's S2 scenario
/// (`exec.command`, risk 9, no witness at all -> confidence 85, i.e. only the
/// 15-point phantom_process penalty, not 50+15). Reconciled by treating the
/// flat 50 as a "witnessing blackout" fallback that only fires when nothing
/// else already explains the gap — if a phantom_process/evidence_mismatch
/// finding is present, it carries the penalty on its own (documented in
/// DESIGN.md).
pub fn witness_confidence(
    total_witness: usize,
    background_noise: usize,
    infrastructure_traffic: usize,
    total_executions: usize,
    findings: &[Finding],
) -> i32 {
    let total_agent_events = total_witness.saturating_sub(background_noise + infrastructure_traffic);

    let phantom_count = findings
        .iter()
        .filter(|f| f.kind == FindingKind::PhantomProcess)
        .count();
    let evidence_count = findings
        .iter()
        .filter(|f| f.kind == FindingKind::EvidenceMismatch)
        .count();
    let fixed_penalty = (phantom_count + evidence_count) as f64 * 15.0;

    let proportional_penalty = if total_agent_events == 0 {
        if total_executions == 0 || fixed_penalty > 0.0 {
            0.0
        } else {
            50.0
        }
    } else {
        let unmatched_count = findings
            .iter()
            .filter(|f| {
                matches!(f.severity, Severity::Warning | Severity::Critical)
                    && !matches!(f.kind, FindingKind::TimingDiscrepancy | FindingKind::UnloggedObservation)
            })
            .count();
        let r = unmatched_count as f64 / total_agent_events as f64;
        if r <= 0.05 {
            0.0
        } else if r <= 0.20 {
            r * 100.0
        } else {
            20.0 + (r - 0.20) * 200.0
        }
    };

    let total_penalty = proportional_penalty + fixed_penalty;
    (100.0 - total_penalty).round().clamp(0.0, 100.0) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(kind: FindingKind, severity: Severity) -> Finding {
        Finding {
            kind,
            severity,
            detail: String::new(),
            witness_id: None,
            execution_id: None,
        }
    }

    #[test]
    fn no_events_and_no_executions_scores_100() {
        assert_eq!(witness_confidence(0, 0, 0, 0, &[]), 100);
    }

    #[test]
    fn no_agent_events_but_executions_exist_scores_50() {
        assert_eq!(witness_confidence(0, 0, 0, 3, &[]), 50);
    }

    #[test]
    fn ratio_exactly_five_percent_has_no_proportional_penalty() {
        // 1 unmatched out of 20 agent events = 5%.
        let findings = vec![finding(FindingKind::SilentNetwork, Severity::Warning)];
        assert_eq!(witness_confidence(20, 0, 0, 20, &findings), 100);
    }

    #[test]
    fn ratio_exactly_twenty_percent_penalizes_twenty() {
        // 4 unmatched out of 20 agent events = 20%.
        let findings = vec![
            finding(FindingKind::SilentNetwork, Severity::Warning),
            finding(FindingKind::SilentNetwork, Severity::Warning),
            finding(FindingKind::SilentNetwork, Severity::Warning),
            finding(FindingKind::SilentNetwork, Severity::Warning),
        ];
        assert_eq!(witness_confidence(20, 0, 0, 20, &findings), 80);
    }

    #[test]
    fn fully_unmatched_clamps_penalty_at_bottom() {
        // 20 unmatched out of 20 agent events = 100%: penalty 180, clamped to 100.
        let findings: Vec<Finding> = (0..20)
            .map(|_| finding(FindingKind::SilentNetwork, Severity::Warning))
            .collect();
        assert_eq!(witness_confidence(20, 0, 0, 20, &findings), 0);
    }

    #[test]
    fn phantom_process_adds_fixed_penalty() {
        let findings = vec![finding(FindingKind::PhantomProcess, Severity::Critical)];
        assert_eq!(witness_confidence(20, 0, 0, 20, &findings), 85);
    }

    #[test]
    fn phantom_process_with_zero_witness_activity_scores_85_not_35() {
        // §8 S2: exec.command, risk 9, no witness at all. The fixed
        // phantom_process penalty alone explains the gap, so the flat
        // no-coverage penalty does not additionally stack.
        let findings = vec![finding(FindingKind::PhantomProcess, Severity::Critical)];
        assert_eq!(witness_confidence(0, 0, 0, 1, &findings), 85);
    }
}
