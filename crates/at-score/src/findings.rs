use at_correlate::{ById, CorrelationReport, DiscrepancyKind};
use at_schemas::{ExecutionEntry, WitnessEntry, WitnessEvent};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl From<at_correlate::Severity> for Severity {
    fn from(s: at_correlate::Severity) -> Self {
        match s {
            at_correlate::Severity::Info => Severity::Info,
            at_correlate::Severity::Warning => Severity::Warning,
            at_correlate::Severity::Critical => Severity::Critical,
        }
    }
}

/// Every anomaly kind the glossary's "Finding" can name (§4.L, GLOSSARY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    TimingDiscrepancy,
    TargetDiscrepancy,
    EvidenceMismatch,
    PhantomProcess,
    UnwitnessedExecution,
    SilentFileAccess,
    SilentNetwork,
    UnloggedObservation,
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
}

const SENSITIVE_PATH_MARKERS: &[&str] = &[
    "/.ssh/",
    "/.env",
    "/.gnupg/",
    "/credentials",
    "/.aws/",
    "/id_rsa",
    "/id_ed25519",
];

fn is_sensitive_path(path: &str) -> bool {
    SENSITIVE_PATH_MARKERS.iter().any(|m| path.contains(m))
}

/// §4.L "Findings": matched-pair discrepancies, unwitnessed witnessable
/// executions, and agent-bucket unmatched witnesses.
pub fn build_findings(
    witnesses: &[WitnessEntry],
    executions: &[ExecutionEntry],
    report: &CorrelationReport,
) -> Vec<Finding> {
    let witness_by_id = ById::build(witnesses, |w| w.id.as_str());
    let execution_by_id = ById::build(executions, |e| e.id.as_str());
    let mut findings = Vec::new();

    for m in &report.matches {
        for d in &m.discrepancies {
            findings.push(Finding {
                kind: match d.kind {
                    DiscrepancyKind::TimingDiscrepancy => FindingKind::TimingDiscrepancy,
                    DiscrepancyKind::TargetDiscrepancy => FindingKind::TargetDiscrepancy,
                    DiscrepancyKind::EvidenceMismatch => FindingKind::EvidenceMismatch,
                },
                severity: d.severity.into(),
                detail: d.detail.clone(),
                witness_id: Some(m.witness_id.clone()),
                execution_id: Some(m.execution_id.clone()),
            });
        }
    }

    for execution_id in &report.unmatched_executions {
        let Some(execution) = execution_by_id.get(execution_id) else {
            continue;
        };
        let action_type = execution.payload.action.action_type;
        if !action_type.is_witnessable() {
            continue;
        }
        if action_type.is_exec() {
            findings.push(Finding {
                kind: FindingKind::PhantomProcess,
                severity: Severity::Critical,
                detail: "executed command has no corresponding process-spawn witness".into(),
                witness_id: None,
                execution_id: Some(execution.id.clone()),
            });
        } else {
            let severity = if execution.payload.risk.score >= 7 {
                Severity::Critical
            } else {
                Severity::Warning
            };
            findings.push(Finding {
                kind: FindingKind::UnwitnessedExecution,
                severity,
                detail: "witnessable execution has no corresponding witness observation".into(),
                witness_id: None,
                execution_id: Some(execution.id.clone()),
            });
        }
    }

    for witness_id in &report.classification.agent_observations {
        let Some(witness) = witness_by_id.get(witness_id) else {
            continue;
        };
        match &witness.payload.event {
            WitnessEvent::FileCreated { path, .. }
            | WitnessEvent::FileModified { path, .. }
            | WitnessEvent::FileDeleted { path, .. }
            | WitnessEvent::FileAccessed { path, .. } => {
                if is_sensitive_path(path) {
                    findings.push(Finding {
                        kind: FindingKind::SilentFileAccess,
                        severity: Severity::Warning,
                        detail: format!("unlogged access to sensitive path {path}"),
                        witness_id: Some(witness.id.clone()),
                        execution_id: None,
                    });
                }
            }
            WitnessEvent::ProcessSpawned { .. } | WitnessEvent::ProcessExited { .. } => {
                findings.push(Finding {
                    kind: FindingKind::UnloggedObservation,
                    severity: Severity::Info,
                    detail: "process activity observed with no matching execution".into(),
                    witness_id: Some(witness.id.clone()),
                    execution_id: None,
                });
            }
            WitnessEvent::ConnectionOpened { .. } | WitnessEvent::ConnectionClosed { .. } => {
                findings.push(Finding {
                    kind: FindingKind::SilentNetwork,
                    severity: Severity::Warning,
                    detail: "network activity observed with no matching execution".into(),
                    witness_id: Some(witness.id.clone()),
                    execution_id: None,
                });
            }
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use at_correlate::Classification;
    use at_correlate::CorrelationReport;

    fn empty_report() -> CorrelationReport {
        CorrelationReport {
            matches: vec![],
            unmatched_executions: vec![],
            classification: Classification::default(),
        }
    }

    #[test]
    fn empty_inputs_yield_no_findings() {
        let findings = build_findings(&[], &[], &empty_report());
        assert!(findings.is_empty());
    }
}
