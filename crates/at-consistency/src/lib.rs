//! The consistency analyzer (§6.3 external collaborator, implemented for
//! real): pairs claims with executions via `execution.meta.claimId` and
//! emits the eight named finding kinds, then folds them into a single
//! 0-100 `computeConsistencyScore` the trust verdict (§4.L) composes with.

use at_schemas::{ClaimEntry, ExecutionEntry, ExpectedOutcome, OutcomeStatus};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// The eight finding kinds of §6.3. Severity and penalty are fixed per kind
/// (the §9 Open Question this resolves: the spec names the kinds but not a
/// uniform severity-to-penalty table; the mapping is documented in
/// DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyFindingKind {
    TargetMismatch,
    ActionTypeMismatch,
    RiskUnderestimate,
    ScopeViolation,
    EscalationUndeclared,
    OutcomeUnexpected,
    UnclaimedExecution,
    UnfulfilledClaim,
}

impl ConsistencyFindingKind {
    pub fn severity(self) -> Severity {
        use ConsistencyFindingKind::*;
        match self {
            TargetMismatch | ScopeViolation | EscalationUndeclared => Severity::Critical,
            ActionTypeMismatch | RiskUnderestimate | OutcomeUnexpected | UnclaimedExecution => {
                Severity::Warning
            }
            UnfulfilledClaim => Severity::Info,
        }
    }

    fn penalty(self) -> i32 {
        match self.severity() {
            Severity::Critical => 20,
            Severity::Warning => 10,
            Severity::Info => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConsistencyFinding {
    pub kind: ConsistencyFindingKind,
    pub severity: Severity,
    pub detail: String,
    pub claim_id: Option<String>,
    pub execution_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConsistencyReport {
    pub findings: Vec<ConsistencyFinding>,
    /// `computeConsistencyScore` (§6.3): 100 minus the sum of fixed
    /// per-finding penalties, clamped to [0, 100].
    pub score: i32,
}

/// Pairs `claims` and `executions` by `execution.meta.claimId` (the
/// back-reference a claim's own forward `execution.executionEntryId` also
/// satisfies) and evaluates the eight finding kinds over the result.
pub fn evaluate(claims: &[ClaimEntry], executions: &[ExecutionEntry]) -> ConsistencyReport {
    let claims_by_id: HashMap<&str, &ClaimEntry> =
        claims.iter().map(|c| (c.id.as_str(), c)).collect();
    let executions_by_id: HashMap<&str, &ExecutionEntry> =
        executions.iter().map(|e| (e.id.as_str(), e)).collect();

    let mut fulfilled_claim_ids: HashSet<&str> = HashSet::new();
    let mut findings = Vec::new();

    for execution in executions {
        match execution.payload.claim_id() {
            Some(claim_id) => match claims_by_id.get(claim_id) {
                Some(claim) => {
                    fulfilled_claim_ids.insert(claim_id);
                    findings.extend(check_pair(claim, execution));
                }
                None => findings.push(ConsistencyFinding {
                    kind: ConsistencyFindingKind::UnclaimedExecution,
                    severity: ConsistencyFindingKind::UnclaimedExecution.severity(),
                    detail: format!("execution references missing claim {claim_id}"),
                    claim_id: Some(claim_id.to_string()),
                    execution_id: Some(execution.id.clone()),
                }),
            },
            None => findings.push(ConsistencyFinding {
                kind: ConsistencyFindingKind::UnclaimedExecution,
                severity: ConsistencyFindingKind::UnclaimedExecution.severity(),
                detail: "execution carries no claimId".into(),
                claim_id: None,
                execution_id: Some(execution.id.clone()),
            }),
        }
    }

    for claim in claims {
        if fulfilled_claim_ids.contains(claim.id.as_str()) {
            continue;
        }
        // A claim's own forward reference still counts as fulfilled even if
        // no execution pointed back at it.
        if let Some(exec_ref) = claim
            .payload
            .execution
            .as_ref()
            .and_then(|e| e.execution_entry_id.as_deref())
        {
            if executions_by_id.contains_key(exec_ref) {
                continue;
            }
        }
        findings.push(ConsistencyFinding {
            kind: ConsistencyFindingKind::UnfulfilledClaim,
            severity: ConsistencyFindingKind::UnfulfilledClaim.severity(),
            detail: "claim has no corresponding execution".into(),
            claim_id: Some(claim.id.clone()),
            execution_id: None,
        });
    }

    let score = compute_consistency_score(&findings);
    ConsistencyReport { findings, score }
}

fn check_pair(claim: &ClaimEntry, execution: &ExecutionEntry) -> Vec<ConsistencyFinding> {
    let mut out = Vec::new();
    let intent = &claim.payload.intent;
    let action = &execution.payload.action;

    if !targets_match(&intent.planned_target, &action.target) {
        out.push(ConsistencyFinding {
            kind: ConsistencyFindingKind::TargetMismatch,
            severity: ConsistencyFindingKind::TargetMismatch.severity(),
            detail: format!(
                "claimed target {:?}, executed against {:?}",
                intent.planned_target, action.target
            ),
            claim_id: Some(claim.id.clone()),
            execution_id: Some(execution.id.clone()),
        });
    }

    if intent.planned_action != action.action_type {
        out.push(ConsistencyFinding {
            kind: ConsistencyFindingKind::ActionTypeMismatch,
            severity: ConsistencyFindingKind::ActionTypeMismatch.severity(),
            detail: "planned action type does not match the executed action type".into(),
            claim_id: Some(claim.id.clone()),
            execution_id: Some(execution.id.clone()),
        });
    }

    if (execution.payload.risk.score as i32) - (intent.self_assessed_risk as i32) >= 3 {
        out.push(ConsistencyFinding {
            kind: ConsistencyFindingKind::RiskUnderestimate,
            severity: ConsistencyFindingKind::RiskUnderestimate.severity(),
            detail: format!(
                "self-assessed risk {} vs. observed risk {}",
                intent.self_assessed_risk, execution.payload.risk.score
            ),
            claim_id: Some(claim.id.clone()),
            execution_id: Some(execution.id.clone()),
        });
    }

    let financial_action = matches!(
        action.action_type,
        at_schemas::ActionType::PaymentInitiate | at_schemas::ActionType::PaymentConfirm
    );
    if !claim.payload.constraints.within_scope
        || (financial_action && !claim.payload.constraints.involves_financial)
    {
        out.push(ConsistencyFinding {
            kind: ConsistencyFindingKind::ScopeViolation,
            severity: ConsistencyFindingKind::ScopeViolation.severity(),
            detail: "execution fell outside the claim's declared scope".into(),
            claim_id: Some(claim.id.clone()),
            execution_id: Some(execution.id.clone()),
        });
    }

    let elevation_action = matches!(
        action.action_type,
        at_schemas::ActionType::ElevatedEnable
            | at_schemas::ActionType::CredentialRead
            | at_schemas::ActionType::CredentialWrite
    );
    if elevation_action && !claim.payload.constraints.requires_elevation {
        out.push(ConsistencyFinding {
            kind: ConsistencyFindingKind::EscalationUndeclared,
            severity: ConsistencyFindingKind::EscalationUndeclared.severity(),
            detail: "execution required elevation the claim never declared".into(),
            claim_id: Some(claim.id.clone()),
            execution_id: Some(execution.id.clone()),
        });
    }

    if outcome_is_unexpected(intent.expected_outcome, execution.payload.outcome.status) {
        out.push(ConsistencyFinding {
            kind: ConsistencyFindingKind::OutcomeUnexpected,
            severity: ConsistencyFindingKind::OutcomeUnexpected.severity(),
            detail: format!(
                "expected {:?}, observed {:?}",
                intent.expected_outcome, execution.payload.outcome.status
            ),
            claim_id: Some(claim.id.clone()),
            execution_id: Some(execution.id.clone()),
        });
    }

    out
}

fn targets_match(a: &str, b: &str) -> bool {
    a == b || a.ends_with(b) || b.ends_with(a)
}

fn outcome_is_unexpected(expected: ExpectedOutcome, status: OutcomeStatus) -> bool {
    match expected {
        ExpectedOutcome::Success => status != OutcomeStatus::Success,
        ExpectedOutcome::Partial => {
            matches!(status, OutcomeStatus::Failure | OutcomeStatus::Blocked)
        }
        ExpectedOutcome::Unknown => false,
    }
}

fn compute_consistency_score(findings: &[ConsistencyFinding]) -> i32 {
    let total_penalty: i32 = findings.iter().map(|f| f.kind.penalty()).sum();
    (100 - total_penalty).clamp(0, 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use at_schemas::{
        Action, ActionType, ClaimConstraints, ClaimIntent, ClaimPayload, ExecutionContext,
        ExecutionPayload, Outcome, OutcomeStatus, Risk,
    };
    use chrono::Utc;

    fn claim_entry(id: &str, target: &str, planned_action: ActionType) -> ClaimEntry {
        ClaimEntry {
            id: id.into(),
            v: at_schemas::CURRENT_VERSION,
            ts: Utc::now(),
            prev_hash: String::new(),
            hash: String::new(),
            payload: ClaimPayload {
                agent: "agent-1".into(),
                session: "sess-1".into(),
                intent: ClaimIntent {
                    planned_action,
                    planned_target: target.into(),
                    goal: "read config".into(),
                    expected_outcome: ExpectedOutcome::Success,
                    self_assessed_risk: 1,
                },
                constraints: ClaimConstraints {
                    within_scope: true,
                    requires_elevation: false,
                    involves_external_comms: false,
                    involves_financial: false,
                },
                execution: None,
                meta: None,
            },
        }
    }

    fn execution_entry(id: &str, claim_id: &str, target: &str, action_type: ActionType) -> ExecutionEntry {
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
                    detail: "".into(),
                },
                context: ExecutionContext {
                    goal: "read config".into(),
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
                meta: Some(serde_json::json!({ "claimId": claim_id })),
            },
        }
    }

    #[test]
    fn matching_pair_scores_100() {
        let claim = claim_entry("c1", "/tmp/a", ActionType::FileRead);
        let execution = execution_entry("e1", "c1", "/tmp/a", ActionType::FileRead);
        let report = evaluate(&[claim], &[execution]);
        assert!(report.findings.is_empty());
        assert_eq!(report.score, 100);
    }

    #[test]
    fn target_mismatch_detected_and_penalized() {
        let claim = claim_entry("c1", "/tmp/a", ActionType::FileRead);
        let execution = execution_entry("e1", "c1", "/tmp/other", ActionType::FileRead);
        let report = evaluate(&[claim], &[execution]);
        assert!(report
            .findings
            .iter()
            .any(|f| f.kind == ConsistencyFindingKind::TargetMismatch));
        assert_eq!(report.score, 80);
    }

    #[test]
    fn unclaimed_execution_when_claim_id_missing() {
        let mut execution = execution_entry("e1", "c1", "/tmp/a", ActionType::FileRead);
        execution.payload.meta = None;
        let report = evaluate(&[], &[execution]);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(
            report.findings[0].kind,
            ConsistencyFindingKind::UnclaimedExecution
        );
    }

    #[test]
    fn unfulfilled_claim_when_no_execution_references_it() {
        let claim = claim_entry("c1", "/tmp/a", ActionType::FileRead);
        let report = evaluate(&[claim], &[]);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(
            report.findings[0].kind,
            ConsistencyFindingKind::UnfulfilledClaim
        );
        assert_eq!(report.score, 100);
    }

    #[test]
    fn risk_underestimate_flagged_at_three_point_jump() {
        let claim = claim_entry("c1", "/tmp/a", ActionType::FileRead);
        let mut execution = execution_entry("e1", "c1", "/tmp/a", ActionType::FileRead);
        execution.payload.risk.score = 4;
        let report = evaluate(&[claim], &[execution]);
        assert!(report
            .findings
            .iter()
            .any(|f| f.kind == ConsistencyFindingKind::RiskUnderestimate));
    }
}
