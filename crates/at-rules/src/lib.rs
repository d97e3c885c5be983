//! The external rule-engine boundary (§6.3).
//!
//! The ~14-detector rule engine itself is out of scope (§1); this crate only
//! pins the contract `at-score` composes against: a trait plus a no-op
//! default so the workspace has something typed to wire in before a real
//! engine exists.

use at_schemas::{ClaimEntry, ExecutionEntry};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// One rule firing against a single entry.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch {
    pub rule_id: String,
    pub severity: RuleSeverity,
    pub reason: String,
    pub risk_contribution: u8,
    pub labels: Vec<String>,
}

/// Context a rule evaluates against (§6.3): prior activity in the same
/// session, a short lookback window, the set of hosts/targets already seen
/// (used for unknown-recipient detection), opaque preset config, and the
/// claim paired to the entry being evaluated, if any.
pub struct RuleContext<'a> {
    pub session_history: &'a [ExecutionEntry],
    pub recent_entries: &'a [ExecutionEntry],
    pub known_targets: &'a [String],
    pub config: &'a serde_json::Value,
    pub paired_claim: Option<&'a ClaimEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub entries_evaluated: usize,
    pub total_matches: usize,
    pub matches_by_severity: HashMap<RuleSeverity, usize>,
    pub matches_by_category: HashMap<String, usize>,
    pub matches: Vec<RuleMatch>,
}

/// The contract a real rule-engine implementation fulfills. `at-score` only
/// ever sees this trait, never a concrete detector set.
pub trait RuleEngine {
    fn evaluate(&self, entry: &ExecutionEntry, context: &RuleContext) -> Vec<RuleMatch>;

    fn evaluate_batch(&self, entries: &[ExecutionEntry], claims: Option<&[ClaimEntry]>) -> BatchResult {
        let known_targets: Vec<String> = entries
            .iter()
            .map(|e| e.payload.action.target.clone())
            .collect();
        let mut result = BatchResult {
            entries_evaluated: entries.len(),
            ..Default::default()
        };
        for entry in entries {
            let paired_claim = entry.payload.claim_id().and_then(|id| {
                claims.and_then(|cs| cs.iter().find(|c| c.id == id))
            });
            let context = RuleContext {
                session_history: entries,
                recent_entries: entries,
                known_targets: &known_targets,
                config: &serde_json::Value::Null,
                paired_claim,
            };
            for m in self.evaluate(entry, &context) {
                *result.matches_by_severity.entry(m.severity).or_insert(0) += 1;
                *result
                    .matches_by_category
                    .entry(m.rule_id.clone())
                    .or_insert(0) += 1;
                result.matches.push(m);
            }
        }
        result.total_matches = result.matches.len();
        result
    }
}

/// The no-op default: matches nothing. Exists so `at-score` has a concrete
/// `RuleEngine` to compose against before a real detector set is wired in.
pub struct NoopRuleEngine;

impl RuleEngine for NoopRuleEngine {
    fn evaluate(&self, _entry: &ExecutionEntry, _context: &RuleContext) -> Vec<RuleMatch> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_engine_never_matches() {
        let engine = NoopRuleEngine;
        let result = engine.evaluate_batch(&[], None);
        assert_eq!(result.total_matches, 0);
        assert_eq!(result.entries_evaluated, 0);
    }
}
