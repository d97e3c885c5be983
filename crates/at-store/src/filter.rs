use at_schemas::{ActionType, AgentScoped, ClaimPayload, Entry, ExecutionPayload, WitnessPayload};
use chrono::{DateTime, Utc};

/// Implemented by payloads that carry an action-type/risk/labels triple, so
/// `Stream::read` can filter generically across claim and execution payloads
/// (§4.D predicates: "action type, risk threshold, labels").
pub trait Filterable {
    fn action_type(&self) -> Option<ActionType> {
        None
    }
    fn risk_score(&self) -> Option<u8> {
        None
    }
    fn labels(&self) -> &[String] {
        &[]
    }
}

impl Filterable for ExecutionPayload {
    fn action_type(&self) -> Option<ActionType> {
        Some(self.action.action_type)
    }
    fn risk_score(&self) -> Option<u8> {
        Some(self.risk.score)
    }
    fn labels(&self) -> &[String] {
        &self.risk.labels
    }
}

impl Filterable for ClaimPayload {
    fn action_type(&self) -> Option<ActionType> {
        Some(self.intent.planned_action)
    }
    fn risk_score(&self) -> Option<u8> {
        Some(self.intent.self_assessed_risk)
    }
}

impl Filterable for WitnessPayload {}

/// AND-composed read predicates (§4.D). All fields default to "no
/// constraint"; a `None`/empty field never excludes an entry.
#[derive(Debug, Clone, Default)]
pub struct ReadFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub agent: Option<String>,
    pub session: Option<String>,
    pub action_type: Option<ActionType>,
    pub min_risk: Option<u8>,
    /// Entry matches if it carries any of these labels; empty means no
    /// constraint.
    pub labels: Vec<String>,
}

impl ReadFilter {
    pub fn matches<P: AgentScoped + Filterable>(&self, entry: &Entry<P>) -> bool {
        if let Some(from) = self.from {
            if entry.ts < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if entry.ts > to {
                return false;
            }
        }
        if let Some(agent) = &self.agent {
            if entry.payload.agent() != agent {
                return false;
            }
        }
        if let Some(session) = &self.session {
            if entry.payload.session() != session {
                return false;
            }
        }
        if let Some(action_type) = self.action_type {
            if entry.payload.action_type() != Some(action_type) {
                return false;
            }
        }
        if let Some(min_risk) = self.min_risk {
            match entry.payload.risk_score() {
                Some(score) if score >= min_risk => {}
                _ => return false,
            }
        }
        if !self.labels.is_empty() {
            let entry_labels = entry.payload.labels();
            if !self.labels.iter().any(|l| entry_labels.contains(l)) {
                return false;
            }
        }
        true
    }

    /// Inclusive UTC date range files can be pruned to before parsing
    /// (§4.D "prune files by date range").
    pub fn date_range(&self) -> (Option<chrono::NaiveDate>, Option<chrono::NaiveDate>) {
        (self.from.map(|d| d.date_naive()), self.to.map(|d| d.date_naive()))
    }
}
