use crate::header::AgentScoped;
use crate::ActionType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedOutcome {
    Success,
    Partial,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimIntent {
    pub planned_action: ActionType,
    pub planned_target: String,
    pub goal: String,
    pub expected_outcome: ExpectedOutcome,
    pub self_assessed_risk: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimConstraints {
    pub within_scope: bool,
    pub requires_elevation: bool,
    pub involves_external_comms: bool,
    pub involves_financial: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimExecutionRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_entry_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPayload {
    pub agent: String,
    pub session: String,
    pub intent: ClaimIntent,
    pub constraints: ClaimConstraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ClaimExecutionRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl AgentScoped for ClaimPayload {
    fn agent(&self) -> &str {
        &self.agent
    }
    fn session(&self) -> &str {
        &self.session
    }
}
