use crate::header::AgentScoped;
use crate::Action;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    pub goal: String,
    pub trigger: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_action: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failure,
    Partial,
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub status: OutcomeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Risk {
    pub score: u8,
    #[serde(default)]
    pub labels: Vec<String>,
    pub auto_flagged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPayload {
    pub agent: String,
    pub session: String,
    pub action: Action,
    pub context: ExecutionContext,
    pub outcome: Outcome,
    pub risk: Risk,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl ExecutionPayload {
    /// `meta.claimId`, used to resolve the paired claim (§6.3, §9).
    pub fn claim_id(&self) -> Option<&str> {
        self.meta.as_ref()?.get("claimId")?.as_str()
    }

    /// `meta.fileEvidence.contentHashPrefix`, compared against a witness's
    /// observed content hash by the file correlator (§4.J).
    pub fn file_evidence_content_hash_prefix(&self) -> Option<&str> {
        self.meta
            .as_ref()?
            .get("fileEvidence")?
            .get("contentHashPrefix")?
            .as_str()
    }

    /// `meta.processEvidence.pid`, compared against a witness spawn event's
    /// pid by the process correlator (§4.J).
    pub fn process_evidence_pid(&self) -> Option<i64> {
        self.meta
            .as_ref()?
            .get("processEvidence")?
            .get("pid")?
            .as_i64()
    }

    /// `meta.networkEvidence.port`, compared against an observed connection's
    /// port by the network correlator (§4.J).
    pub fn network_evidence_port(&self) -> Option<u16> {
        self.meta
            .as_ref()?
            .get("networkEvidence")?
            .get("port")?
            .as_u64()
            .map(|p| p as u16)
    }
}

impl AgentScoped for ExecutionPayload {
    fn agent(&self) -> &str {
        &self.agent
    }
    fn session(&self) -> &str {
        &self.session
    }
}
