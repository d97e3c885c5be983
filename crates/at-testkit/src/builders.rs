use at_schemas::{
    Action, ActionType, ClaimConstraints, ClaimExecutionRef, ClaimIntent, ClaimPayload,
    ConnectionProtocol, ExecutionContext, ExecutionPayload, ExpectedOutcome, FileStat, Outcome,
    OutcomeStatus, Risk, WitnessEvent, WitnessPayload, WitnessSource,
};
use chrono::{DateTime, Utc};

/// Fluent builder for an `ExecutionPayload` fixture. Every field starts at
/// a reasonable default; tests override only what the scenario cares about.
pub struct ExecutionBuilder {
    payload: ExecutionPayload,
}

impl ExecutionBuilder {
    pub fn new(agent: &str, session: &str, action_type: ActionType, target: &str) -> Self {
        Self {
            payload: ExecutionPayload {
                agent: agent.into(),
                session: session.into(),
                action: Action {
                    action_type,
                    target: target.into(),
                    detail: String::new(),
                },
                context: ExecutionContext {
                    goal: "fixture goal".into(),
                    trigger: "fixture trigger".into(),
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

    pub fn outcome(mut self, status: OutcomeStatus) -> Self {
        self.payload.outcome.status = status;
        self
    }

    pub fn risk(mut self, score: u8) -> Self {
        self.payload.risk.score = score;
        self
    }

    fn meta_mut(&mut self) -> &mut serde_json::Map<String, serde_json::Value> {
        if !matches!(self.payload.meta, Some(serde_json::Value::Object(_))) {
            self.payload.meta = Some(serde_json::Value::Object(Default::default()));
        }
        self.payload.meta.as_mut().unwrap().as_object_mut().unwrap()
    }

    pub fn claim_id(mut self, id: &str) -> Self {
        self.meta_mut()
            .insert("claimId".into(), serde_json::Value::String(id.into()));
        self
    }

    pub fn file_evidence(mut self, content_hash_prefix: &str) -> Self {
        self.meta_mut().insert(
            "fileEvidence".into(),
            serde_json::json!({ "contentHashPrefix": content_hash_prefix }),
        );
        self
    }

    pub fn process_evidence(mut self, pid: i64) -> Self {
        self.meta_mut()
            .insert("processEvidence".into(), serde_json::json!({ "pid": pid }));
        self
    }

    pub fn network_evidence(mut self, port: u16) -> Self {
        self.meta_mut()
            .insert("networkEvidence".into(), serde_json::json!({ "port": port }));
        self
    }

    pub fn build(self) -> ExecutionPayload {
        self.payload
    }
}

/// Fluent builder for a `ClaimPayload` fixture.
pub struct ClaimBuilder {
    payload: ClaimPayload,
}

impl ClaimBuilder {
    pub fn new(agent: &str, session: &str, planned_action: ActionType, planned_target: &str) -> Self {
        Self {
            payload: ClaimPayload {
                agent: agent.into(),
                session: session.into(),
                intent: ClaimIntent {
                    planned_action,
                    planned_target: planned_target.into(),
                    goal: "fixture goal".into(),
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

    pub fn self_assessed_risk(mut self, risk: u8) -> Self {
        self.payload.intent.self_assessed_risk = risk;
        self
    }

    pub fn expected_outcome(mut self, outcome: ExpectedOutcome) -> Self {
        self.payload.intent.expected_outcome = outcome;
        self
    }

    pub fn within_scope(mut self, within_scope: bool) -> Self {
        self.payload.constraints.within_scope = within_scope;
        self
    }

    pub fn execution_entry_id(mut self, id: &str) -> Self {
        self.payload.execution = Some(ClaimExecutionRef {
            execution_entry_id: Some(id.into()),
        });
        self
    }

    pub fn build(self) -> ClaimPayload {
        self.payload
    }
}

/// Fluent builder for a `WitnessPayload` fixture, one constructor per
/// event shape named in §3.
pub struct WitnessBuilder;

impl WitnessBuilder {
    pub fn file_modified(path: &str, observed_at: DateTime<Utc>, content_hash_prefix: Option<&str>) -> WitnessPayload {
        WitnessPayload {
            source: WitnessSource::Filesystem,
            correlated: false,
            event: WitnessEvent::FileModified {
                path: path.into(),
                observed_at,
                stat: Some(FileStat {
                    size_bytes: 128,
                    mode: 0o644,
                    mtime: observed_at,
                    content_hash_prefix: content_hash_prefix.map(String::from),
                }),
            },
        }
    }

    pub fn file_deleted(path: &str, observed_at: DateTime<Utc>) -> WitnessPayload {
        WitnessPayload {
            source: WitnessSource::Filesystem,
            correlated: false,
            event: WitnessEvent::FileDeleted {
                path: path.into(),
                observed_at,
                stat: None,
            },
        }
    }

    pub fn process_spawned(command: &str, pid: i64, ppid: i64, observed_at: DateTime<Utc>) -> WitnessPayload {
        WitnessPayload {
            source: WitnessSource::Process,
            correlated: false,
            event: WitnessEvent::ProcessSpawned {
                command: command.into(),
                pid,
                ppid,
                observed_at,
            },
        }
    }

    pub fn connection_opened(
        remote_host: &str,
        remote_port: Option<u16>,
        pid: i64,
        command: Option<&str>,
        observed_at: DateTime<Utc>,
    ) -> WitnessPayload {
        WitnessPayload {
            source: WitnessSource::Network,
            correlated: false,
            event: WitnessEvent::ConnectionOpened {
                remote_host: remote_host.into(),
                remote_port,
                protocol: ConnectionProtocol::Tcp,
                pid,
                command: command.map(String::from),
                observed_at,
            },
        }
    }
}
