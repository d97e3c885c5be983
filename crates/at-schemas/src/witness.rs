use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WitnessSource {
    Filesystem,
    Process,
    Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionProtocol {
    Tcp,
    Udp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStat {
    pub size_bytes: u64,
    pub mode: u32,
    pub mtime: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash_prefix: Option<String>,
}

/// Tagged by `type`; one arm per (source, kind) pair in §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WitnessEvent {
    FileCreated {
        path: String,
        #[serde(rename = "observedAt")]
        observed_at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stat: Option<FileStat>,
    },
    FileModified {
        path: String,
        #[serde(rename = "observedAt")]
        observed_at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stat: Option<FileStat>,
    },
    FileDeleted {
        path: String,
        #[serde(rename = "observedAt")]
        observed_at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stat: Option<FileStat>,
    },
    FileAccessed {
        path: String,
        #[serde(rename = "observedAt")]
        observed_at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stat: Option<FileStat>,
    },
    ProcessSpawned {
        command: String,
        pid: i64,
        ppid: i64,
        #[serde(rename = "observedAt")]
        observed_at: DateTime<Utc>,
    },
    ProcessExited {
        command: String,
        pid: i64,
        ppid: i64,
        #[serde(rename = "observedAt")]
        observed_at: DateTime<Utc>,
    },
    ConnectionOpened {
        #[serde(rename = "remoteHost")]
        remote_host: String,
        #[serde(rename = "remotePort", default, skip_serializing_if = "Option::is_none")]
        remote_port: Option<u16>,
        protocol: ConnectionProtocol,
        pid: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
        #[serde(rename = "observedAt")]
        observed_at: DateTime<Utc>,
    },
    ConnectionClosed {
        #[serde(rename = "remoteHost")]
        remote_host: String,
        #[serde(rename = "remotePort", default, skip_serializing_if = "Option::is_none")]
        remote_port: Option<u16>,
        protocol: ConnectionProtocol,
        pid: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        command: Option<String>,
        #[serde(rename = "observedAt")]
        observed_at: DateTime<Utc>,
    },
}

impl WitnessEvent {
    pub fn observed_at(&self) -> DateTime<Utc> {
        use WitnessEvent::*;
        match self {
            FileCreated { observed_at, .. }
            | FileModified { observed_at, .. }
            | FileDeleted { observed_at, .. }
            | FileAccessed { observed_at, .. }
            | ProcessSpawned { observed_at, .. }
            | ProcessExited { observed_at, .. }
            | ConnectionOpened { observed_at, .. }
            | ConnectionClosed { observed_at, .. } => *observed_at,
        }
    }

    pub fn path(&self) -> Option<&str> {
        use WitnessEvent::*;
        match self {
            FileCreated { path, .. }
            | FileModified { path, .. }
            | FileDeleted { path, .. }
            | FileAccessed { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn command(&self) -> Option<&str> {
        use WitnessEvent::*;
        match self {
            ProcessSpawned { command, .. }
            | ProcessExited { command, .. }
            | ConnectionOpened {
                command: Some(command),
                ..
            }
            | ConnectionClosed {
                command: Some(command),
                ..
            } => Some(command),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WitnessPayload {
    pub source: WitnessSource,
    pub correlated: bool,
    pub event: WitnessEvent,
}

impl crate::header::AgentScoped for WitnessPayload {
    // Witness observations aren't attributed to an agent/session at capture
    // time (that's exactly what correlation establishes); an agent/session
    // filter applied to the witness stream matches nothing rather than
    // panicking.
    fn agent(&self) -> &str {
        ""
    }
    fn session(&self) -> &str {
        ""
    }
}
