use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current record schema version. Readers must reject anything else (§6.2).
pub const CURRENT_VERSION: u32 = 1;

/// The header common to every stream, generic over the stream-specific payload.
///
/// `id` is a 26-character, time-prefixed, monotonically-sortable identifier
/// (a ULID). `hash` covers the canonical form of every other field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry<P> {
    pub id: String,
    pub v: u32,
    pub ts: DateTime<Utc>,
    pub prev_hash: String,
    pub hash: String,
    #[serde(flatten)]
    pub payload: P,
}

impl<P> Entry<P> {
    pub fn agent_session(&self) -> Option<(&str, &str)>
    where
        P: AgentScoped,
    {
        Some((self.payload.agent(), self.payload.session()))
    }
}

/// Implemented by payloads that carry `agent`/`session` fields, so generic
/// stream filtering (§4.D `read`) doesn't need to match on payload kind.
pub trait AgentScoped {
    fn agent(&self) -> &str;
    fn session(&self) -> &str;
}
