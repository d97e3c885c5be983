//! Shared record shapes for the claims, executions, and witness streams.
//!
//! Every type here is data only: `Serialize`/`Deserialize`, no I/O, no
//! hashing. Canonicalization and chaining live in `at-chain`; storage lives
//! in `at-store`.

mod action;
mod claim;
mod execution;
mod header;
mod witness;

pub use action::ActionType;
pub use claim::{ClaimConstraints, ClaimExecutionRef, ClaimIntent, ClaimPayload, ExpectedOutcome};
pub use execution::{ExecutionContext, ExecutionPayload, Outcome, OutcomeStatus, Risk};
pub use header::{AgentScoped, Entry, CURRENT_VERSION};
pub use witness::{ConnectionProtocol, FileStat, WitnessEvent, WitnessPayload, WitnessSource};

pub type ExecutionEntry = Entry<ExecutionPayload>;
pub type ClaimEntry = Entry<ClaimPayload>;
pub type WitnessEntry = Entry<WitnessPayload>;

/// An `action` shared by executions and claim intents.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub target: String,
    pub detail: String,
}
