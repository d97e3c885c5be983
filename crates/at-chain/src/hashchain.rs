use crate::canonical::canonical_json;
use at_schemas::Entry;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// `hashEntry` (§4.B): SHA-256 of the canonical form of `entry` with the
/// `hash` field removed, as lowercase hex.
pub fn hash_entry<P: Serialize>(entry: &Entry<P>) -> serde_json::Result<String> {
    let mut value = serde_json::to_value(entry)?;
    if let Some(obj) = value.as_object_mut() {
        obj.remove("hash");
    }
    let canonical = canonical_json(&value);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// `verifyEntryHash` (§4.B): recompute and compare against the stored hash.
pub fn verify_entry_hash<P: Serialize>(entry: &Entry<P>) -> serde_json::Result<bool> {
    Ok(hash_entry(entry)? == entry.hash)
}

/// Outcome of walking a stream's entries end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainVerification {
    Valid,
    /// Index (within the slice passed in) of the first entry that fails
    /// invariant (1), (2), or (3).
    BrokenAt(usize),
}

/// `verifyChain` (§4.B): walks `seq` checking invariants (1)-(3). Pure, no I/O
/// — cross-file linkage and parse-error bookkeeping belong to the integrity
/// verifier in `at-store` (§4.E), which calls this per file and then checks
/// the boundary between files itself.
pub fn verify_chain<P: Serialize>(seq: &[Entry<P>]) -> serde_json::Result<ChainVerification> {
    for (i, entry) in seq.iter().enumerate() {
        if !verify_entry_hash(entry)? {
            return Ok(ChainVerification::BrokenAt(i));
        }
        let expected_prev = match i {
            0 => "",
            _ => seq[i - 1].hash.as_str(),
        };
        if entry.prev_hash != expected_prev {
            return Ok(ChainVerification::BrokenAt(i));
        }
    }
    Ok(ChainVerification::Valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use at_schemas::{ActionType, ExecutionContext, ExecutionPayload, Outcome, OutcomeStatus, Risk};
    use at_schemas::Action;
    use chrono::Utc;

    fn entry(id: &str, prev_hash: &str) -> Entry<ExecutionPayload> {
        let payload = ExecutionPayload {
            agent: "agent-1".into(),
            session: "sess-1".into(),
            action: Action {
                action_type: ActionType::FileRead,
                target: "/tmp/a".into(),
                detail: "".into(),
            },
            context: ExecutionContext {
                goal: "read file".into(),
                trigger: "user request".into(),
                parent_action: None,
            },
            outcome: Outcome {
                status: OutcomeStatus::Success,
                duration_ms: Some(5),
                detail: None,
            },
            risk: Risk {
                score: 1,
                labels: vec![],
                auto_flagged: false,
            },
            meta: None,
        };
        let mut e = Entry {
            id: id.into(),
            v: at_schemas::CURRENT_VERSION,
            ts: Utc::now(),
            prev_hash: prev_hash.into(),
            hash: String::new(),
            payload,
        };
        e.hash = hash_entry(&e).unwrap();
        e
    }

    #[test]
    fn hash_excludes_itself() {
        let e = entry("01ARZ3NDEKTSV4RRFFQ69G5FAV", "");
        assert!(verify_entry_hash(&e).unwrap());
    }

    #[test]
    fn chain_of_two_links_correctly() {
        let e0 = entry("01ARZ3NDEKTSV4RRFFQ69G5FAV", "");
        let e1 = entry("01ARZ3NDEKTSV4RRFFQ69G5FAW", &e0.hash);
        assert_eq!(
            verify_chain(&[e0, e1]).unwrap(),
            ChainVerification::Valid
        );
    }

    #[test]
    fn tampered_entry_breaks_chain_at_that_index() {
        let e0 = entry("01ARZ3NDEKTSV4RRFFQ69G5FAV", "");
        let mut e1 = entry("01ARZ3NDEKTSV4RRFFQ69G5FAW", &e0.hash);
        e1.payload.action.target = "/tmp/tampered".into();
        assert_eq!(
            verify_chain(&[e0, e1]).unwrap(),
            ChainVerification::BrokenAt(1)
        );
    }

    #[test]
    fn broken_prev_hash_link_detected() {
        let e0 = entry("01ARZ3NDEKTSV4RRFFQ69G5FAV", "");
        let e1 = entry("01ARZ3NDEKTSV4RRFFQ69G5FAW", "not-the-real-prev-hash");
        assert_eq!(
            verify_chain(&[e0, e1]).unwrap(),
            ChainVerification::BrokenAt(1)
        );
    }

    #[test]
    fn first_entry_must_have_empty_prev_hash() {
        let e0 = entry("01ARZ3NDEKTSV4RRFFQ69G5FAV", "bogus");
        assert_eq!(
            verify_chain(std::slice::from_ref(&e0)).unwrap(),
            ChainVerification::BrokenAt(0)
        );
    }

    #[test]
    fn empty_sequence_is_valid() {
        let seq: Vec<Entry<ExecutionPayload>> = vec![];
        assert_eq!(verify_chain(&seq).unwrap(), ChainVerification::Valid);
    }
}
