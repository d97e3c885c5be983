use at_schemas::{Entry, CURRENT_VERSION};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use ulid::Ulid;

/// Assigns ids and strictly increasing timestamps to a list of payloads and
/// hash-chains them in order, the way a `Stream` would on successive
/// appends — but in memory, for tests that exercise correlators/scorers
/// directly without a filesystem-backed store.
pub fn chain_entries<P: Serialize>(
    payloads: Vec<P>,
    start: DateTime<Utc>,
    step: Duration,
) -> Vec<Entry<P>> {
    let mut prev_hash = String::new();
    let mut ts = start;
    let mut out = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let mut entry = Entry {
            id: Ulid::new().to_string(),
            v: CURRENT_VERSION,
            ts,
            prev_hash,
            hash: String::new(),
            payload,
        };
        entry.hash = at_chain::hash_entry(&entry).expect("fixture payload always serializes");
        prev_hash = entry.hash.clone();
        ts += step;
        out.push(entry);
    }
    out
}
