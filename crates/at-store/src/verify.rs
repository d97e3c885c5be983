use crate::raw::RawStore;
use at_schemas::{Entry, CURRENT_VERSION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityErrorKind {
    ParseError,
    UnknownVersion,
    HashMismatch,
    ChainBroken,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityError {
    pub file: PathBuf,
    pub line: usize,
    pub kind: IntegrityErrorKind,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntegrityReport {
    pub valid: bool,
    pub files_checked: usize,
    pub total_entries: usize,
    pub errors: Vec<IntegrityError>,
}

/// Scan every file in a stream and classify invariant violations (§4.E).
/// Cross-file linkage: file N's first entry must chain from file N-1's last
/// entry (or `""` if N is the first file in the stream).
pub fn verify_stream<P>(store: &RawStore) -> std::io::Result<IntegrityReport>
where
    P: Serialize + DeserializeOwned,
{
    let files = store.list_files()?;
    let mut report = IntegrityReport {
        valid: true,
        files_checked: files.len(),
        total_entries: 0,
        errors: Vec::new(),
    };

    // Chain tip carried from the previous file; `""` before the first file,
    // matching invariant (3) for the very first entry of the whole stream.
    let mut expected_prev = String::new();

    for path in &files {
        for (line_no, line) in RawStore::read_lines(path)? {
            let raw: serde_json::Value = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(e) => {
                    report.errors.push(IntegrityError {
                        file: path.clone(),
                        line: line_no,
                        kind: IntegrityErrorKind::ParseError,
                        detail: e.to_string(),
                    });
                    continue;
                }
            };

            let version = raw.get("v").and_then(|v| v.as_u64());
            if version != Some(CURRENT_VERSION as u64) {
                report.errors.push(IntegrityError {
                    file: path.clone(),
                    line: line_no,
                    kind: IntegrityErrorKind::UnknownVersion,
                    detail: format!("unsupported schema version {:?}", version),
                });
                continue;
            }

            let entry: Entry<P> = match serde_json::from_value(raw) {
                Ok(e) => e,
                Err(e) => {
                    report.errors.push(IntegrityError {
                        file: path.clone(),
                        line: line_no,
                        kind: IntegrityErrorKind::ParseError,
                        detail: e.to_string(),
                    });
                    continue;
                }
            };

            report.total_entries += 1;

            match at_chain::verify_entry_hash(&entry) {
                Ok(true) => {}
                Ok(false) | Err(_) => {
                    report.errors.push(IntegrityError {
                        file: path.clone(),
                        line: line_no,
                        kind: IntegrityErrorKind::HashMismatch,
                        detail: format!("stored hash {} does not match recomputed hash", entry.hash),
                    });
                }
            }

            if entry.prev_hash != expected_prev {
                report.errors.push(IntegrityError {
                    file: path.clone(),
                    line: line_no,
                    kind: IntegrityErrorKind::ChainBroken,
                    detail: format!(
                        "expected prevHash {:?}, found {:?}",
                        expected_prev, entry.prev_hash
                    ),
                });
            }

            // Chain continues from the stored hash regardless of whether it
            // passed the hash check above — that is what the next entry on
            // disk actually links against.
            expected_prev = entry.hash;
        }
    }

    report.valid = report.errors.is_empty();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stream;
    use at_schemas::{Action, ActionType, ExecutionContext, ExecutionPayload, Outcome, OutcomeStatus, Risk};
    use std::io::Write;

    fn payload(target: &str) -> ExecutionPayload {
        ExecutionPayload {
            agent: "agent-1".into(),
            session: "sess-1".into(),
            action: Action {
                action_type: ActionType::FileRead,
                target: target.into(),
                detail: "".into(),
            },
            context: ExecutionContext {
                goal: "g".into(),
                trigger: "t".into(),
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
        }
    }

    #[test]
    fn untampered_chain_verifies_valid() {
        let dir = tempfile::tempdir().unwrap();
        let stream: Stream<ExecutionPayload> = Stream::open(dir.path(), "agenttrust").unwrap();
        for i in 0..5 {
            stream.append(payload(&format!("/tmp/{i}"))).unwrap();
        }
        let report = stream.verify().unwrap();
        assert!(report.valid);
        assert_eq!(report.total_entries, 5);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn tampering_a_field_is_detected_as_hash_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let stream: Stream<ExecutionPayload> = Stream::open(dir.path(), "agenttrust").unwrap();
        for i in 0..3 {
            stream.append(payload(&format!("/tmp/{i}"))).unwrap();
        }

        let path = stream.tail_last().unwrap().unwrap();
        let _ = path;
        let files = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect::<Vec<_>>();
        let file = &files[0];
        let content = std::fs::read_to_string(file).unwrap();
        let mut lines: Vec<String> = content.lines().map(String::from).collect();
        lines[1] = lines[1].replace("/tmp/1", "/tmp/TAMPERED");
        let mut f = std::fs::File::create(file).unwrap();
        f.write_all(lines.join("\n").as_bytes()).unwrap();
        f.write_all(b"\n").unwrap();

        let report = stream.verify().unwrap();
        assert!(!report.valid);
        assert!(report
            .errors
            .iter()
            .any(|e| e.kind == IntegrityErrorKind::HashMismatch && e.line == 2));
    }

    #[test]
    fn empty_stream_verifies_valid() {
        let dir = tempfile::tempdir().unwrap();
        let stream: Stream<ExecutionPayload> = Stream::open(dir.path(), "agenttrust").unwrap();
        let report = stream.verify().unwrap();
        assert!(report.valid);
        assert_eq!(report.total_entries, 0);
    }

    #[test]
    fn unparseable_line_reports_parse_error_without_masking_rest() {
        let dir = tempfile::tempdir().unwrap();
        let stream: Stream<ExecutionPayload> = Stream::open(dir.path(), "agenttrust").unwrap();
        stream.append(payload("/tmp/a")).unwrap();
        let files = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect::<Vec<_>>();
        let mut f = std::fs::OpenOptions::new()
            .append(true)
            .open(&files[0])
            .unwrap();
        f.write_all(b"not json\n").unwrap();

        let report = stream.verify().unwrap();
        assert!(!report.valid);
        assert_eq!(report.total_entries, 1);
        assert!(report
            .errors
            .iter()
            .any(|e| e.kind == IntegrityErrorKind::ParseError));
    }
}
