/// Errors a `Stream` can surface to its caller (§7).
///
/// `ParseError`, `HashMismatch`, and `ChainBroken` are deliberately absent
/// here — they are never raised during append, only reported by the
/// integrity verifier (§4.E, §7 "Propagation").
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("io error writing {path}: {source}")]
    WriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serializing entry failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
