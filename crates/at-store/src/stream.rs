use crate::error::StreamError;
use crate::filter::{Filterable, ReadFilter};
use crate::raw::RawStore;
use crate::verify::{verify_stream, IntegrityReport};
use at_schemas::{AgentScoped, Entry, CURRENT_VERSION};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Mutex;
use ulid::Ulid;

/// The typed layer over (B)+(C) for one stream kind (§4.D). `P` is the
/// stream's payload type (`ExecutionPayload`, `ClaimPayload`, or
/// `WitnessPayload`).
pub struct Stream<P> {
    store: RawStore,
    /// In-memory cache of the last appended hash, private to this writer.
    /// `None` means "unknown, consult disk" — both at first construction and
    /// whenever recovery is needed.
    last_hash: Mutex<Option<String>>,
    _payload: std::marker::PhantomData<P>,
}

impl<P> Stream<P>
where
    P: Serialize + DeserializeOwned + Filterable + AgentScoped,
{
    pub fn open(dir: impl Into<std::path::PathBuf>, suffix: &'static str) -> std::io::Result<Self> {
        let store = RawStore::new(dir, suffix)?;
        Ok(Self {
            store,
            last_hash: Mutex::new(None),
            _payload: std::marker::PhantomData,
        })
    }

    /// Resolve the chain's current tip: the in-memory cache if warm,
    /// otherwise the newest file's last valid entry (§3 Lifecycle: "after
    /// restart the last hash is recovered by tailing the newest file").
    fn resolve_prev_hash(&self) -> std::io::Result<String> {
        let mut cache = self.last_hash.lock().unwrap();
        if let Some(hash) = cache.as_ref() {
            return Ok(hash.clone());
        }
        let recovered = self.tail_last()?.map(|e| e.hash);
        if recovered.is_none() {
            tracing::debug!(suffix = ?self.store.dir(), "no prior entries; starting fresh chain");
        }
        let hash = recovered.unwrap_or_default();
        *cache = Some(hash.clone());
        Ok(hash)
    }

    /// `append`: resolve `prevHash`, assign a new id/timestamp, compute the
    /// hash, append, and update the cache (§4.D).
    pub fn append(&self, payload: P) -> Result<Entry<P>, StreamError> {
        let prev_hash = self
            .resolve_prev_hash()
            .map_err(|source| StreamError::WriteFailed {
                path: self.store.dir().to_path_buf(),
                source,
            })?;
        let ts = Utc::now();
        let mut entry = Entry {
            id: Ulid::new().to_string(),
            v: CURRENT_VERSION,
            ts,
            prev_hash,
            hash: String::new(),
            payload,
        };
        entry.hash = at_chain::hash_entry(&entry)?;

        let line = serde_json::to_string(&entry)?;
        self.store
            .append_line(ts.date_naive(), &line)
            .map_err(|source| StreamError::WriteFailed {
                path: self.store.dir().to_path_buf(),
                source,
            })?;

        *self.last_hash.lock().unwrap() = Some(entry.hash.clone());
        Ok(entry)
    }

    /// `read`: prune by date range, parse each remaining file (skipping
    /// unparseable lines — that's the integrity verifier's job), apply the
    /// AND-composed predicates, and return in file-order/global-time-order.
    pub fn read(&self, filter: &ReadFilter) -> std::io::Result<Vec<Entry<P>>> {
        let (from_date, to_date) = filter.date_range();
        let mut out = Vec::new();
        for path in self.store.list_files()? {
            if let Some(d) = file_date(&path) {
                if from_date.is_some_and(|f| d < f) || to_date.is_some_and(|t| d > t) {
                    continue;
                }
            }
            for entry in Self::parse_entries(&path)? {
                if filter.matches(&entry) {
                    out.push(entry);
                }
            }
        }
        out.sort_by_key(|e| e.ts);
        Ok(out)
    }

    /// `tailLast`: last successfully parsed entry of the newest file.
    pub fn tail_last(&self) -> std::io::Result<Option<Entry<P>>> {
        let files = self.store.list_files()?;
        match files.last() {
            None => Ok(None),
            Some(path) => Ok(Self::parse_entries(path)?.into_iter().next_back()),
        }
    }

    fn parse_entries(path: &std::path::Path) -> std::io::Result<Vec<Entry<P>>> {
        Ok(RawStore::read_lines(path)?
            .into_iter()
            .filter_map(|(_, line)| serde_json::from_str::<Entry<P>>(&line).ok())
            .collect())
    }

    /// `verify`: delegate to the integrity verifier (§4.E).
    pub fn verify(&self) -> std::io::Result<IntegrityReport> {
        verify_stream::<P>(&self.store)
    }
}

fn file_date(path: &std::path::Path) -> Option<chrono::NaiveDate> {
    let name = path.file_name()?.to_str()?;
    let date_part = name.split('.').next()?;
    chrono::NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
