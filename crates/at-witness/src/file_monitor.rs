use crate::exclude::{expand_home, is_excluded};
use at_schemas::{FileStat, WitnessEvent};
use chrono::Utc;
use notify::{RecursiveMode, Watcher};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::time::{Duration, Instant};

const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);
const CONTENT_HASH_PREFIX_BYTES: usize = 4096;

#[derive(Debug, Clone)]
pub struct FileMonitorConfig {
    pub watch_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
}

/// Raw change kind as reported by the underlying watch, used to classify a
/// still-existing path as created vs. modified once the debounce tick fires
/// (§4.F: "classify as file_created or file_modified based on the
/// underlying watch event kind").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawKind {
    Create,
    Modify,
    Remove,
}

/// Watches a configured set of directories recursively and emits debounced
/// filesystem events (§4.F). Never raises to its caller: watch failures on
/// individual paths are logged and swallowed so the daemon keeps running.
pub struct FileMonitor {
    _watcher: Option<notify::RecommendedWatcher>,
    stop: std::sync::Arc<std::sync::atomic::AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl FileMonitor {
    pub fn start(
        config: FileMonitorConfig,
        on_event: impl Fn(WitnessEvent) + Send + 'static,
    ) -> Self {
        let exclude_paths = config.exclude_paths.clone();
        let (tx, rx) = std_mpsc::channel::<notify::Event>();

        let mut watcher = match notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        }) {
            Ok(w) => Some(w),
            Err(e) => {
                tracing::warn!(error = %e, "file monitor failed to start its watcher");
                None
            }
        };

        if let Some(w) = watcher.as_mut() {
            for raw in &config.watch_paths {
                let path = expand_home(raw);
                if !path.exists() {
                    tracing::debug!(path = %path.display(), "watch path does not exist, ignoring");
                    continue;
                }
                if let Err(e) = w.watch(&path, RecursiveMode::Recursive) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to watch path, skipping");
                }
            }
        }

        let stop = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let stop_clone = stop.clone();
        let thread = std::thread::spawn(move || {
            debounce_loop(rx, exclude_paths, stop_clone, on_event);
        });

        Self {
            _watcher: watcher,
            stop,
            thread: Some(thread),
        }
    }

    /// Drains pending debounce timers and stops the watch thread (§4.I
    /// "Stop": idempotent).
    pub fn stop(&mut self) {
        self.stop.store(true, std::sync::atomic::Ordering::SeqCst);
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

impl Drop for FileMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn debounce_loop(
    rx: std_mpsc::Receiver<notify::Event>,
    exclude_paths: Vec<String>,
    stop: std::sync::Arc<std::sync::atomic::AtomicBool>,
    on_event: impl Fn(WitnessEvent),
) {
    let mut pending: HashMap<PathBuf, (RawKind, Instant)> = HashMap::new();

    while !stop.load(std::sync::atomic::Ordering::SeqCst) {
        while let Ok(event) = rx.try_recv() {
            let kind = match event.kind {
                notify::EventKind::Remove(_) => RawKind::Remove,
                notify::EventKind::Create(_) => RawKind::Create,
                notify::EventKind::Modify(_) => RawKind::Modify,
                _ => continue,
            };
            for path in event.paths {
                if is_excluded(&path, &exclude_paths) {
                    continue;
                }
                // A create followed by modifies inside the same debounce
                // window is still reported as the creation.
                let effective_kind = match pending.get(&path) {
                    Some((RawKind::Create, _)) if kind == RawKind::Modify => RawKind::Create,
                    _ => kind,
                };
                pending.insert(path, (effective_kind, Instant::now()));
            }
        }

        let now = Instant::now();
        let ready: Vec<PathBuf> = pending
            .iter()
            .filter(|(_, (_, t))| now.duration_since(*t) >= DEBOUNCE_WINDOW)
            .map(|(p, _)| p.clone())
            .collect();

        for path in ready {
            if let Some((kind, _)) = pending.remove(&path) {
                on_event(build_event(&path, kind));
            }
        }

        std::thread::sleep(Duration::from_millis(20));
    }

    // Drain whatever is left without waiting out their windows — stop means
    // stop.
    for (path, (kind, _)) in pending.drain() {
        on_event(build_event(&path, kind));
    }
}

fn build_event(path: &Path, kind: RawKind) -> WitnessEvent {
    let observed_at = Utc::now();
    let path_str = path.to_string_lossy().to_string();

    if kind == RawKind::Remove || !path.exists() {
        return WitnessEvent::FileDeleted {
            path: path_str,
            observed_at,
            stat: None,
        };
    }

    let stat = stat_file(path);
    match kind {
        RawKind::Create => WitnessEvent::FileCreated {
            path: path_str,
            observed_at,
            stat,
        },
        RawKind::Modify => WitnessEvent::FileModified {
            path: path_str,
            observed_at,
            stat,
        },
        RawKind::Remove => unreachable!(),
    }
}

fn stat_file(path: &Path) -> Option<FileStat> {
    let meta = fs::metadata(path).ok()?;
    if !meta.is_file() {
        return Some(FileStat {
            size_bytes: meta.len(),
            mode: file_mode(&meta),
            mtime: meta.modified().ok().map(chrono::DateTime::<Utc>::from).unwrap_or_else(Utc::now),
            content_hash_prefix: None,
        });
    }
    let content_hash_prefix = hash_prefix(path);
    Some(FileStat {
        size_bytes: meta.len(),
        mode: file_mode(&meta),
        mtime: meta.modified().ok().map(chrono::DateTime::<Utc>::from).unwrap_or_else(Utc::now),
        content_hash_prefix,
    })
}

fn hash_prefix(path: &Path) -> Option<String> {
    let mut f = fs::File::open(path).ok()?;
    let mut buf = vec![0u8; CONTENT_HASH_PREFIX_BYTES];
    let mut total = 0;
    loop {
        match f.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => {
                total += n;
                if total == buf.len() {
                    break;
                }
            }
            Err(_) => return None,
        }
    }
    buf.truncate(total);
    let mut hasher = Sha256::new();
    hasher.update(&buf);
    Some(hex::encode(hasher.finalize()))
}

#[cfg(unix)]
fn file_mode(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn file_mode(_meta: &fs::Metadata) -> u32 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn create_then_modify_within_debounce_window_coalesces_to_one_event() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("a.txt");
        std::fs::write(&file_path, b"hello").unwrap();

        let events: Arc<Mutex<Vec<WitnessEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        let mut monitor = FileMonitor::start(
            FileMonitorConfig {
                watch_paths: vec![dir.path().to_string_lossy().to_string()],
                exclude_paths: vec![],
            },
            move |e| events_clone.lock().unwrap().push(e),
        );

        std::thread::sleep(Duration::from_millis(30));
        std::fs::write(&file_path, b"hello again").unwrap();
        std::thread::sleep(Duration::from_millis(30));
        std::fs::write(&file_path, b"hello a third time").unwrap();

        std::thread::sleep(Duration::from_millis(400));
        monitor.stop();

        let collected = events.lock().unwrap();
        let matching: Vec<_> = collected
            .iter()
            .filter(|e| e.path() == Some(file_path.to_string_lossy().as_ref()))
            .collect();
        assert_eq!(matching.len(), 1, "events: {:?}", *collected);
    }

    #[test]
    fn nonexistent_watch_path_is_ignored_silently() {
        let monitor = FileMonitor::start(
            FileMonitorConfig {
                watch_paths: vec!["/this/path/does/not/exist/anywhere".into()],
                exclude_paths: vec![],
            },
            |_| {},
        );
        drop(monitor);
    }

    #[test]
    fn excluded_path_never_fires() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("ignored.log");

        let events: Arc<Mutex<Vec<WitnessEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        let mut monitor = FileMonitor::start(
            FileMonitorConfig {
                watch_paths: vec![dir.path().to_string_lossy().to_string()],
                exclude_paths: vec!["**/*.log".into()],
            },
            move |e| events_clone.lock().unwrap().push(e),
        );

        std::thread::sleep(Duration::from_millis(30));
        std::fs::write(&file_path, b"noise").unwrap();
        std::thread::sleep(Duration::from_millis(400));
        monitor.stop();

        assert!(events.lock().unwrap().is_empty());
    }
}
