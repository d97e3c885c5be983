use crate::file_monitor::{FileMonitor, FileMonitorConfig};
use crate::network_monitor::{NetworkMonitor, NetworkMonitorConfig};
use crate::process_monitor::{ProcessMonitor, ProcessMonitorConfig};
use at_config::WitnessConfig;
use at_schemas::{WitnessEvent, WitnessPayload, WitnessSource};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct WitnessDaemonConfig {
    pub watch_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub process_polling_ms: u64,
    pub network_polling_ms: u64,
    pub buffer_size: usize,
    pub flush_interval: Duration,
    pub gateway: at_config::GatewayConfig,
}

impl From<&WitnessConfig> for WitnessDaemonConfig {
    fn from(c: &WitnessConfig) -> Self {
        Self {
            watch_paths: c.watch_paths.clone(),
            exclude_paths: c.exclude_paths.clone(),
            process_polling_ms: c.process_polling_ms,
            network_polling_ms: c.network_polling_ms,
            buffer_size: c.buffer_size,
            flush_interval: Duration::from_millis(5000),
            gateway: c.gateway.clone(),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct WitnessDaemonStats {
    pub started_at: Option<DateTime<Utc>>,
    pub last_event_at: Option<DateTime<Utc>>,
    pub per_source_counts: HashMap<WitnessSource, u64>,
}

struct Buffer {
    events: Vec<(WitnessSource, WitnessEvent)>,
    stats: WitnessDaemonStats,
}

/// Composes the file/process/network monitors (§4.F-H) into one buffered,
/// periodically-flushed pipeline (§4.I). The buffer and flush callback are
/// the daemon's only shared-mutable state.
pub struct WitnessDaemon {
    file_monitor: Option<FileMonitor>,
    process_monitor: Option<ProcessMonitor>,
    network_monitor: Option<NetworkMonitor>,
    buffer: Arc<Mutex<Buffer>>,
    flush_stop: Option<Arc<std::sync::atomic::AtomicBool>>,
    flush_thread: Option<std::thread::JoinHandle<()>>,
}

impl WitnessDaemon {
    /// `start`: launch all three monitors (failures are logged and
    /// tolerated, not raised) and a periodic flush timer. `on_flush` is
    /// invoked with a drained batch every `flushInterval` or whenever the
    /// buffer reaches `bufferSize`, whichever comes first.
    pub fn start(
        config: WitnessDaemonConfig,
        on_flush: impl Fn(Vec<(WitnessSource, WitnessEvent)>) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        let buffer = Arc::new(Mutex::new(Buffer {
            events: Vec::new(),
            stats: WitnessDaemonStats {
                started_at: Some(Utc::now()),
                ..Default::default()
            },
        }));
        let on_flush = Arc::new(on_flush);
        let buffer_size = config.buffer_size;

        let push_event = {
            let buffer = buffer.clone();
            let on_flush = on_flush.clone();
            move |source: WitnessSource, event: WitnessEvent| {
                let mut batch = None;
                {
                    let mut guard = buffer.lock().unwrap();
                    guard.stats.last_event_at = Some(event.observed_at());
                    *guard.stats.per_source_counts.entry(source).or_insert(0) += 1;
                    guard.events.push((source, event));
                    if guard.events.len() >= buffer_size {
                        batch = Some(std::mem::take(&mut guard.events));
                    }
                }
                if let Some(batch) = batch {
                    if let Err(e) = on_flush(batch) {
                        tracing::warn!(error = %e, "eager flush failed, batch dropped");
                    }
                }
            }
        };

        let file_monitor = {
            let push_event = push_event.clone();
            Some(FileMonitor::start(
                FileMonitorConfig {
                    watch_paths: config.watch_paths.clone(),
                    exclude_paths: config.exclude_paths.clone(),
                },
                move |event| push_event(WitnessSource::Filesystem, event),
            ))
        };

        let process_monitor = {
            let push_event = push_event.clone();
            Some(ProcessMonitor::start(
                ProcessMonitorConfig {
                    polling_interval: Duration::from_millis(config.process_polling_ms),
                    gateway: config.gateway.clone(),
                },
                move |event| push_event(WitnessSource::Process, event),
            ))
        };

        let network_monitor = {
            let push_event = push_event.clone();
            Some(NetworkMonitor::start(
                NetworkMonitorConfig {
                    polling_interval: Duration::from_millis(config.network_polling_ms),
                    gateway: config.gateway.clone(),
                },
                move |event| push_event(WitnessSource::Network, event),
            ))
        };

        let flush_stop = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flush_thread = {
            let buffer = buffer.clone();
            let on_flush = on_flush.clone();
            let flush_stop = flush_stop.clone();
            let interval = config.flush_interval;
            std::thread::spawn(move || {
                let step = Duration::from_millis(100);
                let mut elapsed = Duration::ZERO;
                while !flush_stop.load(std::sync::atomic::Ordering::SeqCst) {
                    std::thread::sleep(step);
                    elapsed += step;
                    if elapsed >= interval {
                        elapsed = Duration::ZERO;
                        flush(&buffer, &*on_flush);
                    }
                }
            })
        };

        Self {
            file_monitor,
            process_monitor,
            network_monitor,
            buffer,
            flush_stop: Some(flush_stop),
            flush_thread: Some(flush_thread),
        }
    }

    pub fn stats(&self) -> WitnessDaemonStats {
        self.buffer.lock().unwrap().stats.clone()
    }

    /// `stop`: cancel the timer, flush one last time, stop all monitors.
    /// Idempotent.
    pub fn stop(&mut self, on_flush: &dyn Fn(Vec<(WitnessSource, WitnessEvent)>) -> anyhow::Result<()>) {
        if let Some(stop) = self.flush_stop.take() {
            stop.store(true, std::sync::atomic::Ordering::SeqCst);
        }
        if let Some(t) = self.flush_thread.take() {
            let _ = t.join();
        }
        if let Some(m) = self.file_monitor.as_mut() {
            m.stop();
        }
        if let Some(m) = self.process_monitor.as_mut() {
            m.stop();
        }
        if let Some(m) = self.network_monitor.as_mut() {
            m.stop();
        }
        flush(&self.buffer, on_flush);
    }
}

fn flush(
    buffer: &Arc<Mutex<Buffer>>,
    on_flush: &dyn Fn(Vec<(WitnessSource, WitnessEvent)>) -> anyhow::Result<()>,
) {
    let batch = {
        let mut guard = buffer.lock().unwrap();
        std::mem::take(&mut guard.events)
    };
    if batch.is_empty() {
        return;
    }
    if let Err(e) = on_flush(batch) {
        tracing::warn!(error = %e, "periodic flush failed, batch dropped");
    }
}

/// Builds the witness stream entry for one tagged event (§4.I flush
/// contract): `source`/`correlated=false` payload, chained via the
/// running last hash supplied by the caller.
pub fn to_payload(source: WitnessSource, event: WitnessEvent) -> WitnessPayload {
    WitnessPayload {
        source,
        correlated: false,
        event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn eager_flush_triggers_at_buffer_size() {
        let dir = tempfile::tempdir().unwrap();
        let watch_path = dir.path().to_string_lossy().to_string();

        let flush_count = Arc::new(AtomicUsize::new(0));
        let flush_count_clone = flush_count.clone();

        let mut daemon = WitnessDaemon::start(
            WitnessDaemonConfig {
                watch_paths: vec![watch_path],
                exclude_paths: vec![],
                process_polling_ms: 1000,
                network_polling_ms: 1000,
                buffer_size: 2,
                flush_interval: Duration::from_secs(60),
                gateway: at_config::GatewayConfig::default(),
            },
            move |_batch| {
                flush_count_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        );

        std::thread::sleep(Duration::from_millis(50));
        std::fs::write(dir.path().join("a.txt"), b"one").unwrap();
        std::fs::write(dir.path().join("b.txt"), b"two").unwrap();
        std::thread::sleep(Duration::from_millis(400));
        let on_flush = move |_batch: Vec<(WitnessSource, WitnessEvent)>| Ok(());
        daemon.stop(&on_flush);

        assert!(flush_count.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut daemon = WitnessDaemon::start(
            WitnessDaemonConfig {
                watch_paths: vec![],
                exclude_paths: vec![],
                process_polling_ms: 1000,
                network_polling_ms: 1000,
                buffer_size: 200,
                flush_interval: Duration::from_secs(60),
                gateway: at_config::GatewayConfig::default(),
            },
            |_batch| Ok(()),
        );
        let on_flush = |_batch: Vec<(WitnessSource, WitnessEvent)>| Ok(());
        daemon.stop(&on_flush);
        daemon.stop(&on_flush);
    }
}
