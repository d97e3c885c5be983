use at_config::GatewayConfig;
use at_schemas::WitnessEvent;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use sysinfo::{Pid, System};

#[derive(Debug, Clone)]
pub struct ProcessMonitorConfig {
    pub polling_interval: Duration,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Copy)]
struct Seen {
    ppid: i64,
}

/// Polls the system process table and emits `process_spawned` /
/// `process_exited` events for the resolved gateway process and its
/// descendants (§4.G). The gateway's PID is re-resolved on every poll, never
/// cached, so a respawned gateway under a new PID is still tracked.
pub struct ProcessMonitor {
    stop: std::sync::Arc<std::sync::atomic::AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl ProcessMonitor {
    pub fn start(
        config: ProcessMonitorConfig,
        on_event: impl Fn(WitnessEvent) + Send + 'static,
    ) -> Self {
        let stop = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
        let stop_clone = stop.clone();
        let thread = std::thread::spawn(move || poll_loop(config, stop_clone, on_event));
        Self {
            stop,
            thread: Some(thread),
        }
    }

    pub fn stop(&mut self) {
        self.stop.store(true, std::sync::atomic::Ordering::SeqCst);
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}

impl Drop for ProcessMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_loop(
    config: ProcessMonitorConfig,
    stop: std::sync::Arc<std::sync::atomic::AtomicBool>,
    on_event: impl Fn(WitnessEvent),
) {
    let mut sys = System::new();
    let mut tracked: HashMap<i64, Seen> = HashMap::new();

    while !stop.load(std::sync::atomic::Ordering::SeqCst) {
        sys.refresh_processes();

        let tree = resolve_gateway_tree(&sys, &config.gateway);
        let now = Utc::now();

        for pid in &tree {
            if tracked.contains_key(pid) {
                continue;
            }
            if let Some(proc) = sys.process(Pid::from_u32(*pid as u32)) {
                let ppid = proc.parent().map(|p| p.as_u32() as i64).unwrap_or(0);
                let command = command_line(proc);
                on_event(WitnessEvent::ProcessSpawned {
                    command,
                    pid: *pid,
                    ppid,
                    observed_at: now,
                });
                tracked.insert(*pid, Seen { ppid });
            }
        }

        let gone: Vec<i64> = tracked
            .keys()
            .filter(|pid| !tree.contains(pid))
            .copied()
            .collect();
        for pid in gone {
            if let Some(seen) = tracked.remove(&pid) {
                on_event(WitnessEvent::ProcessExited {
                    command: String::new(),
                    pid,
                    ppid: seen.ppid,
                    observed_at: now,
                });
            }
        }

        std::thread::sleep(config.polling_interval.min(Duration::from_millis(200)));
        if config.polling_interval > Duration::from_millis(200) {
            let remaining = config.polling_interval - Duration::from_millis(200);
            let mut waited = Duration::ZERO;
            while waited < remaining && !stop.load(std::sync::atomic::Ordering::SeqCst) {
                let step = Duration::from_millis(200).min(remaining - waited);
                std::thread::sleep(step);
                waited += step;
            }
        }
    }
}

fn command_line(proc: &sysinfo::Process) -> String {
    let cmd = proc.cmd();
    if cmd.is_empty() {
        proc.name().to_string()
    } else {
        cmd.iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Resolves the gateway's current PID (by pid-file, then by process-name
/// substring match) and walks the pid→ppid edges to gather its full
/// descendant tree via BFS (§4.G, §9: never cache this across polls).
pub(crate) fn resolve_gateway_tree(
    sys: &System,
    gateway: &GatewayConfig,
) -> std::collections::HashSet<i64> {
    let mut roots: Vec<i64> = Vec::new();

    if let Some(pid_file) = &gateway.pid_file {
        if let Ok(contents) = std::fs::read_to_string(pid_file) {
            if let Ok(pid) = contents.trim().parse::<i64>() {
                roots.push(pid);
            }
        }
    }

    if roots.is_empty() {
        if let Some(name) = &gateway.process_name {
            for (pid, proc) in sys.processes() {
                if proc.name().contains(name.as_str()) {
                    roots.push(pid.as_u32() as i64);
                }
            }
        }
    }

    let mut tree: std::collections::HashSet<i64> = std::collections::HashSet::new();
    let mut queue: std::collections::VecDeque<i64> = roots.into_iter().collect();
    while let Some(pid) = queue.pop_front() {
        if !tree.insert(pid) {
            continue;
        }
        for (child_pid, proc) in sys.processes() {
            if proc.parent().map(|p| p.as_u32() as i64) == Some(pid) {
                queue.push_back(child_pid.as_u32() as i64);
            }
        }
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_gateway_tree_empty_when_unconfigured() {
        let sys = System::new();
        let tree = resolve_gateway_tree(&sys, &GatewayConfig::default());
        assert!(tree.is_empty());
    }

    #[test]
    fn resolve_gateway_tree_by_pid_file_includes_self() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("gateway.pid");
        std::fs::write(&pid_file, std::process::id().to_string()).unwrap();

        let mut sys = System::new();
        sys.refresh_processes();
        let gateway = GatewayConfig {
            pid_file: Some(pid_file.to_string_lossy().to_string()),
            process_name: None,
        };
        let tree = resolve_gateway_tree(&sys, &gateway);
        assert!(tree.contains(&(std::process::id() as i64)));
    }
}
