use crate::process_monitor::resolve_gateway_tree;
use crate::socket_table::{Socket, SocketTable};
use at_config::GatewayConfig;
use at_schemas::WitnessEvent;
use chrono::Utc;
use std::collections::HashSet;
use std::time::Duration;
use sysinfo::System;

#[derive(Debug, Clone)]
pub struct NetworkMonitorConfig {
    pub polling_interval: Duration,
    pub gateway: GatewayConfig,
}

/// Polls open sockets belonging to the gateway's (dynamically re-resolved)
/// process tree and emits `connection_opened` / `connection_closed` events
/// (§4.H). The first scan after start establishes a baseline and never
/// emits opens for it — only subsequent diffs do.
pub struct NetworkMonitor {
    stop: std::sync::Arc<std::sync::atomic::AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl NetworkMonitor {
    pub fn start(
        config: NetworkMonitorConfig,
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

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_loop(
    config: NetworkMonitorConfig,
    stop: std::sync::Arc<std::sync::atomic::AtomicBool>,
    on_event: impl Fn(WitnessEvent),
) {
    let mut sys = System::new();
    let mut previous: HashSet<Socket> = HashSet::new();
    let mut first_scan = true;

    while !stop.load(std::sync::atomic::Ordering::SeqCst) {
        sys.refresh_processes();
        let tree: Vec<i64> = resolve_gateway_tree(&sys, &config.gateway)
            .into_iter()
            .collect();
        let table = SocketTable::snapshot(&tree);
        let current: HashSet<Socket> = table.sockets.into_iter().collect();
        let now = Utc::now();

        if !first_scan {
            for socket in current.difference(&previous) {
                on_event(WitnessEvent::ConnectionOpened {
                    remote_host: socket.remote_host.clone(),
                    remote_port: socket.remote_port,
                    protocol: socket.protocol,
                    pid: socket.pid,
                    command: None,
                    observed_at: now,
                });
            }
            for socket in previous.difference(&current) {
                on_event(WitnessEvent::ConnectionClosed {
                    remote_host: socket.remote_host.clone(),
                    remote_port: socket.remote_port,
                    protocol: socket.protocol,
                    pid: socket.pid,
                    command: None,
                    observed_at: now,
                });
            }
        }
        first_scan = false;
        previous = current;

        sleep_interruptible(config.polling_interval, &stop);
    }
}

fn sleep_interruptible(total: Duration, stop: &std::sync::Arc<std::sync::atomic::AtomicBool>) {
    let step = Duration::from_millis(200);
    let mut waited = Duration::ZERO;
    while waited < total && !stop.load(std::sync::atomic::Ordering::SeqCst) {
        let this_step = step.min(total - waited);
        std::thread::sleep(this_step);
        waited += this_step;
    }
}
