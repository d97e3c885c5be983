//! The witness daemon (§4.F-I): three independent monitors (file, process,
//! network) composed into a single buffered, periodically-flushed event
//! pipeline feeding the witness stream.

mod daemon;
mod exclude;
mod file_monitor;
mod network_monitor;
mod process_monitor;
mod socket_table;

pub use daemon::{to_payload, WitnessDaemon, WitnessDaemonConfig, WitnessDaemonStats};
pub use exclude::{expand_home, is_excluded};
pub use file_monitor::{FileMonitor, FileMonitorConfig};
pub use network_monitor::{NetworkMonitor, NetworkMonitorConfig};
pub use process_monitor::{ProcessMonitor, ProcessMonitorConfig};
pub use socket_table::{Socket, SocketTable};
