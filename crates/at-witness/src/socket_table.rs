use at_schemas::ConnectionProtocol;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Socket {
    pub protocol: ConnectionProtocol,
    pub remote_host: String,
    pub remote_port: Option<u16>,
    pub pid: i64,
}

/// A snapshot of the system's open sockets, attributed to owning PIDs via
/// `/proc/<pid>/fd` inode resolution (§4.H). Non-Linux platforms always
/// yield an empty table.
#[derive(Debug, Default)]
pub struct SocketTable {
    pub sockets: Vec<Socket>,
}

impl SocketTable {
    #[cfg(target_os = "linux")]
    pub fn snapshot(pids: &[i64]) -> Self {
        let inode_to_pid = map_inodes_to_pids(pids);

        let mut sockets = Vec::new();
        for (path, protocol) in [
            ("/proc/net/tcp", ConnectionProtocol::Tcp),
            ("/proc/net/tcp6", ConnectionProtocol::Tcp),
            ("/proc/net/udp", ConnectionProtocol::Udp),
            ("/proc/net/udp6", ConnectionProtocol::Udp),
        ] {
            if let Ok(contents) = std::fs::read_to_string(path) {
                for entry in parse_proc_net(&contents) {
                    if let Some(pid) = inode_to_pid.get(&entry.inode) {
                        sockets.push(Socket {
                            protocol,
                            remote_host: entry.remote_host,
                            remote_port: entry.remote_port,
                            pid: *pid,
                        });
                    }
                }
            }
        }
        Self { sockets }
    }

    #[cfg(not(target_os = "linux"))]
    pub fn snapshot(_pids: &[i64]) -> Self {
        Self::default()
    }
}

struct RawEntry {
    remote_host: String,
    remote_port: Option<u16>,
    inode: u64,
}

#[cfg(target_os = "linux")]
fn map_inodes_to_pids(pids: &[i64]) -> HashMap<u64, i64> {
    let mut map = HashMap::new();
    for pid in pids {
        let fd_dir = format!("/proc/{pid}/fd");
        let entries = match std::fs::read_dir(&fd_dir) {
            Ok(e) => e,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            if let Ok(link) = std::fs::read_link(entry.path()) {
                if let Some(name) = link.to_str() {
                    if let Some(inode) = name
                        .strip_prefix("socket:[")
                        .and_then(|s| s.strip_suffix(']'))
                        .and_then(|s| s.parse::<u64>().ok())
                    {
                        map.insert(inode, *pid);
                    }
                }
            }
        }
    }
    map
}

/// Parses the fixed-width lines of `/proc/net/{tcp,udp}[6]` (header line
/// skipped), extracting the remote address/port and backing inode.
#[cfg(target_os = "linux")]
fn parse_proc_net(contents: &str) -> Vec<RawEntry> {
    contents
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 10 {
                return None;
            }
            let rem_field = fields[2];
            let (host_hex, port_hex) = rem_field.split_once(':')?;
            let remote_port = u16::from_str_radix(port_hex, 16).ok();
            let remote_host = decode_hex_addr(host_hex);
            let inode = fields[9].parse::<u64>().ok()?;
            // §4.H: drop listening sockets (no remote peer), localhost, and the
            // 0.0.0.0 sentinel during parse.
            if remote_port == Some(0)
                || remote_host == "0.0.0.0"
                || remote_host == "::"
                || remote_host == "127.0.0.1"
                || remote_host == "::1"
            {
                return None;
            }
            Some(RawEntry {
                remote_host,
                remote_port,
                inode,
            })
        })
        .collect()
}

#[cfg(target_os = "linux")]
fn decode_hex_addr(hex: &str) -> String {
    if hex.len() == 8 {
        let bytes: Vec<u8> = (0..4)
            .filter_map(|i| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok())
            .collect();
        if bytes.len() == 4 {
            return format!("{}.{}.{}.{}", bytes[3], bytes[2], bytes[1], bytes[0]);
        }
    } else if hex.len() == 32 {
        // Four 32-bit words, each stored byte-reversed within the word (same
        // host-endian quirk as the IPv4 case above).
        let parsed: Option<Vec<u8>> = (0..16)
            .map(|i| u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok())
            .collect();
        if let Some(parsed) = parsed {
            let mut bytes = [0u8; 16];
            for word in 0..4 {
                for i in 0..4 {
                    bytes[word * 4 + i] = parsed[word * 4 + (3 - i)];
                }
            }
            return std::net::Ipv6Addr::from(bytes).to_string();
        }
    }
    hex.to_string()
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;

    #[test]
    fn decodes_ipv4_loopback() {
        assert_eq!(decode_hex_addr("0100007F"), "127.0.0.1");
    }

    #[test]
    fn decodes_ipv6_loopback() {
        assert_eq!(decode_hex_addr("00000000000000000000000001000000"), "::1");
    }

    #[test]
    fn parses_tcp_table_line() {
        let sample = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode\n   0: 0100007F:1F90 0200007F:01BB 01 00000000:00000000 00:00000000 00000000  1000        0 12345 1 0000000000000000 20 0 0 10 0";
        let entries = parse_proc_net(sample);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].remote_host, "127.0.0.2");
        assert_eq!(entries[0].remote_port, Some(443));
        assert_eq!(entries[0].inode, 12345);
    }

    #[test]
    fn drops_ipv4_and_ipv6_loopback_peers() {
        let sample = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode\n   0: 0100007F:1F90 0100007F:01BB 01 00000000:00000000 00:00000000 00000000  1000        0 12345 1 0000000000000000 20 0 0 10 0\n   1: 0100007F:1F90 00000000000000000000000001000000:01BB 01 00000000:00000000 00:00000000 00000000  1000        0 12346 1 0000000000000000 20 0 0 10 0";
        let entries = parse_proc_net(sample);
        assert!(entries.is_empty());
    }
}
