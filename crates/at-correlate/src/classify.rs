use at_config::InfrastructurePattern;
use at_schemas::{WitnessEntry, WitnessEvent, WitnessSource};

/// ~30 names, browsers/OS daemons/IDEs/AI desktop apps/printers/mDNS, etc.
/// (§4.K bucket 1). Matched case-insensitively as a substring of the
/// witnessed command.
const SYSTEM_PROCESS_EXCLUSIONS: &[&str] = &[
    "chrome", "chromium", "firefox", "safari", "msedge", "opera", "brave",
    "systemd", "launchd", "svchost.exe", "explorer.exe", "finder", "dbus-daemon",
    "code", "code-insiders", "cursor", "intellij", "pycharm", "webstorm", "sublime_text",
    "claude desktop", "chatgpt", "slack", "discord", "zoom", "teams",
    "cupsd", "spoolsv.exe", "mdnsresponder", "avahi-daemon",
    "windowserver", "coreaudiod",
];

#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub background_noise: Vec<String>,
    pub infrastructure_traffic: Vec<String>,
    pub agent_observations: Vec<String>,
}

/// §4.K: partitions unmatched witness entries into background noise,
/// infrastructure traffic, and agent observations. Only the last bucket
/// produces findings.
pub fn classify(
    unmatched: &[&WitnessEntry],
    infrastructure_patterns: &[InfrastructurePattern],
) -> Classification {
    let mut out = Classification::default();

    for entry in unmatched {
        if entry.payload.source == WitnessSource::Network {
            if is_background_noise(entry) {
                out.background_noise.push(entry.id.clone());
                continue;
            }
            if is_infrastructure_traffic(entry, infrastructure_patterns) {
                out.infrastructure_traffic.push(entry.id.clone());
                continue;
            }
        }
        out.agent_observations.push(entry.id.clone());
    }

    out
}

fn is_background_noise(entry: &WitnessEntry) -> bool {
    let Some(command) = entry.payload.event.command() else {
        return false;
    };
    let command = command.to_lowercase();
    SYSTEM_PROCESS_EXCLUSIONS
        .iter()
        .any(|name| command.contains(name))
}

fn is_infrastructure_traffic(entry: &WitnessEntry, patterns: &[InfrastructurePattern]) -> bool {
    let (host, port) = match &entry.payload.event {
        WitnessEvent::ConnectionOpened {
            remote_host,
            remote_port,
            ..
        }
        | WitnessEvent::ConnectionClosed {
            remote_host,
            remote_port,
            ..
        } => (remote_host.as_str(), *remote_port),
        _ => return false,
    };
    patterns.iter().any(|p| pattern_matches(p, host, port))
}

fn pattern_matches(pattern: &InfrastructurePattern, host: &str, port: Option<u16>) -> bool {
    if let (Some(pattern_port), Some(observed_port)) = (pattern.port, port) {
        if pattern_port != observed_port {
            return false;
        }
    }

    if let Some(suffix) = pattern.host.strip_prefix("*.") {
        return host.eq_ignore_ascii_case(suffix) || host.to_lowercase().ends_with(&format!(".{}", suffix.to_lowercase()));
    }
    if let Some(prefix) = pattern.host.strip_suffix('*') {
        return host.starts_with(prefix);
    }
    host.eq_ignore_ascii_case(&pattern.host)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(host: &str, port: Option<u16>) -> InfrastructurePattern {
        InfrastructurePattern {
            host: host.into(),
            port,
            label: "test".into(),
        }
    }

    #[test]
    fn subdomain_wildcard_matches_apex_and_subdomains() {
        let p = pattern("*.anthropic.com", None);
        assert!(pattern_matches(&p, "anthropic.com", None));
        assert!(pattern_matches(&p, "api.anthropic.com", None));
        assert!(!pattern_matches(&p, "evil.com", None));
    }

    #[test]
    fn ipv4_prefix_wildcard_matches() {
        let p = pattern("140.82.112.*", None);
        assert!(pattern_matches(&p, "140.82.112.3", None));
        assert!(!pattern_matches(&p, "140.82.113.3", None));
    }

    #[test]
    fn port_mismatch_rejects() {
        let p = pattern("api.anthropic.com", Some(443));
        assert!(!pattern_matches(&p, "api.anthropic.com", Some(80)));
        assert!(pattern_matches(&p, "api.anthropic.com", Some(443)));
        assert!(pattern_matches(&p, "api.anthropic.com", None));
    }
}
