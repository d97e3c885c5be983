//! The config loader (§6.3, §6.4): `.agenttrust/config.yaml`, read
//! leniently. A missing file is silent; a malformed one logs and falls back
//! to empty defaults (§7 `ConfigError` — never surfaced to the caller as an
//! error).

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayConfig {
    pub pid_file: Option<String>,
    pub process_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WitnessConfig {
    pub enabled: bool,
    pub watch_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub process_polling_ms: u64,
    pub network_polling_ms: u64,
    pub buffer_size: usize,
    pub gateway: GatewayConfig,
}

impl Default for WitnessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            watch_paths: Vec::new(),
            exclude_paths: Vec::new(),
            process_polling_ms: 1000,
            network_polling_ms: 1000,
            buffer_size: 200,
            gateway: GatewayConfig::default(),
        }
    }
}

/// One entry of the infrastructure-pattern union (§4.K grammar): exact host,
/// `*.`-subdomain wildcard, or a bare prefix wildcard on an IPv4/IPv6
/// literal, with an optional port constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructurePattern {
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceConfig {
    pub witness: WitnessConfig,
    pub infrastructure_patterns: Vec<InfrastructurePattern>,
    /// Rule preset/overrides for the external rule engine (§6.3). This core
    /// never interprets it — it is passed through opaquely to whatever rule
    /// engine the caller wires in.
    #[serde(default)]
    pub rules: serde_json::Value,
}

/// Load `config.yaml` at `path`. A missing file yields
/// `WorkspaceConfig::default()` silently; a malformed one logs a warning and
/// does the same (§7: `ConfigError` is swallowed, never propagated).
pub fn load_config(path: &Path) -> WorkspaceConfig {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "no workspace config, using defaults");
            return WorkspaceConfig::default();
        }
    };
    match serde_yaml::from_str(&raw) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "malformed workspace config, using defaults");
            WorkspaceConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults_silently() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("config.yaml"));
        assert_eq!(cfg, WorkspaceConfig::default());
    }

    #[test]
    fn malformed_yaml_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "witness: [this is not, a map}").unwrap();
        let cfg = load_config(&path);
        assert_eq!(cfg, WorkspaceConfig::default());
    }

    #[test]
    fn parses_witness_and_infrastructure_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            r#"
witness:
  watchPaths: ["~/projects"]
  bufferSize: 50
  gateway:
    processName: "claude"
infrastructurePatterns:
  - host: "*.anthropic.com"
    port: 443
    label: "anthropic"
"#,
        )
        .unwrap();
        let cfg = load_config(&path);
        assert_eq!(cfg.witness.watch_paths, vec!["~/projects".to_string()]);
        assert_eq!(cfg.witness.buffer_size, 50);
        assert_eq!(cfg.witness.gateway.process_name.as_deref(), Some("claude"));
        assert_eq!(cfg.infrastructure_patterns.len(), 1);
        assert_eq!(cfg.infrastructure_patterns[0].port, Some(443));
    }
}
