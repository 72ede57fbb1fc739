use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const DEFAULT_PORT: u16 = 4400;
const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_DEPTH: u32 = 5;
const DEFAULT_MAX_TOPIC_LEN: usize = 50;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── LimitsConfig ─────────────────────────────────────────────────────────────

/// Request validation bounds and fan-out capping (`[limits]` in config.toml).
///
/// These bound what the REST layer accepts; the graph builder itself places
/// no limit on depth or topic length beyond what it is handed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum accepted `depth` query parameter (default: 5).
    pub max_depth: u32,
    /// Maximum accepted topic length in characters (default: 50).
    pub max_topic_len: usize,
    /// Cap on concurrent upstream fetches per build. 0 = unlimited.
    pub max_concurrent_fetches: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_topic_len: DEFAULT_MAX_TOPIC_LEN,
            max_concurrent_fetches: 0,
        }
    }
}

// ─── GraphdConfig ─────────────────────────────────────────────────────────────

/// Daemon configuration: defaults < config.toml < CLI flags / env vars.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphdConfig {
    /// REST API port.
    pub port: u16,
    /// Bind address (default: 127.0.0.1; use 0.0.0.0 for LAN access).
    pub bind_address: String,
    /// MediaWiki action API endpoint.
    pub api_url: String,
    /// Per-request timeout toward the upstream API, in seconds.
    pub fetch_timeout_secs: u64,
    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,
    pub limits: LimitsConfig,
}

impl Default for GraphdConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: default_bind_address(),
            api_url: DEFAULT_API_URL.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            log_level: "info".to_string(),
            limits: LimitsConfig::default(),
        }
    }
}

impl GraphdConfig {
    /// Loads config from the given TOML file, falling back to defaults when
    /// no file is given. Flag/env overrides are applied afterwards by main.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let Some(path) = file else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        info!(path = %path.display(), "loaded config file");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = GraphdConfig::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.limits.max_depth, 5);
        assert_eq!(config.limits.max_concurrent_fetches, 0);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: GraphdConfig = toml::from_str(
            r#"
            port = 9000

            [limits]
            max_depth = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.limits.max_depth, 3);
        assert_eq!(config.limits.max_topic_len, DEFAULT_MAX_TOPIC_LEN);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
