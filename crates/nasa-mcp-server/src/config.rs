//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the MCP server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `3000`; `0` auto-assigns).
    pub port: u16,
    /// Evict sessions idle for this many seconds.
    pub idle_timeout_secs: u64,
    /// Interval between idle-eviction sweeps, in seconds.
    pub sweep_interval_secs: u64,
    /// Outbound events retained per session for stream replay.
    pub event_log_capacity: usize,
    /// Upstream NASA Images API base URL.
    pub catalog_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            idle_timeout_secs: 30 * 60,
            sweep_interval_secs: 60,
            event_log_capacity: 256,
            catalog_base_url: nasa_mcp_catalog::DEFAULT_BASE_URL.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bind() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 3000);
    }

    #[test]
    fn default_eviction_policy() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.idle_timeout_secs, 1800);
        assert_eq!(cfg.sweep_interval_secs, 60);
    }

    #[test]
    fn default_catalog_url() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.catalog_base_url, "https://images-api.nasa.gov");
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.event_log_capacity, cfg.event_log_capacity);
        assert_eq!(back.catalog_base_url, cfg.catalog_base_url);
    }

    #[test]
    fn deserialize_from_json_string() {
        let json = r#"{"host":"0.0.0.0","port":8080,"idle_timeout_secs":60,"sweep_interval_secs":5,"event_log_capacity":32,"catalog_base_url":"http://localhost:9999"}"#;
        let cfg: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.event_log_capacity, 32);
    }
}
