use std::{net::SocketAddr, path::Path};

use anyhow::Context as _;
use reproxied_core::Config;
use serde::{Deserialize, Serialize};

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_name() -> String {
    "reProxied".to_string()
}

/// Contents of the configuration file: where to listen, plus the middleware settings.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Name shown in the middleware's log lines
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(flatten)]
    pub middleware: Config,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            name: default_name(),
            middleware: Config::default(),
        }
    }
}

impl FileConfig {
    /// Reads a YAML or JSON file, picked by extension (YAML when unsure).
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing json config {}", path.display()))
        } else {
            serde_yaml::from_str(&raw)
                .with_context(|| format!("parsing yaml config {}", path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use reproxied_core::logging::LogLevel;

    use super::*;

    #[test]
    fn test_yaml_config() {
        let raw = r#"
listen: 127.0.0.1:9000
name: edge
proxy: http://proxy:3128
targetHost: https://example.com
keepHostHeader: true
logLevel: debug
"#;
        let config: FileConfig = serde_yaml::from_str(raw).unwrap();
        assert_eq!(config.listen, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.name, "edge");
        assert_eq!(config.middleware.proxy, "http://proxy:3128");
        assert_eq!(config.middleware.target_host, "https://example.com");
        assert!(config.middleware.keep_host_header);
        assert_eq!(config.middleware.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_json_config_defaults() {
        let config: FileConfig =
            serde_json::from_str(r#"{"targetHost": "https://example.com", "logLevel": 1}"#).unwrap();
        assert_eq!(config.listen, default_listen());
        assert_eq!(config.name, "reProxied");
        assert!(config.middleware.proxy.is_empty());
        assert_eq!(config.middleware.log_level, LogLevel::Debug);
    }
}
