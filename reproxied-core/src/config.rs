use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

/// Middleware configuration.
///
/// Field names follow the plugin's camelCase convention, so the same document can be
/// written by hand in YAML or JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Forward proxy used for outbound calls. Empty means "connect directly".
    pub proxy: String,
    /// Absolute url giving the scheme and host requests are rewritten to.
    pub target_host: String,
    /// Keep the caller's `Host` header instead of replacing it with the target host.
    pub keep_host_header: bool,
    pub log_level: LogLevel,
}

impl Config {
    pub fn new(proxy: impl Into<String>, target_host: impl Into<String>) -> Self {
        Self {
            proxy: proxy.into(),
            target_host: target_host.into(),
            ..Self::default()
        }
    }

    pub fn with_keep_host_header(mut self, keep_host_header: bool) -> Self {
        self.keep_host_header = keep_host_header;
        self
    }

    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}
