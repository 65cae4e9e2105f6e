use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub level: String,
    /// Write rolling log files under `<root>/logs` in addition to stderr.
    pub file_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            file_output: true,
        }
    }
}

impl LoggingConfig {
    /// Config for a one-off command: stderr only, level from `RUST_LOG` when set.
    pub fn stderr_only() -> Self {
        let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
        Self {
            enabled: true,
            level,
            file_output: false,
        }
    }
}
