//! Error types for airbuddy-wifi

use std::time::Duration;

use thiserror::Error;

/// Result type alias for capture operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while driving the external scan and link commands.
///
/// Parsing and decoding never produce these; the orchestrator turns them into
/// empty branch results before anything reaches its caller.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The command could not be started
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command did not finish in time and was killed
    #[error("`{command}` timed out after {elapsed:?}")]
    Timeout { command: String, elapsed: Duration },

    /// The command exited unsuccessfully
    #[error("`{command}` exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: String,
        stderr: String,
    },

    /// Signalling a process group failed
    #[error("Signal error: {0}")]
    Signal(String),

    /// Invalid MAC address text
    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    /// Text that is not an even-length run of hex digits
    #[error("Invalid IE hex: {0}")]
    InvalidHex(String),

    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TelemetryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<nix::Error> for TelemetryError {
    fn from(err: nix::Error) -> Self {
        match err {
            nix::Error::EPERM => Self::Signal(format!("Operation not permitted: {}", err)),
            nix::Error::ESRCH => Self::Signal(format!("No such process group: {}", err)),
            _ => Self::Signal(format!("System error: {}", err)),
        }
    }
}
