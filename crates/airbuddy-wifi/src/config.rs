use std::env;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TelemetryError};

pub const DEFAULT_INTERFACE: &str = "wlan0";
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LINK_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CANCEL_GRACE_MS: u64 = 500;
pub const DEFAULT_LINK_WAIT_SECS: u64 = 1;

/// Program plus arguments, run without a shell unless the program is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `sh -c <script>`
    pub fn shell(script: impl Into<String>) -> Self {
        Self::new("sh", ["-c".to_string(), script.into()])
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// How the link branch of a capture observes the association.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LinkMode {
    /// One query after `wait`; resolution waits for it to finish.
    Delayed { wait: Duration },
    /// Timestamped queries in a loop until resolution cancels it.
    #[default]
    Continuous,
}

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub interface: String,
    /// Prefix the wireless tools with `sudo -n`.
    pub use_sudo: bool,
    /// Hard deadline for the scan command (and for a delayed link query).
    pub scan_timeout: Duration,
    /// Hard deadline for the one-shot link query.
    pub link_timeout: Duration,
    /// Time between SIGINT and SIGKILL when cancelling the poll loop.
    pub cancel_grace: Duration,
    pub link_mode: LinkMode,
    /// Replaces the `iwlist` invocation.
    pub scan_command: Option<CommandSpec>,
    /// Replaces the link command for the configured mode.
    pub link_command: Option<CommandSpec>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interface: DEFAULT_INTERFACE.to_string(),
            use_sudo: false,
            scan_timeout: Duration::from_secs(DEFAULT_SCAN_TIMEOUT_SECS),
            link_timeout: Duration::from_secs(DEFAULT_LINK_TIMEOUT_SECS),
            cancel_grace: Duration::from_millis(DEFAULT_CANCEL_GRACE_MS),
            link_mode: LinkMode::Continuous,
            scan_command: None,
            link_command: None,
        }
    }
}

impl CaptureConfig {
    pub fn for_interface(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let interface = env::var("AIRBUDDY_IFACE").unwrap_or(defaults.interface);
        let use_sudo = env_bool("AIRBUDDY_USE_SUDO", defaults.use_sudo);
        let scan_timeout = env_u64("AIRBUDDY_SCAN_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.scan_timeout);
        let link_timeout = env_u64("AIRBUDDY_LINK_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.link_timeout);
        let cancel_grace = env_u64("AIRBUDDY_CANCEL_GRACE_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.cancel_grace);
        let link_wait = Duration::from_secs(
            env_u64("AIRBUDDY_LINK_WAIT_SECS").unwrap_or(DEFAULT_LINK_WAIT_SECS),
        );
        let link_mode = match env::var("AIRBUDDY_LINK_MODE").ok().as_deref() {
            Some("delayed") => LinkMode::Delayed { wait: link_wait },
            _ => LinkMode::Continuous,
        };

        Self {
            interface,
            use_sudo,
            scan_timeout,
            link_timeout,
            cancel_grace,
            link_mode,
            scan_command: None,
            link_command: None,
        }
    }

    /// The interface name ends up inside a shell script, so only accept what
    /// the kernel accepts for interface names.
    pub fn validate(&self) -> Result<()> {
        let name = &self.interface;
        let valid_chars = name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if name.is_empty() || name.len() > 15 || !valid_chars {
            return Err(TelemetryError::Config(format!(
                "invalid interface name '{}'",
                name
            )));
        }
        Ok(())
    }

    fn tool(&self, program: &str) -> String {
        if self.use_sudo {
            format!("sudo -n {program}")
        } else {
            program.to_string()
        }
    }

    fn tool_command(&self, program: &str, args: &[&str]) -> CommandSpec {
        if self.use_sudo {
            let mut full = vec!["-n", program];
            full.extend_from_slice(args);
            CommandSpec::new("sudo", full)
        } else {
            CommandSpec::new(program, args.iter().copied())
        }
    }

    pub fn scan_command(&self) -> CommandSpec {
        self.scan_command
            .clone()
            .unwrap_or_else(|| self.tool_command("iwlist", &[self.interface.as_str(), "scanning"]))
    }

    /// Single `iw dev <iface> link` query, unless `link_command` overrides it.
    pub fn link_query_command(&self) -> CommandSpec {
        self.link_command
            .clone()
            .unwrap_or_else(|| self.tool_command("iw", &["dev", self.interface.as_str(), "link"]))
    }

    /// Link command for the configured mode.
    pub fn link_command(&self) -> CommandSpec {
        if let Some(spec) = &self.link_command {
            return spec.clone();
        }
        let iw = self.tool("iw");
        match self.link_mode {
            LinkMode::Delayed { wait } => CommandSpec::shell(format!(
                "sleep {}; {iw} dev {} link",
                wait.as_secs_f64(),
                self.interface
            )),
            LinkMode::Continuous => CommandSpec::shell(format!(
                "while true; do date -Ins; {iw} dev {} link; done",
                self.interface
            )),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.trim().parse::<u64>().ok())
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}
