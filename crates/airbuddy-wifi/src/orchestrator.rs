//! Dual-phase capture: a one-shot scan and a link query run side by side,
//! then get joined by the caller.
//!
//! ```text
//! start() ──► RUNNING ── resolve() ──► RESOLVED (CaptureReport)
//!              │ scan: iwlist <if> scanning            (waited, timeout = hard kill)
//!              │ link: delayed query | polling loop    (waited | group-cancelled)
//! ```
//!
//! Each branch is a [`BackgroundCommand`] in its own process group. A branch
//! that fails to start, times out or exits with an error degrades to empty
//! output; nothing fails past [`DualPhaseCapture::resolve`].

use chrono::{DateTime, Local};
use nix::unistd::Pid;
use serde::Serialize;

use airbuddy_logging::targets::T_WIFI;

use crate::config::{CaptureConfig, CommandSpec, LinkMode};
use crate::correlate::correlate;
use crate::error::{Result, TelemetryError};
use crate::link::{parse_link_series, parse_link_summary, LinkSample, LinkSummary};
use crate::process::{BackgroundCommand, CommandOutput};
use crate::scan::{parse_cells, ScanCell};

/// One scan pass plus the link data captured alongside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureSession {
    /// Correlated against `link`.
    pub cells: Vec<ScanCell>,
    pub link: LinkSummary,
    /// Empty unless the link text came from the polling loop.
    pub samples: Vec<LinkSample>,
}

impl CaptureSession {
    pub fn from_outputs(scan_text: &str, link_text: &str) -> Self {
        let link = parse_link_summary(link_text);
        let cells = correlate(parse_cells(scan_text), &link);
        let samples = parse_link_series(link_text);
        Self {
            cells,
            link,
            samples,
        }
    }

    pub fn into_report(self, started_at: DateTime<Local>, interface: &str) -> CaptureReport {
        CaptureReport {
            timestamp: started_at.to_rfc3339(),
            interface: interface.to_string(),
            beacons: self.cells,
            links: self.samples,
        }
    }
}

/// Serialisable record of a resolved capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureReport {
    /// Local time the capture started, RFC 3339.
    pub timestamp: String,
    pub interface: String,
    pub beacons: Vec<ScanCell>,
    pub links: Vec<LinkSample>,
}

enum Branch {
    Running(BackgroundCommand),
    Failed(TelemetryError),
}

impl Branch {
    fn start(spec: &CommandSpec, what: &str) -> Self {
        match BackgroundCommand::spawn(spec) {
            Ok(cmd) => Self::Running(cmd),
            Err(err) => {
                tracing::warn!(target: T_WIFI, "{} command not started: {}", what, err);
                Self::Failed(err)
            }
        }
    }

    fn pgid(&self) -> Option<Pid> {
        match self {
            Self::Running(cmd) => Some(cmd.pgid()),
            Self::Failed(_) => None,
        }
    }
}

/// Both capture branches, owned until [`resolve`](Self::resolve).
pub struct DualPhaseCapture {
    config: CaptureConfig,
    started_at: DateTime<Local>,
    scan: Branch,
    link: Branch,
}

impl DualPhaseCapture {
    /// Launch the scan and the link query. Must be called inside a Tokio
    /// runtime; otherwise both branches are recorded as failed.
    pub fn start(config: &CaptureConfig) -> Self {
        let started_at = Local::now();

        let (scan, link) = match config.validate() {
            Ok(()) => (
                Branch::start(&config.scan_command(), "scan"),
                Branch::start(&config.link_command(), "link"),
            ),
            Err(err) => {
                tracing::warn!(target: T_WIFI, "capture not started: {}", err);
                (
                    Branch::Failed(TelemetryError::Config(err.to_string())),
                    Branch::Failed(err),
                )
            }
        };

        tracing::info!(
            target: T_WIFI,
            interface = %config.interface,
            mode = ?config.link_mode,
            "capture started"
        );

        Self {
            config: config.clone(),
            started_at,
            scan,
            link,
        }
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Process group of the running scan, if it started.
    pub fn scan_pgid(&self) -> Option<Pid> {
        self.scan.pgid()
    }

    /// Process group of the running link query, if it started.
    pub fn link_pgid(&self) -> Option<Pid> {
        self.link.pgid()
    }

    /// Stop or join the link query, then join the scan, and correlate what
    /// both produced. When this returns neither process group exists.
    pub async fn resolve(self) -> CaptureReport {
        let Self {
            config,
            started_at,
            scan,
            link,
        } = self;

        let link_text = match link {
            Branch::Running(cmd) => match config.link_mode {
                // killed on purpose, so a signal exit status still carries data
                LinkMode::Continuous => {
                    text_or_empty(cmd.cancel(config.cancel_grace).await, "link")
                }
                LinkMode::Delayed { .. } => {
                    successful_text(cmd.wait(config.link_timeout).await, "link")
                }
            },
            Branch::Failed(err) => {
                tracing::debug!(target: T_WIFI, "link branch empty: {}", err);
                String::new()
            }
        };

        let scan_text = match scan {
            Branch::Running(cmd) => successful_text(cmd.wait(config.scan_timeout).await, "scan"),
            Branch::Failed(err) => {
                tracing::debug!(target: T_WIFI, "scan branch empty: {}", err);
                String::new()
            }
        };

        let session = CaptureSession::from_outputs(&scan_text, &link_text);
        tracing::info!(
            target: T_WIFI,
            cells = session.cells.len(),
            samples = session.samples.len(),
            connected = %session.link.bssid,
            "capture resolved"
        );
        session.into_report(started_at, &config.interface)
    }
}

/// Scan to completion, then query the link once, then correlate. Failing
/// steps contribute nothing.
pub async fn scan_once(config: &CaptureConfig) -> Vec<ScanCell> {
    if let Err(err) = config.validate() {
        tracing::warn!(target: T_WIFI, "scan not started: {}", err);
        return Vec::new();
    }

    let scan_text = run_to_completion(&config.scan_command(), config.scan_timeout, "scan").await;
    let link_text =
        run_to_completion(&config.link_query_command(), config.link_timeout, "link").await;

    CaptureSession::from_outputs(&scan_text, &link_text).cells
}

async fn run_to_completion(spec: &CommandSpec, timeout: std::time::Duration, what: &str) -> String {
    match BackgroundCommand::spawn(spec) {
        Ok(cmd) => text_or_empty(cmd.wait(timeout).await, what),
        Err(err) => {
            tracing::warn!(target: T_WIFI, "{} command not started: {}", what, err);
            String::new()
        }
    }
}

/// Like [`text_or_empty`], but any unsuccessful exit also empties the
/// branch, even one that wrote nothing to stderr.
fn successful_text(result: Result<CommandOutput>, what: &str) -> String {
    match result {
        Ok(output) if output.status.is_some_and(|status| status.success()) => output.stdout,
        Ok(output) => {
            tracing::warn!(
                target: T_WIFI,
                "{} branch degraded to empty: exited with {:?}",
                what,
                output.status
            );
            String::new()
        }
        Err(err) => text_or_empty(Err(err), what),
    }
}

fn text_or_empty(result: Result<CommandOutput>, what: &str) -> String {
    match result {
        Ok(output) => output.stdout,
        Err(err) => {
            tracing::warn!(target: T_WIFI, "{} branch degraded to empty: {}", what, err);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCAN: &str = "\
          Cell 01 - Address: AA:BB:CC:DD:EE:FF
                    Channel:36
                    ESSID:\"HomeNet\"
                    IE: Unknown: 0B040500800000
          Cell 02 - Address: 11:22:33:44:55:66
                    Channel:6
                    ESSID:\"Neighbour\"
";

    const POLLS: &str = "\
2024-05-01T10:00:00,100000000+00:00
Connected to aa:bb:cc:dd:ee:ff (on wlan0)
\tsignal: -40 dBm
\trx bitrate: 65.0 MBit/s
\ttx bitrate: 72.2 MBit/s
2024-05-01T10:00:01,100000000+00:00
Connected to aa:bb:cc:dd:ee:ff (on wlan0)
\tsignal: -43 dBm
\trx bitrate: 130.0 MBit/s
\ttx bitrate: 144.4 MBit/s
";

    #[test]
    fn session_correlates_latest_poll() {
        let session = CaptureSession::from_outputs(SCAN, POLLS);
        assert_eq!(session.cells.len(), 2);
        assert!(session.cells[0].connected);
        assert_eq!(session.cells[0].tx_bitrate, "144.4 MBit/s");
        assert!(!session.cells[1].connected);
        assert_eq!(session.samples.len(), 2);
        assert_eq!(session.samples[1].rssi, "-43 dBm");
    }

    #[test]
    fn empty_link_text_leaves_cells_unmarked() {
        let session = CaptureSession::from_outputs(SCAN, "");
        assert_eq!(session.cells.len(), 2);
        assert!(session.cells.iter().all(|c| !c.connected));
        assert!(session.samples.is_empty());
        assert!(!session.link.is_connected());
    }

    #[test]
    fn report_shape() {
        let started_at = Local::now();
        let report = CaptureSession::from_outputs(SCAN, POLLS).into_report(started_at, "wlan0");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["interface"], "wlan0");
        assert_eq!(value["timestamp"], started_at.to_rfc3339());
        assert_eq!(value["beacons"].as_array().unwrap().len(), 2);
        assert_eq!(value["links"][0]["timestamp"], "2024-05-01T10:00:00.100000000+00:00");
        assert!(DateTime::parse_from_rfc3339(&report.timestamp).is_ok());
    }

    #[tokio::test]
    async fn invalid_interface_degrades_both_branches() {
        let config = CaptureConfig::for_interface("wlan0; rm -rf /");
        let capture = DualPhaseCapture::start(&config);
        assert!(capture.scan_pgid().is_none());
        assert!(capture.link_pgid().is_none());
        let report = capture.resolve().await;
        assert!(report.beacons.is_empty());
        assert!(report.links.is_empty());

        assert!(scan_once(&config).await.is_empty());
    }
}
