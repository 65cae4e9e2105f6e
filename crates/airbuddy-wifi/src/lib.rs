//! # airbuddy-wifi
//!
//! Wi-Fi environment telemetry for a Raspberry Pi telemetry node.
//! Turns the text printed by `iwlist` and `iw` into structured records and
//! runs the two tools side by side for a single correlated capture.
//!
//! ## Features
//!
//! - 802.11 Information Element decoding (BSS Load, TPC Report, HT/VHT/HE Operation)
//! - `iwlist <iface> scanning` parsing into per-AP cells
//! - `iw dev <iface> link` parsing, one-shot or as a polled time series
//! - Marking the associated cell with its live bitrates
//! - Dual-phase capture with process-group cancellation
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use airbuddy_wifi::{CaptureConfig, DualPhaseCapture};
//!
//! # async fn run() {
//! let config = CaptureConfig::for_interface("wlan0");
//! let capture = DualPhaseCapture::start(&config);
//! tokio::time::sleep(Duration::from_secs(5)).await;
//! let report = capture.resolve().await;
//! for cell in report.beacons.iter().filter(|c| c.connected) {
//!     println!("{} {}", cell.bssid, cell.tx_bitrate);
//! }
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

pub mod bits;
pub mod bssid;
pub mod cli;
pub mod config;
pub mod correlate;
pub mod error;
pub mod ie;
pub mod link;
pub mod orchestrator;
pub mod process;
pub mod scan;

pub use bssid::{normalize_bssid, same_bssid, MacAddress};
pub use config::{CaptureConfig, CommandSpec, LinkMode};
pub use correlate::correlate;
pub use error::{Result, TelemetryError};
pub use ie::{decode, decode_hex, ElementType, FieldValue, Fields, InformationElement};
pub use link::{parse_link_series, parse_link_summary, LinkSample, LinkSummary};
pub use orchestrator::{scan_once, CaptureReport, CaptureSession, DualPhaseCapture};
pub use process::{BackgroundCommand, CommandOutput};
pub use scan::{parse_cells, ScanCell};
