//! Parser for `iwlist <iface> scanning` output.
//!
//! The dump is a sequence of `Cell NN - Address: ...` records. Whitespace is
//! collapsed first so every field pattern works regardless of where the tool
//! wrapped its lines, then each record is searched field by field.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use airbuddy_logging::targets::T_WIFI;

use crate::ie::{self, InformationElement};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
/// Header every scan record starts with, after whitespace is collapsed.
static CELL_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Cell \d+ - ").unwrap());
static ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Address: *([0-9A-Fa-f]{2}(?:[:-][0-9A-Fa-f]{2}){5})").unwrap());
static CHANNEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"Channel: *(\d+)").unwrap());
static FREQUENCY: Lazy<Regex> = Lazy::new(|| Regex::new(r"Frequency: *([\d.]+ ?.Hz)").unwrap());
static SIGNAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"Signal level= *([-\d.]+ ?dBm)").unwrap());
static ESSID: Lazy<Regex> = Lazy::new(|| Regex::new(r#"ESSID: *"([^"]*)""#).unwrap());
static RATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(?:\.\d+)? Mb/s").unwrap());
static UNKNOWN_IE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"IE: +Unknown: +([0-9A-Fa-f]+)").unwrap());

/// One access point seen in a scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanCell {
    pub bssid: String,
    pub channel: Option<u32>,
    pub frequency: String,
    pub signal_level: String,
    /// Empty for hidden networks.
    pub ssid: String,
    pub connected: bool,
    pub supported_rates: Vec<String>,
    /// Only filled in on the connected cell.
    pub tx_bitrate: String,
    pub rx_bitrate: String,
    pub information_elements: Vec<InformationElement>,
}

/// Split a scan dump into cells, dropping every record without an address.
pub fn parse_cells(scan_text: &str) -> Vec<ScanCell> {
    let collapsed = WHITESPACE.replace_all(scan_text, " ");
    let cells: Vec<ScanCell> = CELL_HEADER
        .split(&collapsed)
        .filter_map(parse_cell)
        .collect();
    tracing::debug!(target: T_WIFI, "parsed {} cells from scan dump", cells.len());
    cells
}

/// Parse one whitespace-collapsed record. `None` when it carries no BSSID.
pub fn parse_cell(block: &str) -> Option<ScanCell> {
    let bssid = first_capture(&ADDRESS, block)?;

    let information_elements = UNKNOWN_IE
        .captures_iter(block)
        .filter_map(|caps| caps.get(1))
        .map(|m| ie::decode_hex(m.as_str()))
        .collect();

    Some(ScanCell {
        bssid,
        channel: first_capture(&CHANNEL, block).and_then(|c| c.parse().ok()),
        frequency: first_capture(&FREQUENCY, block).unwrap_or_default(),
        signal_level: first_capture(&SIGNAL, block).unwrap_or_default(),
        ssid: first_capture(&ESSID, block).unwrap_or_default(),
        connected: false,
        supported_rates: RATE
            .find_iter(block)
            .map(|m| m.as_str().to_string())
            .collect(),
        tx_bitrate: String::new(),
        rx_bitrate: String::new(),
        information_elements,
    })
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
