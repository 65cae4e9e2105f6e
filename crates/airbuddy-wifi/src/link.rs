//! Parsers for `iw dev <iface> link` output.
//!
//! A single query gives the current association ([`LinkSummary`]). The polling
//! loop prints a `date -Ins` line before every query; its output becomes a
//! [`LinkSample`] series.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use airbuddy_logging::targets::T_WIFI;

use crate::bssid::normalize_bssid;

static CONNECTED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Connected to *([0-9a-f]{2}(?:[:-][0-9a-f]{2}){5})").unwrap()
});
static TX_BITRATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"tx bitrate: *(.+)").unwrap());
static RX_BITRATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"rx bitrate: *(.+)").unwrap());
static SIGNAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"signal: *([-\d.]+ ?dBm)").unwrap());
static TIMESTAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}[,.]\d+[+-]\d{2}:\d{2}").unwrap()
});

/// Current association. All fields are empty when not associated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSummary {
    pub bssid: String,
    pub tx_bitrate: String,
    pub rx_bitrate: String,
}

impl LinkSummary {
    pub fn is_connected(&self) -> bool {
        !self.bssid.is_empty()
    }
}

/// One poll of the link-status loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSample {
    pub timestamp: String,
    pub rssi: String,
    pub tx_bitrate: String,
    pub rx_bitrate: String,
}

/// Extract the association from link-status output. When the text holds
/// several polls the last one wins.
pub fn parse_link_summary(link_text: &str) -> LinkSummary {
    let Some(bssid) = last_capture(&CONNECTED, link_text) else {
        tracing::debug!(target: T_WIFI, "no association in link output");
        return LinkSummary::default();
    };

    LinkSummary {
        bssid: normalize_bssid(&bssid),
        tx_bitrate: last_capture(&TX_BITRATE, link_text).unwrap_or_default(),
        rx_bitrate: last_capture(&RX_BITRATE, link_text).unwrap_or_default(),
    }
}

/// Zip the timestamp, signal and bitrate lines of polling output into
/// samples. The series is as long as the shortest of the four lists, so a
/// poll cut off mid-output contributes nothing.
pub fn parse_link_series(poll_text: &str) -> Vec<LinkSample> {
    let timestamps: Vec<String> = TIMESTAMP
        .find_iter(poll_text)
        .map(|m| m.as_str().replace(',', "."))
        .collect();
    let rssis = all_captures(&SIGNAL, poll_text);
    let tx = all_captures(&TX_BITRATE, poll_text);
    let rx = all_captures(&RX_BITRATE, poll_text);

    let samples: Vec<LinkSample> = timestamps
        .into_iter()
        .zip(rssis)
        .zip(tx.into_iter().zip(rx))
        .map(|((timestamp, rssi), (tx_bitrate, rx_bitrate))| LinkSample {
            timestamp,
            rssi,
            tx_bitrate,
            rx_bitrate,
        })
        .collect();
    tracing::debug!(target: T_WIFI, "parsed {} link samples", samples.len());
    samples
}

fn all_captures(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

fn last_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .last()
        .map(|m| m.as_str().trim().to_string())
}
