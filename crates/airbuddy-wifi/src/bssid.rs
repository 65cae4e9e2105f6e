//! BSSID handling shared by the scan parser, link extractor and correlator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TelemetryError};

/// MAC address (6 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacAddress({})", self)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

/// Accepts `aa:bb:cc:dd:ee:ff` and `AA-BB-CC-DD-EE-FF`, any case.
impl FromStr for MacAddress {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split(|c| c == ':' || c == '-').collect();
        if parts.len() != 6 {
            return Err(TelemetryError::InvalidMac(format!(
                "Expected 6 octets separated by ':' or '-', got '{}'",
                s
            )));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(TelemetryError::InvalidMac(format!(
                    "Invalid hex octet: '{}'",
                    part
                )));
            }
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| TelemetryError::InvalidMac(format!("Invalid hex octet: '{}'", part)))?;
        }

        Ok(Self(bytes))
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Canonical comparison form: uppercase, colon separated. Text that is not a
/// MAC address is uppercased with dashes turned into colons.
pub fn normalize_bssid(text: &str) -> String {
    match text.parse::<MacAddress>() {
        Ok(mac) => mac.to_string(),
        Err(_) => text.trim().to_ascii_uppercase().replace('-', ":"),
    }
}

/// Whether two BSSID strings name the same radio. Empty strings never match.
pub fn same_bssid(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    !a.is_empty() && !b.is_empty() && normalize_bssid(a) == normalize_bssid(b)
}
