//! 802.11 Information Element decoding.
//!
//! An element scanned from a beacon is `id | length | payload`. The decoder
//! recognises a closed set of element kinds and turns their payload into an
//! ordered [`Fields`] map. Decoding is total: a payload that runs out before
//! every field of its kind could be read is reported as
//! [`ElementType::Unknown`] carrying the fields that were read, and nothing
//! here panics or returns an error.

use std::fmt;

use airbuddy_logging::targets::T_WIFI;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::bits::{self, Cursor};
use crate::error::{self, TelemetryError};

pub const EID_BSS_LOAD: u8 = 11;
pub const EID_TPC_REPORT: u8 = 35;
pub const EID_HT_OPERATION: u8 = 61;
pub const EID_VHT_OPERATION: u8 = 192;
pub const EID_EXTENSION: u8 = 255;
pub const EXT_HE_OPERATION: u8 = 36;

/// Decoded element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    #[serde(rename = "BSS Load")]
    BssLoad,
    #[serde(rename = "TPC Report")]
    TpcReport,
    #[serde(rename = "HT Operation")]
    HtOperation,
    #[serde(rename = "VHT Operation")]
    VhtOperation,
    #[serde(rename = "HE Operation")]
    HeOperation,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl ElementType {
    /// Map an element id (and, for extension elements, the extension id) to
    /// its kind. `extension_id` is ignored unless `element_id` is 255.
    pub fn classify(element_id: u8, extension_id: Option<u8>) -> Self {
        match (element_id, extension_id) {
            (EID_BSS_LOAD, _) => Self::BssLoad,
            (EID_TPC_REPORT, _) => Self::TpcReport,
            (EID_HT_OPERATION, _) => Self::HtOperation,
            (EID_VHT_OPERATION, _) => Self::VhtOperation,
            (EID_EXTENSION, Some(EXT_HE_OPERATION)) => Self::HeOperation,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BssLoad => "BSS Load",
            Self::TpcReport => "TPC Report",
            Self::HtOperation => "HT Operation",
            Self::VhtOperation => "VHT Operation",
            Self::HeOperation => "HE Operation",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    UInt(u64),
    Int(i64),
    Ratio(f64),
    /// 128-bit little-endian bitmaps (HT basic MCS set).
    Wide(u128),
    Nested(Fields),
}

impl FieldValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Ratio(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Self::Wide(v) => Some(*v),
            Self::UInt(v) => Some(u128::from(*v)),
            _ => None,
        }
    }

    pub fn as_nested(&self) -> Option<&Fields> {
        match self {
            Self::Nested(f) => Some(f),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::UInt(v) => serializer.serialize_u64(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Ratio(v) => serializer.serialize_f64(*v),
            Self::Wide(v) => serializer.serialize_u128(*v),
            Self::Nested(f) => f.serialize(serializer),
        }
    }
}

/// Field name to value, kept in decode order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<(&'static str, FieldValue)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.0.iter().map(|(k, _)| *k).collect()
    }

    fn push(&mut self, name: &'static str, value: FieldValue) {
        self.0.push((name, value));
    }

    fn uint(&mut self, name: &'static str, value: impl Into<u64>) {
        self.push(name, FieldValue::UInt(value.into()));
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// One decoded Information Element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InformationElement {
    pub element_id: u8,
    /// Element bytes as they appeared in the scan, hex encoded.
    pub raw_hex: String,
    pub type_name: ElementType,
    pub fields: Fields,
}

impl InformationElement {
    pub fn is_known(&self) -> bool {
        self.type_name != ElementType::Unknown
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Decode a raw element: byte 0 is the id, byte 1 the declared length
/// (not checked against the real payload length), payload from byte 2.
pub fn decode(raw: &[u8]) -> InformationElement {
    decode_with_hex(raw, hex::encode_upper(raw))
}

/// Decode an element from the hex text printed by the scan tool, keeping the
/// text verbatim in `raw_hex`. An odd trailing nibble is ignored.
pub fn decode_hex(text: &str) -> InformationElement {
    let even = text.get(..text.len() - text.len() % 2).unwrap_or("");
    let raw = match hex::decode(even) {
        Ok(raw) => raw,
        Err(err) => {
            tracing::debug!(target: T_WIFI, "undecodable IE hex {:?}: {}", text, err);
            Vec::new()
        }
    };
    decode_with_hex(&raw, text.to_string())
}

/// Strict variant of [`decode_hex`] for text typed by a person: anything
/// that is not an even number of hex digits is rejected.
pub fn try_decode_hex(text: &str) -> error::Result<InformationElement> {
    let trimmed = text.trim();
    let raw = hex::decode(trimmed)
        .map_err(|err| TelemetryError::InvalidHex(format!("{trimmed:?}: {err}")))?;
    if raw.is_empty() {
        return Err(TelemetryError::InvalidHex("empty element".to_string()));
    }
    Ok(decode_with_hex(&raw, trimmed.to_string()))
}

fn decode_with_hex(raw: &[u8], raw_hex: String) -> InformationElement {
    let element_id = raw.first().copied();
    let payload = raw.get(2..).unwrap_or(&[]);
    let mut fields = Fields::new();

    let type_name = match element_id {
        None => ElementType::Unknown,
        Some(id) => {
            let mut cur = Cursor::new(payload);
            let kind = if id == EID_EXTENSION {
                match cur.u8() {
                    Some(ext) => {
                        fields.uint("extension_id", ext);
                        ElementType::classify(id, Some(ext))
                    }
                    None => ElementType::Unknown,
                }
            } else {
                ElementType::classify(id, None)
            };

            let complete = match kind {
                ElementType::BssLoad => decode_bss_load(&mut cur, &mut fields),
                ElementType::TpcReport => decode_tpc_report(&mut cur, &mut fields),
                ElementType::HtOperation => decode_ht_operation(&mut cur, &mut fields),
                ElementType::VhtOperation => decode_vht_operation(&mut cur, &mut fields),
                ElementType::HeOperation => decode_he_operation(&mut cur, &mut fields),
                ElementType::Unknown => None,
            };

            match complete {
                Some(()) => kind,
                None => {
                    if kind != ElementType::Unknown {
                        tracing::debug!(
                            target: T_WIFI,
                            "{} element truncated after {} of {} payload bytes",
                            kind,
                            cur.position(),
                            payload.len()
                        );
                    }
                    ElementType::Unknown
                }
            }
        }
    };

    InformationElement {
        element_id: element_id.unwrap_or(0),
        raw_hex,
        type_name,
        fields,
    }
}

fn decode_bss_load(cur: &mut Cursor<'_>, f: &mut Fields) -> Option<()> {
    f.uint("station_count", cur.le_u16()?);
    f.push(
        "channel_utilization",
        FieldValue::Ratio(bits::ratio_of_255(cur.u8()?)),
    );
    f.uint("available_admission_capacity", cur.le_u16()?);
    Some(())
}

fn decode_tpc_report(cur: &mut Cursor<'_>, f: &mut Fields) -> Option<()> {
    let tx_power = bits::twos_complement(u32::from(cur.u8()?), 8);
    f.push("tx_power", FieldValue::Int(tx_power));
    let link_margin = bits::twos_complement(u32::from(cur.u8()?), 8);
    f.push("link_margin", FieldValue::Int(link_margin));
    Some(())
}

fn decode_ht_operation(cur: &mut Cursor<'_>, f: &mut Fields) -> Option<()> {
    f.uint("primary_channel", cur.u8()?);

    let info: [u8; 5] = cur.array()?;
    f.uint("secondary_channel_offset", bits::field(info[0], 0, 2));
    f.uint("sta_channel_width", bits::flag(info[0], 2));
    f.uint("rifs_mode", bits::flag(info[0], 3));
    // Logged data carries the protection bit unshifted (0 or 2).
    f.uint("ht_protection", info[1] & 0x02);
    f.uint("nongf_ht_sta_present", bits::flag(info[1], 2));
    f.uint("obss_nonht_sta_present", bits::flag(info[1], 4));
    let segment_2 = u64::from(bits::field(info[1], 5, 2)) | (u64::from(info[2]) << 8);
    f.uint("channel_center_freq_segment_2", segment_2);
    f.uint("dual_beacon", bits::flag(info[3], 6));
    f.uint("dual_cts_protection", bits::flag(info[3], 7));
    f.uint("stbc_beacon", bits::flag(info[4], 0));
    f.uint("lsig_txop_protection", bits::flag(info[4], 1));
    f.uint("pco_active", bits::flag(info[4], 2));
    f.uint("pco_phase", bits::flag(info[4], 3));

    f.push("basic_mcs_set", FieldValue::Wide(cur.le_u128()?));
    Some(())
}

fn decode_vht_operation(cur: &mut Cursor<'_>, f: &mut Fields) -> Option<()> {
    f.uint("channel_width", cur.u8()?);
    f.uint("channel_center_freq_0", cur.u8()?);
    f.uint("channel_center_freq_1", cur.u8()?);
    f.uint("basic_mcs_set", cur.le_u16()?);
    Some(())
}

/// TXOP Duration RTS Threshold exactly as existing logs record it:
/// `(b0 >> 4) & (0x0F + (b1 & 0x3F))`. The mask is the sum, not the
/// nibble, so this is not the 10-bit field the standard defines.
pub fn txop_dur_rts_thresh(b0: u8, b1: u8) -> u8 {
    (b0 >> 4) & (0x0F + (b1 & 0x3F))
}

fn decode_he_operation(cur: &mut Cursor<'_>, f: &mut Fields) -> Option<()> {
    let params: [u8; 3] = cur.array()?;
    let vht_info_present = bits::flag(params[1], 6);
    let cohosted_bss = bits::flag(params[1], 7);
    let six_ghz_info_present = bits::flag(params[2], 1);

    f.uint("default_pe_duration", bits::field(params[0], 0, 3));
    f.uint("twt_required", bits::flag(params[0], 3));
    f.uint("txop_dur_rts_thresh", txop_dur_rts_thresh(params[0], params[1]));
    f.uint("vht_info_present", vht_info_present);
    f.uint("cohosted_bss", cohosted_bss);
    f.uint("er_su_disable", bits::flag(params[2], 0));
    f.uint("6ghz_info_present", six_ghz_info_present);

    let color = cur.u8()?;
    f.uint("bss_color", bits::field(color, 0, 6));
    f.uint("partial_bss_color", bits::flag(color, 6));
    f.uint("bss_color_disabled", bits::flag(color, 7));

    f.uint("basic_mcs_set", cur.le_u16()?);

    // Optional blocks follow in fixed order, each gated by its presence bit.
    if vht_info_present == 1 {
        let vht: [u8; 3] = cur.array()?;
        let mut nested = Fields::new();
        nested.uint("channel_width", vht[0]);
        nested.uint("channel_center_freq_0", vht[1]);
        nested.uint("channel_center_freq_1", vht[2]);
        f.push("vht_info", FieldValue::Nested(nested));
    }

    if cohosted_bss == 1 {
        f.uint("max_cohosted_bss_indicator", cur.u8()?);
    }

    if six_ghz_info_present == 1 {
        let info: [u8; 5] = cur.array()?;
        let control = info[1];
        let mut nested = Fields::new();
        nested.uint("primary_channel", info[0]);
        nested.uint("channel_width", bits::field(control, 0, 2));
        nested.uint("duplicate_beacon", bits::flag(control, 2));
        nested.uint("regulatory_info", bits::field(control, 3, 3));
        nested.uint("channel_center_freq_0", info[2]);
        nested.uint("channel_center_freq_1", info[3]);
        nested.uint("min_rate", info[4]);
        f.push("6ghz_info", FieldValue::Nested(nested));
    }

    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        hex::decode(s).unwrap()
    }

    fn uint(ie: &InformationElement, name: &str) -> u64 {
        ie.field(name)
            .and_then(FieldValue::as_u64)
            .unwrap_or_else(|| panic!("missing field {name}"))
    }

    #[test]
    fn bss_load() {
        let ie = decode(&hex("0B040500800000"));
        assert_eq!(ie.element_id, 11);
        assert_eq!(ie.type_name, ElementType::BssLoad);
        assert_eq!(uint(&ie, "station_count"), 5);
        let util = ie.field("channel_utilization").unwrap().as_f64().unwrap();
        assert!((util - 128.0 / 255.0).abs() < 1e-12);
        assert_eq!(uint(&ie, "available_admission_capacity"), 0);
        assert_eq!(
            ie.fields.names(),
            vec!["station_count", "channel_utilization", "available_admission_capacity"]
        );
    }

    #[test]
    fn tpc_report_sign_recovery() {
        let ie = decode(&hex("2302FF7F"));
        assert_eq!(ie.type_name, ElementType::TpcReport);
        assert_eq!(ie.field("tx_power").unwrap().as_i64(), Some(-1));
        assert_eq!(ie.field("link_margin").unwrap().as_i64(), Some(127));
    }

    #[test]
    fn ht_operation_bitfields() {
        // primary 36, info: 0x0D (offset 1, width 1, rifs 1),
        // 0xF6 (protection, non-GF, OBSS, seg2 low bits 3), 0x01,
        // 0xC0 (dual beacon, dual CTS), 0x0F (STBC, L-SIG, PCO active/phase)
        let mut raw = hex("3D16240DF601C00F");
        let mut mcs = [0u8; 16];
        mcs[0] = 0xFF;
        mcs[15] = 0x80;
        raw.extend_from_slice(&mcs);

        let ie = decode(&raw);
        assert_eq!(ie.type_name, ElementType::HtOperation);
        assert_eq!(uint(&ie, "primary_channel"), 36);
        assert_eq!(uint(&ie, "secondary_channel_offset"), 1);
        assert_eq!(uint(&ie, "sta_channel_width"), 1);
        assert_eq!(uint(&ie, "rifs_mode"), 1);
        assert_eq!(uint(&ie, "ht_protection"), 2);
        assert_eq!(uint(&ie, "nongf_ht_sta_present"), 1);
        assert_eq!(uint(&ie, "obss_nonht_sta_present"), 1);
        assert_eq!(uint(&ie, "channel_center_freq_segment_2"), 3 | (1 << 8));
        assert_eq!(uint(&ie, "dual_beacon"), 1);
        assert_eq!(uint(&ie, "dual_cts_protection"), 1);
        assert_eq!(uint(&ie, "stbc_beacon"), 1);
        assert_eq!(uint(&ie, "lsig_txop_protection"), 1);
        assert_eq!(uint(&ie, "pco_active"), 1);
        assert_eq!(uint(&ie, "pco_phase"), 1);
        assert_eq!(
            ie.field("basic_mcs_set").unwrap().as_u128(),
            Some((0x80u128 << 120) | 0xFF)
        );
    }

    #[test]
    fn ht_operation_missing_mcs_set_is_unknown_with_prefix() {
        let ie = decode(&hex("3D16240DF601C00FFFFF"));
        assert_eq!(ie.type_name, ElementType::Unknown);
        assert_eq!(ie.element_id, 61);
        assert_eq!(uint(&ie, "pco_phase"), 1);
        assert!(ie.field("basic_mcs_set").is_none());
    }

    #[test]
    fn vht_operation() {
        let ie = decode(&hex("C005012A00FCFF"));
        assert_eq!(ie.type_name, ElementType::VhtOperation);
        assert_eq!(uint(&ie, "channel_width"), 1);
        assert_eq!(uint(&ie, "channel_center_freq_0"), 42);
        assert_eq!(uint(&ie, "channel_center_freq_1"), 0);
        assert_eq!(uint(&ie, "basic_mcs_set"), 0xFFFC);
    }

    #[test]
    fn he_operation_without_optional_blocks() {
        // params 0x44 0x00 0x00: PE 4, TWT 0; color 0x81
        let ie = decode(&hex("FF07244400008134FF"));
        assert_eq!(ie.type_name, ElementType::HeOperation);
        assert_eq!(uint(&ie, "extension_id"), 36);
        assert_eq!(uint(&ie, "default_pe_duration"), 4);
        assert_eq!(uint(&ie, "twt_required"), 0);
        assert_eq!(uint(&ie, "vht_info_present"), 0);
        assert_eq!(uint(&ie, "bss_color"), 1);
        assert_eq!(uint(&ie, "partial_bss_color"), 0);
        assert_eq!(uint(&ie, "bss_color_disabled"), 1);
        assert_eq!(uint(&ie, "basic_mcs_set"), 0xFF34);
        assert!(ie.field("vht_info").is_none());
        assert!(ie.field("6ghz_info").is_none());
    }

    #[test]
    fn he_operation_with_all_optional_blocks_in_order() {
        // params: b0=0x08 (TWT), b1=0xC0 (VHT info + co-hosted), b2=0x03 (ER SU, 6 GHz)
        let ie = decode(&hex(concat!(
            "FF11", "24", "08C003", "05", "FCFF", // header, params, color, mcs
            "012A00", // VHT info
            "03",     // max co-hosted BSS indicator
            "250E2F3F06" // 6 GHz info
        )));
        assert_eq!(ie.type_name, ElementType::HeOperation);
        assert_eq!(uint(&ie, "twt_required"), 1);
        assert_eq!(uint(&ie, "er_su_disable"), 1);
        assert_eq!(uint(&ie, "6ghz_info_present"), 1);

        let vht = ie.field("vht_info").unwrap().as_nested().unwrap();
        assert_eq!(vht.get("channel_center_freq_0").unwrap().as_u64(), Some(42));
        assert_eq!(uint(&ie, "max_cohosted_bss_indicator"), 3);

        let six = ie.field("6ghz_info").unwrap().as_nested().unwrap();
        assert_eq!(six.get("primary_channel").unwrap().as_u64(), Some(0x25));
        // control 0x0E: width 2, duplicate beacon 1, regulatory 1
        assert_eq!(six.get("channel_width").unwrap().as_u64(), Some(2));
        assert_eq!(six.get("duplicate_beacon").unwrap().as_u64(), Some(1));
        assert_eq!(six.get("regulatory_info").unwrap().as_u64(), Some(1));
        assert_eq!(six.get("channel_center_freq_1").unwrap().as_u64(), Some(0x3F));
        assert_eq!(six.get("min_rate").unwrap().as_u64(), Some(6));

        let names = ie.fields.names();
        let pos = |n: &str| names.iter().position(|x| *x == n).unwrap();
        assert!(pos("vht_info") < pos("max_cohosted_bss_indicator"));
        assert!(pos("max_cohosted_bss_indicator") < pos("6ghz_info"));
    }

    #[test]
    fn he_operation_cursor_skips_absent_blocks() {
        // only co-hosted and 6 GHz present: indicator sits right after the MCS set
        let ie = decode(&hex("FF0E24008002000000070A00000000"));
        assert_eq!(ie.type_name, ElementType::HeOperation);
        assert!(ie.field("vht_info").is_none());
        assert_eq!(uint(&ie, "max_cohosted_bss_indicator"), 7);
        let six = ie.field("6ghz_info").unwrap().as_nested().unwrap();
        assert_eq!(six.get("primary_channel").unwrap().as_u64(), Some(10));
    }

    #[test]
    fn he_operation_truncated_optional_block() {
        // VHT info announced but only two bytes present
        let ie = decode(&hex("FF0924004000000000012A"));
        assert_eq!(ie.type_name, ElementType::Unknown);
        assert_eq!(uint(&ie, "vht_info_present"), 1);
        assert!(ie.field("vht_info").is_none());
    }

    #[test]
    fn txop_threshold_keeps_logged_precedence() {
        // (0xF0 >> 4) & (0x0F + 0x3F) = 0x0F & 0x4E
        assert_eq!(txop_dur_rts_thresh(0xF0, 0x3F), 0x0F & 0x4E);
        assert_eq!(txop_dur_rts_thresh(0x30, 0x00), 0x03);
        assert_eq!(txop_dur_rts_thresh(0x30, 0x01), 0x03 & 0x10);
    }

    #[test]
    fn unknown_extension() {
        let ie = decode(&hex("FF03230102"));
        assert_eq!(ie.type_name, ElementType::Unknown);
        assert_eq!(uint(&ie, "extension_id"), 35);
        assert_eq!(ie.fields.len(), 1);
    }

    #[test]
    fn unknown_element_id() {
        let ie = decode(&hex("DD0450F20201"));
        assert_eq!(ie.element_id, 0xDD);
        assert_eq!(ie.type_name, ElementType::Unknown);
        assert!(ie.fields.is_empty());
    }

    #[test]
    fn short_inputs_never_panic() {
        for raw in [&[][..], &[11][..], &[35][..], &[255][..], &[61, 22][..]] {
            let ie = decode(raw);
            assert_eq!(ie.type_name, ElementType::Unknown);
        }
        assert_eq!(decode(&[]).element_id, 0);
        assert_eq!(decode(&[192]).element_id, 192);
    }

    #[test]
    fn element_id_matches_first_byte() {
        for id in 0..=255u8 {
            let raw = [id, 3, 0x01, 0x02, 0x03];
            assert_eq!(decode(&raw).element_id, id);
        }
    }

    #[test]
    fn decode_is_pure() {
        let raw = hex("FF11240800030500000125000301250E2F3F06");
        assert_eq!(decode(&raw), decode(&raw));
    }

    #[test]
    fn declared_length_is_not_enforced() {
        // length byte says 1, payload carries a full BSS Load
        let ie = decode(&hex("0B010100FF0200"));
        assert_eq!(ie.type_name, ElementType::BssLoad);
        assert_eq!(uint(&ie, "station_count"), 1);
        assert_eq!(uint(&ie, "available_admission_capacity"), 2);
    }

    #[test]
    fn hex_text_is_kept_verbatim() {
        let ie = decode_hex("2302FF7F");
        assert_eq!(ie.raw_hex, "2302FF7F");
        assert_eq!(ie.type_name, ElementType::TpcReport);

        let odd = decode_hex("2302FF7F0");
        assert_eq!(odd.raw_hex, "2302FF7F0");
        assert_eq!(odd.type_name, ElementType::TpcReport);

        assert_eq!(decode(&[0x0b, 0x00]).raw_hex, "0B00");
    }

    #[test]
    fn wide_values_serialize_as_integers() {
        // HT Operation with the Rx highest-rate bytes (10-11) of the MCS set filled in
        let narrow = decode(&hex("3D16240500000000FF000000000000000000000000000000"));
        let wide = decode(&hex("3D16240500000000FF0000000000000000002C0100000000"));
        assert_eq!(wide.type_name, ElementType::HtOperation);

        let narrow_json = serde_json::to_string(&narrow.fields).unwrap();
        assert!(narrow_json.ends_with(r#""basic_mcs_set":255}"#), "{narrow_json}");
        let wide_json = serde_json::to_string(&wide.fields).unwrap();
        assert!(
            wide_json.ends_with(r#""basic_mcs_set":362677745884388752411853055}"#),
            "{wide_json}"
        );
    }

    #[test]
    fn strict_hex_rejects_typos() {
        assert_eq!(
            try_decode_hex(" 0b040500800000\n").unwrap().type_name,
            ElementType::BssLoad
        );
        assert!(matches!(try_decode_hex("0B0"), Err(TelemetryError::InvalidHex(_))));
        assert!(matches!(try_decode_hex("zz"), Err(TelemetryError::InvalidHex(_))));
        assert!(try_decode_hex("").is_err());
    }

    #[test]
    fn serializes_with_type_string_and_ordered_fields() {
        let ie = decode(&hex("0B040500800000"));
        let json = serde_json::to_string(&ie).unwrap();
        assert!(json.starts_with(r#"{"element_id":11,"raw_hex":"0B040500800000","type_name":"BSS Load","fields":{"station_count":5,"#));
    }
}
