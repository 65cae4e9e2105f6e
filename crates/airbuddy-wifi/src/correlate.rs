//! Marks the scanned cell the interface is associated with.

use airbuddy_logging::targets::T_WIFI;

use crate::bssid::same_bssid;
use crate::link::LinkSummary;
use crate::scan::ScanCell;

/// Mark the cell whose BSSID equals `link.bssid` as connected and copy the
/// live bitrates onto it. Comparison ignores case and separator style. At
/// most one cell is marked; the rest pass through untouched.
pub fn correlate(mut cells: Vec<ScanCell>, link: &LinkSummary) -> Vec<ScanCell> {
    if !link.is_connected() {
        return cells;
    }

    match cells
        .iter_mut()
        .find(|cell| same_bssid(&cell.bssid, &link.bssid))
    {
        Some(cell) => {
            cell.connected = true;
            cell.tx_bitrate = link.tx_bitrate.clone();
            cell.rx_bitrate = link.rx_bitrate.clone();
            tracing::debug!(target: T_WIFI, bssid = %cell.bssid, "marked connected cell");
        }
        None => {
            tracing::debug!(
                target: T_WIFI,
                bssid = %link.bssid,
                "associated BSSID not present in scan"
            );
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(bssid: &str) -> ScanCell {
        ScanCell {
            bssid: bssid.to_string(),
            ..Default::default()
        }
    }

    fn link(bssid: &str) -> LinkSummary {
        LinkSummary {
            bssid: bssid.to_string(),
            tx_bitrate: "54 Mb/s".to_string(),
            rx_bitrate: "36 Mb/s".to_string(),
        }
    }

    #[test]
    fn marks_matching_cell_case_insensitively() {
        let out = correlate(vec![cell("AA:BB:CC:DD:EE:FF")], &link("aa:bb:cc:dd:ee:ff"));
        assert!(out[0].connected);
        assert_eq!(out[0].tx_bitrate, "54 Mb/s");
        assert_eq!(out[0].rx_bitrate, "36 Mb/s");
    }

    #[test]
    fn other_cells_untouched() {
        let cells = vec![cell("11:22:33:44:55:66"), cell("AA-BB-CC-DD-EE-FF")];
        let out = correlate(cells.clone(), &link("AA:BB:CC:DD:EE:FF"));
        assert_eq!(out[0], cells[0]);
        assert!(out[1].connected);
    }

    #[test]
    fn at_most_one_cell_marked() {
        let cells = vec![cell("AA:BB:CC:DD:EE:FF"), cell("aa:bb:cc:dd:ee:ff")];
        let out = correlate(cells, &link("AA:BB:CC:DD:EE:FF"));
        assert_eq!(out.iter().filter(|c| c.connected).count(), 1);
        assert!(out[0].connected);
    }

    #[test]
    fn empty_link_marks_nothing() {
        let cells = vec![cell("AA:BB:CC:DD:EE:FF")];
        let out = correlate(cells.clone(), &LinkSummary::default());
        assert_eq!(out, cells);
    }
}
