//! Bit-level extraction helpers for Information Element payloads.
//!
//! Every accessor is bounds-checked and returns `None` instead of panicking;
//! the element decoder treats `None` as "payload too short".

use byteorder::{ByteOrder, LittleEndian};

/// Extract `width` bits of `byte` starting at bit `shift` (bit 0 = LSB).
pub fn field(byte: u8, shift: u32, width: u32) -> u8 {
    debug_assert!(shift + width <= 8);
    let mask = ((1u16 << width) - 1) as u8;
    (byte >> shift) & mask
}

/// Single flag bit, returned as 0 or 1.
pub fn flag(byte: u8, bit: u32) -> u8 {
    field(byte, bit, 1)
}

/// Reinterpret the low `width` bits of `value` as a two's-complement number.
///
/// When the sign bit is set the magnitude is recovered by inverting the
/// pattern and adding one, so `0xFF` at width 8 is `-1` and `0x8000` at
/// width 16 is `-32768`.
pub fn twos_complement(value: u32, width: u32) -> i64 {
    debug_assert!((1..=32).contains(&width));
    let mask: u64 = (1u64 << width) - 1;
    let value = u64::from(value) & mask;
    let sign = 1u64 << (width - 1);
    if value & sign == sign {
        -(((value ^ mask) + 1) as i64)
    } else {
        value as i64
    }
}

/// Channel utilisation byte as a fraction of 255.
pub fn ratio_of_255(byte: u8) -> f64 {
    f64::from(byte) / 255.0
}

/// Forward-only reader over an element payload.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Take the next `n` bytes, or nothing if fewer remain. The cursor only
    /// advances on success.
    pub fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    pub fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    pub fn le_u16(&mut self) -> Option<u16> {
        self.take(2).map(LittleEndian::read_u16)
    }

    pub fn le_u128(&mut self) -> Option<u128> {
        self.take(16).map(LittleEndian::read_u128)
    }

    /// Take a fixed-size block, e.g. the 5-byte HT Operation Information.
    pub fn array<const N: usize>(&mut self) -> Option<[u8; N]> {
        self.take(N).map(|b| {
            let mut out = [0u8; N];
            out.copy_from_slice(b);
            out
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_masks_and_shifts() {
        assert_eq!(field(0b1011_0110, 0, 2), 0b10);
        assert_eq!(field(0b1011_0110, 2, 1), 1);
        assert_eq!(field(0b1011_0110, 4, 4), 0b1011);
        assert_eq!(field(0xFF, 5, 2), 0b11);
        assert_eq!(flag(0x80, 7), 1);
        assert_eq!(flag(0x7F, 7), 0);
    }

    #[test]
    fn twos_complement_eight_bit() {
        assert_eq!(twos_complement(0xFF, 8), -1);
        assert_eq!(twos_complement(0x80, 8), -128);
        assert_eq!(twos_complement(0x7F, 8), 127);
        assert_eq!(twos_complement(0x00, 8), 0);
        assert_eq!(twos_complement(0xEC, 8), -20);
    }

    #[test]
    fn twos_complement_sixteen_bit() {
        assert_eq!(twos_complement(0x8000, 16), -32768);
        assert_eq!(twos_complement(0xFFFF, 16), -1);
        assert_eq!(twos_complement(0x7FFF, 16), 32767);
        // bits above the width are ignored
        assert_eq!(twos_complement(0x1_0001, 16), 1);
    }

    #[test]
    fn ratio_bounds() {
        assert_eq!(ratio_of_255(0), 0.0);
        assert_eq!(ratio_of_255(255), 1.0);
        assert!((ratio_of_255(0x80) - 0.501_960_784).abs() < 1e-9);
    }

    #[test]
    fn cursor_reads_little_endian() {
        let data = [0x05, 0x00, 0x34, 0x12, 0xAA];
        let mut cur = Cursor::new(&data);
        assert_eq!(cur.le_u16(), Some(5));
        assert_eq!(cur.le_u16(), Some(0x1234));
        assert_eq!(cur.position(), 4);
        assert_eq!(cur.le_u16(), None);
        // failed read leaves the cursor in place
        assert_eq!(cur.position(), 4);
        assert_eq!(cur.u8(), Some(0xAA));
        assert_eq!(cur.remaining(), 0);
        assert_eq!(cur.u8(), None);
    }

    #[test]
    fn cursor_wide_and_arrays() {
        let mut data = vec![0u8; 16];
        data[0] = 0xFF;
        data[15] = 0x01;
        let mut cur = Cursor::new(&data);
        assert_eq!(cur.le_u128(), Some((1u128 << 120) | 0xFF));

        let short = [1u8, 2, 3];
        let mut cur = Cursor::new(&short);
        assert_eq!(cur.array::<5>(), None);
        assert_eq!(cur.array::<3>(), Some([1, 2, 3]));
    }
}
