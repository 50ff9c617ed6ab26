// MIT License
// Rust translation of the u()/crc16() routines from ksenia_lares/lares4_api.py

use crate::error::{LaresError, Result};

/// The quoted checksum key as it appears in the serialized envelope text.
const CHECKSUM_KEY: &str = "\"CRC_16\"";

/// Polynomial for the panel's 16-bit CRC.
const POLY: u16 = 0x1021;

/// UTF-8 byte view of the envelope text.
///
/// The upstream `u()` routine re-encodes the text character by character
/// (combining UTF-16 surrogate pairs into one four-byte sequence). Rust
/// strings are already UTF-8 with the same surrogate handling, so the byte
/// view is the encoding itself; only the byte-length accounting matters for
/// the checksum window below.
pub fn utf8_bytes(text: &str) -> &[u8] {
    text.as_bytes()
}

/// Locate the end of the checksum window, as a byte offset into the UTF-8
/// encoding of `text`.
///
/// The window runs from byte 0 up to (but not including) the offset just
/// past the last `"CRC_16"` occurrence: character offset after the key,
/// plus the difference between the text's byte length and its character
/// count to correct for multi-byte characters. The firmware computes the
/// offset exactly this way, so the whole-string correction is kept even
/// though only characters before the key can contribute in practice.
///
/// Returns `None` when the text has no `"CRC_16"` key.
pub fn checksum_window_end(text: &str) -> Option<usize> {
    let key_pos = text.rfind(CHECKSUM_KEY)?;
    let chars_before = text[..key_pos].chars().count();
    let char_end = chars_before + CHECKSUM_KEY.len();
    let multibyte_extra = text.len() - text.chars().count();
    // The bytes after the key always outnumber their character count, so
    // char_end + multibyte_extra never exceeds the byte length.
    Some(char_end + multibyte_extra)
}

/// Bit-serial CRC over the given bytes: register init 0xFFFF, bytes
/// MSB-first; per bit, the pre-shift bit 15 is recorded, the register
/// shifts left, the message bit is OR'd into bit 0, and the polynomial is
/// applied if the recorded bit was set.
///
/// The message bit enters at the bottom of the register rather than being
/// XOR'd into the top, so the result differs from textbook CRC-16/XMODEM
/// over the same bytes. The panel firmware uses this exact loop; the
/// known-value tests below were generated with the upstream `crc16()`.
pub fn crc16(data: &[u8]) -> u16 {
    let mut reg: u16 = 0xFFFF;
    for &byte in data {
        let mut mask: u8 = 0x80;
        while mask != 0 {
            let carry = reg & 0x8000 != 0;
            reg <<= 1;
            if byte & mask != 0 {
                reg |= 1;
            }
            if carry {
                reg ^= POLY;
            }
            mask >>= 1;
        }
    }
    reg
}

/// Compute the integrity checksum for a serialized envelope carrying the
/// `0x0000` placeholder in its `CRC_16` field.
///
/// Returns `"0x"` followed by four lowercase hex digits. The input must
/// contain the `"CRC_16"` key; a missing key is a caller contract violation
/// reported as [`LaresError::ChecksumFieldMissing`].
pub fn compute_checksum(text: &str) -> Result<String> {
    let end = checksum_window_end(text).ok_or(LaresError::ChecksumFieldMissing)?;
    let window = &utf8_bytes(text)[..end];
    Ok(format!("0x{:04x}", crc16(window)))
}
