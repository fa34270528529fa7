//! Modified UTF-8 codec
//!
//! Modified UTF-8 differs from standard UTF-8 in two ways:
//! - U+0000 is written as the two-byte sequence `0xC0 0x80`, so a zero byte
//!   never appears inside an encoded string and can terminate it.
//! - Supplementary characters are written as a UTF-16 surrogate pair, each
//!   half encoded as its own three-byte sequence.

use crate::error::{FormatError, FormatResult};

/// Number of bytes one UTF-16 code unit occupies once encoded
fn unit_len(unit: u16) -> usize {
    match unit {
        0x0001..=0x007F => 1,
        0x0000 | 0x0080..=0x07FF => 2,
        _ => 3,
    }
}

/// Encoded length of `s` in bytes, excluding any terminator
pub fn encoded_len(s: &str) -> usize {
    s.encode_utf16().map(unit_len).sum()
}

/// Append the modified UTF-8 encoding of `s` to `out`
pub fn encode_into(s: &str, out: &mut Vec<u8>) {
    out.reserve(encoded_len(s));
    for unit in s.encode_utf16() {
        match unit_len(unit) {
            1 => out.push(unit as u8),
            2 => {
                out.push(0xC0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
}

/// Encode `s` into a new buffer
pub fn encode(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(s, &mut out);
    out
}

fn continuation(bytes: &[u8], pos: usize) -> FormatResult<u16> {
    match bytes.get(pos) {
        Some(&b) if b & 0xC0 == 0x80 => Ok(u16::from(b & 0x3F)),
        _ => Err(FormatError::MalformedString(pos)),
    }
}

/// Decode a modified UTF-8 byte run (without terminator)
///
/// Errors carry the byte position of the offending sequence.
pub fn decode(bytes: &[u8]) -> FormatResult<String> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut starts = Vec::with_capacity(bytes.len());
    let mut pos = 0;

    while let Some(&lead) = bytes.get(pos) {
        starts.push(pos);
        let unit = if lead & 0x80 == 0 {
            if lead == 0 {
                return Err(FormatError::MalformedString(pos));
            }
            pos += 1;
            u16::from(lead)
        } else if lead & 0xE0 == 0xC0 {
            let unit = (u16::from(lead & 0x1F) << 6) | continuation(bytes, pos + 1)?;
            pos += 2;
            unit
        } else if lead & 0xF0 == 0xE0 {
            let unit = (u16::from(lead & 0x0F) << 12)
                | (continuation(bytes, pos + 1)? << 6)
                | continuation(bytes, pos + 2)?;
            pos += 3;
            unit
        } else {
            return Err(FormatError::MalformedString(pos));
        };
        units.push(unit);
    }

    let mut decoded = String::with_capacity(units.len());
    let mut consumed = 0;
    for result in char::decode_utf16(units.iter().copied()) {
        match result {
            Ok(ch) => {
                consumed += ch.len_utf16();
                decoded.push(ch);
            }
            Err(_) => {
                let at = starts.get(consumed).copied().unwrap_or(pos);
                return Err(FormatError::MalformedString(at));
            }
        }
    }
    Ok(decoded)
}
