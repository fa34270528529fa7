//! Location record attribute codec
//!
//! A record is a sequence of attributes terminated by an `END` header byte:
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────────────┐
//! │ header: kind << 3 | (len-1)  │ value: len bytes, BE     │  repeated
//! └──────────────────────────────┴──────────────────────────┘
//! ┌──────────────────────────────┐
//! │ 0x00 (END)                   │
//! └──────────────────────────────┘
//! ```
//!
//! Zero-valued attributes are not written at all. Records are packed back to
//! back without a length prefix; only the terminator delimits them.

use crate::error::{FormatError, FormatResult};

/// Attribute kinds of a location record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum AttributeKind {
    /// Record terminator
    End = 0,
    /// Module name (string offset)
    Module = 1,
    /// Parent path (string offset)
    Parent = 2,
    /// Base name (string offset)
    Base = 3,
    /// Extension (string offset)
    Extension = 4,
    /// Content offset relative to the content region
    Offset = 5,
    /// Stored size when compressed, 0 otherwise
    Compressed = 6,
    /// Size of the resource bytes
    Uncompressed = 7,
}

impl AttributeKind {
    /// Number of kinds, including `End`
    pub const COUNT: usize = 8;

    /// All value-carrying kinds in encoding order
    pub const VALUES: [Self; 7] = [
        Self::Module,
        Self::Parent,
        Self::Base,
        Self::Extension,
        Self::Offset,
        Self::Compressed,
        Self::Uncompressed,
    ];

    /// Convert from the 5-bit kind field of a header byte
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::End),
            1 => Some(Self::Module),
            2 => Some(Self::Parent),
            3 => Some(Self::Base),
            4 => Some(Self::Extension),
            5 => Some(Self::Offset),
            6 => Some(Self::Compressed),
            7 => Some(Self::Uncompressed),
            _ => None,
        }
    }

    /// Whether the value is an offset into the strings table
    pub fn is_string(self) -> bool {
        matches!(
            self,
            Self::Module | Self::Parent | Self::Base | Self::Extension
        )
    }
}

/// Number of bytes needed for the minimal big-endian form of `value`
fn value_len(value: u64) -> usize {
    let significant = 64 - value.leading_zeros() as usize;
    significant.div_ceil(8).max(1)
}

/// Raw attribute values of one location record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LocationAttributes {
    values: [u64; AttributeKind::COUNT],
}

impl LocationAttributes {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `kind` (0 when absent)
    pub fn get(&self, kind: AttributeKind) -> u64 {
        self.values[kind as usize]
    }

    /// Set the value of `kind`; setting `End` is ignored
    pub fn set(&mut self, kind: AttributeKind, value: u64) {
        if kind != AttributeKind::End {
            self.values[kind as usize] = value;
        }
    }

    /// Builder form of [`set`](Self::set)
    #[must_use]
    pub fn with(mut self, kind: AttributeKind, value: u64) -> Self {
        self.set(kind, value);
        self
    }

    /// Check whether every attribute is zero
    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|&v| v == 0)
    }

    /// Size of the encoded record in bytes, terminator included
    pub fn encoded_len(&self) -> usize {
        AttributeKind::VALUES
            .iter()
            .map(|&kind| self.get(kind))
            .filter(|&value| value != 0)
            .map(|value| 1 + value_len(value))
            .sum::<usize>()
            + 1
    }

    /// Append the encoded record to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());
        for kind in AttributeKind::VALUES {
            let value = self.get(kind);
            if value == 0 {
                continue;
            }
            let len = value_len(value);
            out.push(((kind as u8) << 3) | (len - 1) as u8);
            out.extend_from_slice(&value.to_be_bytes()[8 - len..]);
        }
        out.push((AttributeKind::End as u8) << 3);
    }

    /// Encode into a new buffer
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    /// Decode the record starting at `offset` in `data`
    ///
    /// Attributes may appear in any order; decoding stops at the first `END`
    /// header and ignores whatever follows it.
    pub fn decode(data: &[u8], offset: usize) -> FormatResult<Self> {
        let mut attributes = Self::new();
        let mut pos = offset;

        loop {
            let header = *data
                .get(pos)
                .ok_or(FormatError::UnterminatedRecord(offset))?;
            let kind = AttributeKind::from_u8(header >> 3).ok_or(FormatError::UnknownAttribute {
                kind: header >> 3,
                offset: pos,
            })?;
            if kind == AttributeKind::End {
                return Ok(attributes);
            }

            let len = usize::from(header & 0x07) + 1;
            let bytes = data
                .get(pos + 1..pos + 1 + len)
                .ok_or(FormatError::UnterminatedRecord(offset))?;
            let value = bytes
                .iter()
                .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));

            attributes.set(kind, value);
            pos += 1 + len;
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_empty_record_is_single_terminator() {
        let attrs = LocationAttributes::new();
        assert_eq!(attrs.encode(), vec![0u8]);
        assert_eq!(LocationAttributes::decode(&[0], 0).unwrap(), attrs);
    }

    #[test]
    fn test_header_byte_layout() {
        let attrs = LocationAttributes::new()
            .with(AttributeKind::Module, 2)
            .with(AttributeKind::Uncompressed, 0x1234);
        assert_eq!(
            attrs.encode(),
            vec![(1 << 3), 0x02, (7 << 3) | 1, 0x12, 0x34, 0x00]
        );
        assert_eq!(attrs.encoded_len(), 6);
    }

    #[test]
    fn test_zero_values_are_omitted() {
        let attrs = LocationAttributes::new().with(AttributeKind::Extension, 0);
        assert_eq!(attrs.encode().len(), 1);
    }

    #[test]
    fn test_maximum_values() {
        let max56 = (1u64 << 56) - 1;
        let attrs = LocationAttributes::new()
            .with(AttributeKind::Offset, max56)
            .with(AttributeKind::Compressed, u64::MAX);
        let encoded = attrs.encode();
        assert_eq!(encoded[0], (5 << 3) | 6);
        assert_eq!(encoded[8], (6 << 3) | 7);
        assert_eq!(LocationAttributes::decode(&encoded, 0).unwrap(), attrs);
    }

    #[test]
    fn test_decode_any_order_and_trailing_bytes() {
        // UNCOMPRESSED=5, BASE=4, END, then garbage belonging to the next record
        let data = [0xFF, (7 << 3), 5, (3 << 3), 4, 0, (1 << 3), 9];
        let attrs = LocationAttributes::decode(&data, 1).unwrap();
        assert_eq!(attrs.get(AttributeKind::Uncompressed), 5);
        assert_eq!(attrs.get(AttributeKind::Base), 4);
        assert_eq!(attrs.get(AttributeKind::Module), 0);
    }

    #[test]
    fn test_missing_terminator() {
        let data = [(3 << 3), 4];
        assert!(matches!(
            LocationAttributes::decode(&data, 0),
            Err(FormatError::UnterminatedRecord(0))
        ));

        let data = [(5 << 3) | 3, 1, 2];
        assert!(matches!(
            LocationAttributes::decode(&data, 0),
            Err(FormatError::UnterminatedRecord(0))
        ));
    }

    #[test]
    fn test_unknown_kind() {
        let data = [(9 << 3), 1, 0];
        assert!(matches!(
            LocationAttributes::decode(&data, 0),
            Err(FormatError::UnknownAttribute { kind: 9, offset: 0 })
        ));
    }

    #[test]
    fn test_value_len() {
        assert_eq!(value_len(0), 1);
        assert_eq!(value_len(0xFF), 1);
        assert_eq!(value_len(0x100), 2);
        assert_eq!(value_len(u64::MAX), 8);
    }

    fn attributes() -> impl Strategy<Value = LocationAttributes> {
        prop::array::uniform7(prop_oneof![
            Just(0u64),
            0u64..0x100,
            0u64..(1u64 << 32),
            0u64..(1u64 << 56),
            any::<u64>(),
        ])
        .prop_map(|values| {
            AttributeKind::VALUES
                .iter()
                .zip(values)
                .fold(LocationAttributes::new(), |attrs, (&kind, value)| {
                    attrs.with(kind, value)
                })
        })
    }

    proptest! {
        #[test]
        fn attributes_round_trip(attrs in attributes(), prefix in 0usize..4) {
            let mut data = vec![0xAB; prefix];
            attrs.encode_into(&mut data);
            data.extend_from_slice(&[0x08, 0x01]);

            prop_assert_eq!(data.len() - prefix - 2, attrs.encoded_len());
            prop_assert_eq!(LocationAttributes::decode(&data, prefix).unwrap(), attrs);
        }
    }
}
