//! Strings table writer and reader

use super::mutf8;
use crate::error::{FormatError, FormatResult};

/// Append-only strings table used while building an image
///
/// Offset 0 always holds the empty string, so a zero-valued name attribute
/// decodes to `""`. Every other `add` appends a fresh copy of the string;
/// callers that want sharing keep their own offset map.
#[derive(Debug, Clone)]
pub struct StringTable {
    data: Vec<u8>,
    count: usize,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    /// Create a table holding only the empty string at offset 0
    pub fn new() -> Self {
        Self {
            data: vec![0],
            count: 0,
        }
    }

    /// Append `s` and return the offset it was written at
    ///
    /// Strings start on 2-byte boundaries. The empty string is never appended
    /// and always maps to offset 0.
    ///
    /// Only valid UTF-8 is accepted, so arbitrary byte strings that are not
    /// UTF-8 cannot be stored. Resource names always are.
    pub fn add(&mut self, s: &str) -> FormatResult<u32> {
        if s.is_empty() {
            return Ok(0);
        }

        let pad = self.data.len() % 2;
        let offset = self.data.len() + pad;
        let end = offset as u64 + mutf8::encoded_len(s) as u64 + 1;
        if end > u64::from(u32::MAX) {
            return Err(FormatError::TableOverflow {
                table: "strings",
                size: end,
            });
        }

        self.data.resize(offset, 0);
        mutf8::encode_into(s, &mut self.data);
        self.data.push(0);
        self.count += 1;

        Ok(offset as u32)
    }

    /// Number of strings appended (the reserved empty string is not counted)
    pub fn count(&self) -> usize {
        self.count
    }

    /// Size of the encoded blob in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether nothing beyond the reserved empty string was added
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Encoded blob
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the table and return the encoded blob
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

/// Read-only view over a sealed strings blob
#[derive(Debug, Clone, Copy)]
pub struct StringsReader<'a> {
    data: &'a [u8],
}

impl<'a> StringsReader<'a> {
    /// Wrap an encoded strings blob
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Raw bytes of the string at `offset`, without its terminator
    pub fn get_bytes(&self, offset: u32) -> FormatResult<&'a [u8]> {
        let start = offset as usize;
        let tail = self
            .data
            .get(start..)
            .filter(|tail| !tail.is_empty())
            .ok_or(FormatError::StringOffsetOutOfRange(offset))?;
        let end = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(FormatError::UnterminatedString(offset))?;
        Ok(&tail[..end])
    }

    /// Decode the string at `offset`
    pub fn get(&self, offset: u32) -> FormatResult<String> {
        let bytes = self.get_bytes(offset)?;
        mutf8::decode(bytes).map_err(|e| match e {
            FormatError::MalformedString(pos) => FormatError::MalformedString(offset as usize + pos),
            other => other,
        })
    }

    /// Size of the blob in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check whether the blob is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
