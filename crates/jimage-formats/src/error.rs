//! Error types for image format decoding

use thiserror::Error;

/// Format operation result type
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors raised while decoding or encoding the image container layout
#[derive(Debug, Error)]
pub enum FormatError {
    /// Magic number did not match in either byte order
    #[error("invalid image magic: 0x{0:08X}")]
    InvalidMagic(u32),

    /// Major version not understood by this implementation
    #[error("unsupported image version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version found
        major: u16,
        /// Minor version found
        minor: u16,
    },

    /// Header fields are inconsistent with each other
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// A segment extends past the end of the available data
    #[error("truncated image: {segment} needs {needed} bytes, {available} available")]
    Truncated {
        /// Segment being read
        segment: &'static str,
        /// Bytes required to hold the segment
        needed: u64,
        /// Bytes actually available
        available: u64,
    },

    /// Location record ran off the end of the table before its END byte
    #[error("location record at offset {0} is not terminated")]
    UnterminatedRecord(usize),

    /// Attribute header names a kind outside the closed set
    #[error("unknown attribute kind {kind} at offset {offset}")]
    UnknownAttribute {
        /// Kind field of the header byte
        kind: u8,
        /// Offset of the header byte within the location table
        offset: usize,
    },

    /// Location offset points outside the location table
    #[error("location offset {0} out of range")]
    LocationOffsetOutOfRange(u32),

    /// String offset points outside the strings table
    #[error("string offset {0} out of range")]
    StringOffsetOutOfRange(u32),

    /// String has no zero terminator before the end of the table
    #[error("string at offset {0} is not terminated")]
    UnterminatedString(u32),

    /// Byte sequence is not valid modified UTF-8
    #[error("malformed modified UTF-8 at byte {0}")]
    MalformedString(usize),

    /// A table grew past what its 32-bit offsets can address
    #[error("{table} table overflow: {size} bytes")]
    TableOverflow {
        /// Table that overflowed
        table: &'static str,
        /// Size the table would have reached
        size: u64,
    },

    /// Binary read/write error
    #[error("binary format error: {0}")]
    BinRw(#[from] binrw::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    /// Check if this error indicates damaged or truncated data rather than a
    /// file of the wrong kind
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. }
                | Self::UnterminatedRecord(_)
                | Self::UnknownAttribute { .. }
                | Self::LocationOffsetOutOfRange(_)
                | Self::StringOffsetOutOfRange(_)
                | Self::UnterminatedString(_)
                | Self::MalformedString(_)
        )
    }
}
