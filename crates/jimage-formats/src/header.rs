//! Fixed image header and byte order handling

use crate::error::{FormatError, FormatResult};
use binrw::{BinRead, BinWrite, Endian};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Cursor, Write};

/// Image magic, written in the byte order of the image
pub const IMAGE_MAGIC: u32 = 0xCAFE_DADA;

/// Supported major version
pub const MAJOR_VERSION: u16 = 1;

/// Supported minor version
pub const MINOR_VERSION: u16 = 0;

/// Size of the fixed header in bytes
pub const HEADER_SIZE: usize = 24;

/// Byte order of every multi-byte integer outside the location records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Least significant byte first
    Little,
    /// Most significant byte first
    Big,
}

impl ByteOrder {
    /// Byte order of the running platform
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// Detect the byte order from the first four bytes of an image
    pub fn detect(magic: [u8; 4]) -> FormatResult<Self> {
        if u32::from_le_bytes(magic) == IMAGE_MAGIC {
            Ok(Self::Little)
        } else if u32::from_be_bytes(magic) == IMAGE_MAGIC {
            Ok(Self::Big)
        } else {
            Err(FormatError::InvalidMagic(u32::from_be_bytes(magic)))
        }
    }

    /// Encode an `i32` in this byte order
    pub const fn i32_bytes(self, value: i32) -> [u8; 4] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }

    /// Decode an `i32` in this byte order
    pub const fn read_i32(self, bytes: [u8; 4]) -> i32 {
        match self {
            Self::Little => i32::from_le_bytes(bytes),
            Self::Big => i32::from_be_bytes(bytes),
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::native()
    }
}

impl From<ByteOrder> for Endian {
    fn from(order: ByteOrder) -> Self {
        match order {
            ByteOrder::Little => Self::Little,
            ByteOrder::Big => Self::Big,
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Little => "little",
            Self::Big => "big",
        })
    }
}

/// Image header (24 bytes)
///
/// The header carries no byte order marker besides the magic itself, so it is
/// read and written with a runtime [`Endian`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite, Serialize)]
pub struct ImageHeader {
    /// Magic number (`0xCAFEDADA`)
    pub magic: u32,

    /// Major version
    pub major_version: u16,

    /// Minor version
    pub minor_version: u16,

    /// Slots in the redirect and offset tables, `N`
    ///
    /// Equal to the resource count unless the builder had to grow the table,
    /// in which case the spare slots have offset 0.
    pub location_count: u32,

    /// Size of the redirect table in bytes (`N * 4`)
    pub redirect_table_size: u32,

    /// Size of the location records in bytes
    pub location_table_size: u32,

    /// Size of the strings table in bytes
    pub strings_table_size: u32,
}

impl ImageHeader {
    /// Create a header for `location_count` slots and the given table sizes
    pub fn new(
        location_count: u32,
        location_table_size: u32,
        strings_table_size: u32,
    ) -> FormatResult<Self> {
        let redirect_table_size =
            location_count
                .checked_mul(4)
                .ok_or(FormatError::TableOverflow {
                    table: "redirect",
                    size: u64::from(location_count) * 4,
                })?;

        Ok(Self {
            magic: IMAGE_MAGIC,
            major_version: MAJOR_VERSION,
            minor_version: MINOR_VERSION,
            location_count,
            redirect_table_size,
            location_table_size,
            strings_table_size,
        })
    }

    /// Parse the header at the start of `data`, detecting its byte order
    pub fn read(data: &[u8]) -> FormatResult<(Self, ByteOrder)> {
        let Some(prefix) = data.get(..HEADER_SIZE) else {
            return Err(FormatError::Truncated {
                segment: "header",
                needed: HEADER_SIZE as u64,
                available: data.len() as u64,
            });
        };

        let order = ByteOrder::detect([prefix[0], prefix[1], prefix[2], prefix[3]])?;
        let header = Self::read_options(&mut Cursor::new(prefix), order.into(), ())?;
        header.validate()?;
        Ok((header, order))
    }

    /// Serialize the header in `order`
    pub fn to_bytes(&self, order: ByteOrder) -> FormatResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::with_capacity(HEADER_SIZE));
        self.write_options(&mut cursor, order.into(), ())?;
        Ok(cursor.into_inner())
    }

    /// Write the header to `writer` in `order`
    pub fn write_to<W: Write>(&self, writer: &mut W, order: ByteOrder) -> FormatResult<()> {
        writer.write_all(&self.to_bytes(order)?)?;
        Ok(())
    }

    /// Validate header values
    pub fn validate(&self) -> FormatResult<()> {
        if self.magic != IMAGE_MAGIC {
            return Err(FormatError::InvalidMagic(self.magic));
        }

        if self.major_version != MAJOR_VERSION || self.minor_version != MINOR_VERSION {
            return Err(FormatError::UnsupportedVersion {
                major: self.major_version,
                minor: self.minor_version,
            });
        }

        if u64::from(self.redirect_table_size) != u64::from(self.location_count) * 4 {
            return Err(FormatError::InvalidHeader(format!(
                "redirect table size {} does not match {} locations",
                self.redirect_table_size, self.location_count
            )));
        }

        Ok(())
    }

    /// Offset of the redirect table
    pub const fn redirect_offset(&self) -> u64 {
        HEADER_SIZE as u64
    }

    /// Offset of the location offsets table
    pub const fn offsets_offset(&self) -> u64 {
        self.redirect_offset() + self.redirect_table_size as u64
    }

    /// Offset of the location records
    pub const fn locations_offset(&self) -> u64 {
        // Offsets table has the same size as the redirect table
        self.offsets_offset() + self.redirect_table_size as u64
    }

    /// Offset of the strings table
    pub const fn strings_offset(&self) -> u64 {
        self.locations_offset() + self.location_table_size as u64
    }

    /// Size of the whole index region; content offsets are relative to it
    pub const fn index_size(&self) -> u64 {
        self.strings_offset() + self.strings_table_size as u64
    }
}
