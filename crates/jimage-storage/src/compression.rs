//! Zlib codec for stored resources

use flate2::Compression;
use flate2::read::{ZlibDecoder, ZlibEncoder};
use std::io::{self, Read};

/// Default zlib compression level
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Compress `data` with zlib at `level` (0-9)
pub fn compress(data: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(data, Compression::new(level.min(9)));
    let mut compressed = Vec::with_capacity(data.len() / 2 + 16);
    encoder.read_to_end(&mut compressed)?;
    Ok(compressed)
}

/// Largest output preallocated per input byte; `expected` comes from the
/// image and is not trusted
const MAX_PREALLOCATED_RATIO: usize = 4;

/// Inflate `data`, producing at most `expected + 1` bytes
///
/// Output is capped one byte past the expected size so a corrupted stream
/// cannot grow without bound, while an oversized result is still detectable
/// by the caller.
pub fn decompress(data: &[u8], expected: u64) -> io::Result<Vec<u8>> {
    let capacity = usize::try_from(expected)
        .unwrap_or(usize::MAX)
        .min(data.len().saturating_mul(MAX_PREALLOCATED_RATIO));
    let mut decompressed = Vec::with_capacity(capacity);
    ZlibDecoder::new(data)
        .take(expected.saturating_add(1))
        .read_to_end(&mut decompressed)?;
    Ok(decompressed)
}
