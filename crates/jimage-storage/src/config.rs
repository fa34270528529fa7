//! Configuration for image writing and reading

use crate::compression::DEFAULT_COMPRESSION_LEVEL;
use jimage_formats::{ByteOrder, DEFAULT_GROWTH_LIMIT, DEFAULT_RETRY_LIMIT};
use serde::{Deserialize, Serialize};

/// Configuration for [`ImageWriter`](crate::ImageWriter)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Compress every resource with zlib
    pub compress: bool,

    /// Zlib level used when compressing (0-9)
    pub compression_level: u32,

    /// Byte order of the header and index tables
    pub byte_order: ByteOrder,

    /// Seeds tried per perfect hash bucket before the table grows
    pub retry_limit: u32,

    /// Times the perfect hash table may grow before the build fails
    pub growth_limit: u32,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            compress: false,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            byte_order: ByteOrder::native(),
            retry_limit: DEFAULT_RETRY_LIMIT,
            growth_limit: DEFAULT_GROWTH_LIMIT,
        }
    }
}

impl WriterConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable compression
    #[must_use]
    pub const fn with_compression(mut self, enable: bool) -> Self {
        self.compress = enable;
        self
    }

    /// Set the zlib level
    #[must_use]
    pub const fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level;
        self
    }

    /// Set the byte order of the image
    #[must_use]
    pub const fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Set the perfect hash retry limit
    #[must_use]
    pub const fn with_retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit;
        self
    }

    /// Set the perfect hash growth limit
    #[must_use]
    pub const fn with_growth_limit(mut self, limit: u32) -> Self {
        self.growth_limit = limit;
        self
    }
}

/// Configuration for [`ImageReader`](crate::ImageReader)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Map the content region along with the index
    ///
    /// When disabled only the index region is mapped and resources are read
    /// with positioned reads.
    pub map_content: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self { map_content: true }
    }
}

impl ReaderConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Map or read the content region
    #[must_use]
    pub const fn with_map_content(mut self, enable: bool) -> Self {
        self.map_content = enable;
        self
    }
}
