//! Error types for image reading and writing

use jimage_formats::{FormatError, IndexError};
use thiserror::Error;

/// Errors that can occur while reading an image
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image layout could not be decoded
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Resource bytes do not have the size their location declares
    #[error("corrupt resource {name}: expected {expected} bytes, got {actual}")]
    Corruption {
        /// Full resource name
        name: String,
        /// Uncompressed size from the location record
        expected: u64,
        /// Size actually produced
        actual: u64,
    },

    /// Compressed resource could not be inflated
    #[error("decompression of {name} failed: {source}")]
    Decompression {
        /// Full resource name
        name: String,
        /// Inflate error
        source: std::io::Error,
    },

    /// Resource bytes extend past the end of the file
    #[error("resource {name} at {offset}+{size} lies outside the content region ({available} bytes)")]
    ContentOutOfRange {
        /// Full resource name
        name: String,
        /// Offset relative to the content region
        offset: u64,
        /// Stored size
        size: u64,
        /// Size of the content region
        available: u64,
    },

    /// Image build failed
    #[error("build error: {0}")]
    Build(#[from] BuildError),
}

/// Errors that abort an image build
///
/// Duplicate resources are not errors; the writer keeps the first copy.
#[derive(Debug, Error)]
pub enum BuildError {
    /// I/O error while reading an entry or writing the image
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Index construction failed, usually a perfect hash retry limit
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// A table could not be encoded
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// An entry produced a different number of bytes than it declared
    #[error("size mismatch for {path}: declared {declared} bytes, read {actual}")]
    SizeMismatch {
        /// Full resource name
        path: String,
        /// Size declared by the archive
        declared: u64,
        /// Bytes actually read
        actual: u64,
    },

    /// Entry path cannot form a resource name
    #[error("invalid resource name: {0}")]
    InvalidName(String),

    /// Archive source failed
    #[error("archive {module}: {reason}")]
    Archive {
        /// Module whose archive failed
        module: String,
        /// Failure description
        reason: String,
    },

    /// Exploded module directory could not be walked
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// Finished image could not be moved to the output path
    #[error("failed to persist image: {0}")]
    Persist(#[from] tempfile::PersistError),
}

impl StorageError {
    /// Check if this error indicates a damaged image
    pub fn is_corruption(&self) -> bool {
        match self {
            Self::Corruption { .. }
            | Self::Decompression { .. }
            | Self::ContentOutOfRange { .. } => true,
            Self::Format(e) => e.is_corruption(),
            _ => false,
        }
    }
}
