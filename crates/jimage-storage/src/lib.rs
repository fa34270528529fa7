//! File-backed reader and writer for jimage module-image containers.
//!
//! The writer merges module archives into a single image: class files and
//! resources are stored (optionally zlib-compressed) behind a perfect hash
//! index, while native libraries, commands and other packaged files are
//! handed to an [`ExternalFiles`] sink. The reader memory-maps the image and
//! answers lookups by full resource name.
//!
//! # Example
//!
//! ```rust,no_run
//! use jimage_storage::{ImageReader, ImageWriter, MemoryArchive, WriterConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = MemoryArchive::new("app").with_resource("com/example/Main.class", &b"\xCA\xFE"[..]);
//! ImageWriter::new(WriterConfig::default().with_compression(true))
//!     .with_archive(archive)
//!     .build("modules")?;
//!
//! let reader = ImageReader::open("modules")?;
//! let bytes = reader.resource("/app/com/example/Main.class")?;
//! assert_eq!(bytes.as_deref(), Some(&b"\xCA\xFE"[..]));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

// Module archive sources
pub mod archive;

// Zlib codec for stored resources
pub mod compression;

// Configuration
pub mod config;

// Error types
pub mod error;

// Sinks for entries stored outside the image
pub mod external;

// Image reading
pub mod reader;

// Image writing
pub mod writer;

pub use archive::{Archive, ArchiveEntry, DirArchive, EntryKind, EntrySource, MemoryArchive};
pub use config::{ReaderConfig, WriterConfig};
pub use error::{BuildError, StorageError};
pub use external::{DirectoryExternalFiles, DiscardExternalFiles, ExternalFiles};
pub use reader::{ImageReader, VerifyReport};
pub use writer::{BuildSummary, ImageWriter};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Conventional file name of an image inside a runtime's `lib` directory.
pub const DEFAULT_IMAGE_NAME: &str = "modules";
