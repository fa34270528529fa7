//! Codecs for the jimage module-image container
//!
#![allow(clippy::cast_possible_truncation)] // Intentional for binary format parsing
#![allow(clippy::cast_sign_loss)] // Hashes are masked to 31 bits before use as indices
#![allow(clippy::cast_lossless)] // Sometimes clearer than From
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::doc_markdown)] // Format terms don't need backticks
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! This crate provides the I/O-free building blocks shared by the image reader
//! and writer: the name hash, the modified UTF-8 strings table, the packed
//! location records, the perfect hash index and the fixed header.
//!
//! # Layout
//!
//! ```text
//! header        24 bytes, magic 0xCAFEDADA in the image byte order
//! redirect[N]   i32 per resource
//! offsets[N]    i32 per slot, offset into the location records
//! locations     packed attribute records, offset 0 is the empty record
//! strings       zero-terminated modified UTF-8, offset 0 is ""
//! content       resource bytes, addressed relative to the end of strings
//! ```
//!
//! # Design Principles
//!
//! - **Symmetric Operations**: every table has a builder and a borrowed reader
//! - **Zero-Copy Parsing**: [`IndexView`] borrows its tables from the image
//! - **Round-Trip Guarantee**: decode(encode(x)) == x for strings and records

#![warn(missing_docs)]

pub mod bytestring;
pub mod error;
pub mod header;
pub mod index;
pub mod location;
/// Perfect hash index over resource names
pub mod perfect_hash;
pub mod strings;

pub use bytestring::ByteString;
pub use error::{FormatError, FormatResult};
pub use header::{ByteOrder, HEADER_SIZE, IMAGE_MAGIC, ImageHeader, MAJOR_VERSION, MINOR_VERSION};
pub use index::{ImageIndex, IndexBuilder, IndexError, IndexView, IntTable};
pub use location::{AttributeKind, Location, LocationAttributes, ResourceName};
pub use perfect_hash::{
    DEFAULT_GROWTH_LIMIT, DEFAULT_RETRY_LIMIT, PerfectHash, PerfectHashBuilder, PerfectHashError,
};
pub use strings::{StringTable, StringsReader, hash_code, hash_code_with_seed};
