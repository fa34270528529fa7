//! Strings table, modified UTF-8 codec and the shared name hash
//!
//! Name components of every location are stored once in a contiguous blob of
//! zero-terminated modified UTF-8 strings and referenced by byte offset. The
//! same module provides the seeded hash that the perfect hash index runs over
//! resource names.

pub mod hash;
pub mod mutf8;
mod table;

pub use hash::{HASH_MULTIPLIER, POSITIVE_MASK, hash_code, hash_code_with_seed, unmasked_hash};
pub use table::{StringTable, StringsReader};
