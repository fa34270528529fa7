//! Immutable byte string used as the index key
//!
//! A `ByteString` is a cheap view into a shared buffer. Slicing shares the
//! buffer, and the name hash is computed at most once per value.

use bytes::{Bytes, BytesMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::RangeBounds;
use std::str::Utf8Error;
use std::sync::OnceLock;

use crate::strings::{HASH_MULTIPLIER, POSITIVE_MASK, hash_code_with_seed, unmasked_hash};

/// Immutable byte string with a lazily computed name hash
#[derive(Clone, Default)]
pub struct ByteString {
    bytes: Bytes,
    /// Unmasked hash with the base seed, filled on first use
    hash: OnceLock<i32>,
}

impl ByteString {
    /// Create from shared bytes
    pub fn new(bytes: Bytes) -> Self {
        Self {
            bytes,
            hash: OnceLock::new(),
        }
    }

    /// Create from a static string without copying
    pub fn from_static(s: &'static str) -> Self {
        Self::new(Bytes::from_static(s.as_bytes()))
    }

    /// Borrow the underlying bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check whether the string is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Interpret the bytes as UTF-8
    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.bytes)
    }

    /// Lossy UTF-8 rendering, used in diagnostics
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    fn unmasked_hash(&self) -> i32 {
        *self
            .hash
            .get_or_init(|| unmasked_hash(&self.bytes, HASH_MULTIPLIER))
    }

    /// Name hash with the base seed (cached)
    pub fn hash_code(&self) -> i32 {
        self.unmasked_hash() & POSITIVE_MASK
    }

    /// Name hash with an explicit seed (not cached)
    pub fn hash_code_with_seed(&self, seed: i32) -> i32 {
        hash_code_with_seed(&self.bytes, seed)
    }

    /// Sub-range sharing the same buffer
    pub fn substring(&self, range: impl RangeBounds<usize>) -> Self {
        Self::new(self.bytes.slice(range))
    }

    /// Concatenate two strings
    ///
    /// The result's hash is derived from this string's hash when that is
    /// already known, so only `other` has to be hashed.
    pub fn concat(&self, other: &Self) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }

        let mut buf = BytesMut::with_capacity(self.len() + other.len());
        buf.extend_from_slice(&self.bytes);
        buf.extend_from_slice(&other.bytes);

        let joined = Self::new(buf.freeze());
        if let Some(&prefix) = self.hash.get() {
            let _ = joined.hash.set(unmasked_hash(&other.bytes, prefix));
        }
        joined
    }

    /// Position of the first occurrence of `byte` at or after `from`
    pub fn index_of(&self, byte: u8, from: usize) -> Option<usize> {
        self.bytes
            .get(from..)?
            .iter()
            .position(|&b| b == byte)
            .map(|pos| pos + from)
    }

    /// Position of the last occurrence of `byte`
    pub fn last_index_of(&self, byte: u8) -> Option<usize> {
        self.bytes.iter().rposition(|&b| b == byte)
    }
}

impl PartialEq for ByteString {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for ByteString {}

impl PartialEq<str> for ByteString {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for ByteString {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Hash for ByteString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl PartialOrd for ByteString {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByteString {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bytes.cmp(&other.bytes)
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<&str> for ByteString {
    fn from(s: &str) -> Self {
        Self::new(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for ByteString {
    fn from(s: String) -> Self {
        Self::new(Bytes::from(s))
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(v: Vec<u8>) -> Self {
        Self::new(Bytes::from(v))
    }
}

impl From<Bytes> for ByteString {
    fn from(bytes: Bytes) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteString({:?})", self.to_string_lossy())
    }
}

impl fmt::Display for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::strings::hash_code;

    #[test]
    fn test_hash_matches_free_function() {
        let name = ByteString::from("/java.base/java/lang/Object.class");
        assert_eq!(name.hash_code(), hash_code(name.as_bytes()));
        assert_eq!(name.hash_code_with_seed(7), 0x7bf2_fa5b);
    }

    #[test]
    fn test_substring_shares_and_compares_by_content() {
        let name = ByteString::from("/java.base/java/lang/Object.class");
        let module = name.substring(1..10);
        assert_eq!(module, "java.base");
        assert_eq!(module, ByteString::from_static("java.base"));
    }

    #[test]
    fn test_concat_carries_hash_forward() {
        let prefix = ByteString::from("/java.base/");
        let _ = prefix.hash_code();
        let joined = prefix.concat(&ByteString::from("java/lang/Object.class"));

        assert_eq!(joined, "/java.base/java/lang/Object.class");
        assert_eq!(joined.hash_code(), 0x7b31_f51f);
    }

    #[test]
    fn test_concat_without_cached_hash() {
        let joined = ByteString::from("he").concat(&ByteString::from("llo"));
        assert_eq!(joined.hash_code(), 0x6161_811d);
    }

    #[test]
    fn test_index_of() {
        let name = ByteString::from("/m/p/C.class");
        assert_eq!(name.index_of(b'/', 1), Some(2));
        assert_eq!(name.last_index_of(b'/'), Some(4));
        assert_eq!(name.last_index_of(b'#'), None);
        assert_eq!(name.index_of(b'/', 100), None);
    }
}
