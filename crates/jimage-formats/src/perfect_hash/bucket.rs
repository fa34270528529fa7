//! Buckets of keys sharing a primary hash slot

use crate::bytestring::ByteString;

/// A key with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<T> {
    /// Lookup key
    pub key: ByteString,
    /// Value stored in the key's slot
    pub value: T,
}

impl<T> Entry<T> {
    /// Create a new entry
    pub fn new(key: ByteString, value: T) -> Self {
        Self { key, value }
    }

    /// Slot of this entry under `seed` in a table of `count` slots
    pub(crate) fn slot(&self, seed: i32, count: usize) -> usize {
        self.key.hash_code_with_seed(seed) as usize % count
    }
}

/// Entries whose primary hash lands on the same redirect index
#[derive(Debug, Clone)]
pub struct Bucket<T> {
    /// Redirect index shared by every entry
    pub primary: usize,
    /// Entries in insertion order
    pub entries: Vec<Entry<T>>,
}

impl<T> Bucket<T> {
    /// Create an empty bucket for `primary`
    pub fn new(primary: usize) -> Self {
        Self {
            primary,
            entries: Vec::new(),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the bucket has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
