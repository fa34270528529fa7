//! Perfect hash index
//!
//! Builds, once and offline, a two-level hash table that places every key of a
//! fixed set in its own slot:
//!
//! ```text
//! primary = hash(key) mod N
//! redirect[primary] <  0  → slot = -redirect[primary] - 1
//! redirect[primary] >  0  → slot = hash(key, redirect[primary]) mod N
//! redirect[primary] == 0  → key absent
//! ```
//!
//! Buckets of colliding keys are placed largest first by searching for a seed
//! that scatters the whole bucket onto free, distinct slots. Single-key
//! buckets go straight to a free slot. `N` starts at the key count; a key set
//! that no seed can separate at that size is placed again in a larger, odd
//! sized table whose spare slots stay empty. Lookups therefore cost one or two hash
//! evaluations; the caller still compares the stored key, since a key outside
//! the set can reach any slot.

mod bucket;
mod error;

pub use bucket::{Bucket, Entry};
pub use error::{PerfectHashError, PerfectHashResult};

use crate::bytestring::ByteString;
use crate::strings::{hash_code, hash_code_with_seed};
use std::collections::HashSet;

/// Default number of seeds tried per bucket before giving up
pub const DEFAULT_RETRY_LIMIT: u32 = 1000;

/// Default number of times the table may grow past the key count
pub const DEFAULT_GROWTH_LIMIT: u32 = 16;

/// Read access to a redirect table, whatever its backing storage
pub trait RedirectTable {
    /// Number of entries (the table size)
    fn len(&self) -> usize;

    /// Redirect value at `index`
    fn redirect(&self, index: usize) -> i32;

    /// Check whether the table is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RedirectTable for [i32] {
    fn len(&self) -> usize {
        <[i32]>::len(self)
    }

    fn redirect(&self, index: usize) -> i32 {
        self[index]
    }
}

/// Resolve the candidate slot for `key`
///
/// Returns `None` when the primary bucket is unused. A returned slot is only a
/// candidate: the caller must compare the key stored there.
pub fn lookup_slot<R: RedirectTable + ?Sized>(table: &R, key: &[u8]) -> Option<usize> {
    let count = table.len();
    if count == 0 {
        return None;
    }

    let primary = hash_code(key) as usize % count;
    match table.redirect(primary) {
        0 => None,
        direct if direct < 0 => {
            let slot = (-i64::from(direct) - 1) as usize;
            (slot < count).then_some(slot)
        }
        seed => Some(hash_code_with_seed(key, seed) as usize % count),
    }
}

/// Builder collecting keys for a perfect hash table
#[derive(Debug)]
pub struct PerfectHashBuilder<T> {
    entries: Vec<Entry<T>>,
    keys: HashSet<ByteString>,
    retry_limit: u32,
    growth_limit: u32,
}

impl<T> Default for PerfectHashBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PerfectHashBuilder<T> {
    /// Create an empty builder with the default retry limit
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            keys: HashSet::new(),
            retry_limit: DEFAULT_RETRY_LIMIT,
            growth_limit: DEFAULT_GROWTH_LIMIT,
        }
    }

    /// Set the number of seeds tried per bucket
    #[must_use]
    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Set how many times the table may grow when a size cannot be resolved
    ///
    /// With a limit of 0 the table always has exactly one slot per key.
    #[must_use]
    pub fn with_growth_limit(mut self, growth_limit: u32) -> Self {
        self.growth_limit = growth_limit;
        self
    }

    /// Add a key; inserting the same key twice is an error
    pub fn insert(&mut self, key: ByteString, value: T) -> PerfectHashResult<()> {
        if !self.keys.insert(key.clone()) {
            return Err(PerfectHashError::DuplicateKey(key.to_string_lossy()));
        }
        self.entries.push(Entry::new(key, value));
        Ok(())
    }

    /// Check whether `key` was already inserted
    pub fn contains(&self, key: &ByteString) -> bool {
        self.keys.contains(key)
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether no key was inserted
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Place every key
    ///
    /// The table starts with one slot per key. When some bucket cannot be
    /// resolved within the retry limit, the table grows to the next odd size
    /// and placement starts over, at most `growth_limit` times. Extra slots
    /// stay empty.
    pub fn build(self) -> PerfectHashResult<PerfectHash<T>> {
        let count = self.entries.len();
        if i32::try_from(count).is_err() {
            return Err(PerfectHashError::TooManyKeys(count));
        }
        if count == 0 {
            return Ok(PerfectHash {
                redirect: Vec::new(),
                slots: Vec::new(),
            });
        }

        let mut size = count;
        let mut grown = 0;
        let (redirect, placement) = loop {
            match self.place(size) {
                Ok(placed) => break placed,
                Err(err) if grown < self.growth_limit => {
                    // Power-of-two sizes only see the low bits of a seed
                    let next = (size + 1) | 1;
                    if i32::try_from(next).is_err() {
                        return Err(err);
                    }
                    grown += 1;
                    size = next;
                }
                Err(err) => return Err(err),
            }
        };

        let mut entries: Vec<Option<Entry<T>>> = self.entries.into_iter().map(Some).collect();
        let slots = placement
            .into_iter()
            .map(|index| index.and_then(|index| entries[index].take()))
            .collect();
        Ok(PerfectHash { redirect, slots })
    }

    /// Assign every key to a slot of a table with `size` slots
    ///
    /// Returns the redirect table and, per slot, the index of the entry
    /// stored there.
    fn place(&self, size: usize) -> PerfectHashResult<(Vec<i32>, Vec<Option<usize>>)> {
        let mut buckets: Vec<Bucket<usize>> = (0..size).map(Bucket::new).collect();
        for (index, entry) in self.entries.iter().enumerate() {
            let primary = entry.key.hash_code() as usize % size;
            buckets[primary]
                .entries
                .push(Entry::new(entry.key.clone(), index));
        }

        buckets.retain(|bucket| !bucket.is_empty());
        buckets.sort_by(|a, b| b.len().cmp(&a.len()).then(a.primary.cmp(&b.primary)));

        let mut redirect = vec![0i32; size];
        let mut slots: Vec<Option<usize>> = vec![None; size];
        let mut next_free = 0usize;

        for bucket in buckets {
            let primary = bucket.primary;

            if bucket.len() == 1 {
                let slot = if slots[primary].is_none() {
                    primary
                } else {
                    // Every slot below next_free is taken, and at least one
                    // slot is still free because one key remains unplaced.
                    while slots[next_free].is_some() {
                        next_free += 1;
                    }
                    next_free
                };
                redirect[primary] = -(slot as i32) - 1;
                slots[slot] = bucket.entries.first().map(|entry| entry.value);
            } else {
                let (seed, placement) = find_seed(&bucket, &slots, self.retry_limit)?;
                redirect[primary] = seed;
                for (entry, slot) in bucket.entries.iter().zip(placement) {
                    slots[slot] = Some(entry.value);
                }
            }
        }

        Ok((redirect, slots))
    }
}

/// Search for a seed that puts every entry of `bucket` on a distinct free slot
fn find_seed(
    bucket: &Bucket<usize>,
    slots: &[Option<usize>],
    retry_limit: u32,
) -> PerfectHashResult<(i32, Vec<usize>)> {
    let count = slots.len();
    let limit = i32::try_from(retry_limit).unwrap_or(i32::MAX);
    let mut placement = Vec::with_capacity(bucket.len());

    for seed in 1..=limit {
        placement.clear();
        let fits = bucket.entries.iter().all(|entry| {
            let slot = entry.slot(seed, count);
            let free = slots[slot].is_none() && !placement.contains(&slot);
            placement.push(slot);
            free
        });
        if fits {
            return Ok((seed, placement));
        }
    }

    Err(PerfectHashError::RetryLimitExceeded {
        key: bucket
            .entries
            .first()
            .map(|entry| entry.key.to_string_lossy())
            .unwrap_or_default(),
        primary: bucket.primary,
        size: bucket.len(),
        attempts: retry_limit,
        table_size: count,
    })
}

/// A built perfect hash table
#[derive(Debug, Clone)]
pub struct PerfectHash<T> {
    redirect: Vec<i32>,
    slots: Vec<Option<Entry<T>>>,
}

impl<T> PerfectHash<T> {
    /// Redirect table, one entry per slot
    pub fn redirect(&self) -> &[i32] {
        &self.redirect
    }

    /// Final slots; unused slots are `None`
    pub fn slots(&self) -> &[Option<Entry<T>>] {
        &self.slots
    }

    /// Number of slots, at least the key count
    pub fn table_size(&self) -> usize {
        self.slots.len()
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Check whether the table holds no keys
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Look up `key`, verifying the stored key
    pub fn get(&self, key: &[u8]) -> Option<&T> {
        let slot = lookup_slot(self.redirect.as_slice(), key)?;
        self.slots
            .get(slot)?
            .as_ref()
            .filter(|entry| entry.key.as_bytes() == key)
            .map(|entry| &entry.value)
    }

    /// Split into redirect table and slots
    pub fn into_parts(self) -> (Vec<i32>, Vec<Option<Entry<T>>>) {
        (self.redirect, self.slots)
    }
}
