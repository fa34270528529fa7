//! Perfect hash build errors

use thiserror::Error;

/// Perfect hash result type
pub type PerfectHashResult<T> = Result<T, PerfectHashError>;

/// Errors raised while building a perfect hash table
#[derive(Debug, Error)]
pub enum PerfectHashError {
    /// No seed placed a bucket within the retry limit
    #[error(
        "no seed resolved bucket {primary} ({size} keys, first key {key:?}) after {attempts} attempts in a table of {table_size} slots"
    )]
    RetryLimitExceeded {
        /// First key of the failing bucket
        key: String,
        /// Redirect index of the bucket
        primary: usize,
        /// Number of keys in the bucket
        size: usize,
        /// Seeds tried
        attempts: u32,
        /// Slots of the largest table tried
        table_size: usize,
    },

    /// The same key was inserted twice
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// More keys than a 32-bit redirect table can address
    #[error("too many keys: {0}")]
    TooManyKeys(usize),
}
