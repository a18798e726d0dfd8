//! Error types.
//!
//! Expected conditions during ingestion and lookup (unknown characters, a full
//! alphabet) are ordinary result variants, not errors. The types here cover the
//! length limit on encoding and everything that can go wrong reading or writing
//! a persisted dictionary.

use std::io;

/// Error returned when a word cannot be encoded at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("word has {len} characters, limit is {max} (exclusive)")]
    WordTooLong { len: usize, max: usize },
}

/// Error type for persisted dictionary I/O.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid magic bytes (expected LXPK)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("truncated data while reading {0}")]
    Truncated(&'static str),

    #[error("dictionary name is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid letter code point: {0:#x}")]
    InvalidLetter(u64),

    #[error("letter {0:?} appears twice in the alphabet")]
    DuplicateLetter(char),

    #[error("alphabet has {0} letters, limit is 255")]
    TooManyLetters(usize),

    #[error("stored bit width {stored} does not match derived width {derived}")]
    BitWidthMismatch { stored: u8, derived: u8 },

    #[error("bucket with unit length {0} is not strictly sorted")]
    UnsortedBucket(usize),

    #[error("bucket with unit length {0} is empty or repeated")]
    InvalidBucket(usize),

    #[error("bucket with unit length {0} holds an entry that is not a packed word")]
    InvalidEntry(usize),

    #[error("stored word count {stored} does not match {actual} bucket entries")]
    WordCountMismatch { stored: usize, actual: usize },

    #[error("{0} trailing bytes after dictionary payload")]
    TrailingBytes(usize),
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistError>;
