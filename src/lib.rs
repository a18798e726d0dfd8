//! # lexpack
//!
//! Compact word dictionaries for spell checking.
//!
//! Every distinct character in the corpus gets a small index, and each word is
//! stored as its indices bit-packed at the narrowest width the corpus allows
//! (at most 8 bits). Packed words are grouped by packed length into sorted,
//! fixed-width buckets, so membership is a binary search over raw bytes.
//!
//! ## Example
//!
//! ```rust
//! use lexpack::{normalize, CompressedDictionary, LengthUnit, Tristate};
//!
//! let dict = CompressedDictionary::build("pets", ["cat", "bat", "bet"], normalize::identity);
//!
//! assert_eq!(dict.contains("cat"), Tristate::True);
//! assert_eq!(dict.contains("cot"), Tristate::False);   // 'o' never seen
//! assert_eq!(dict.contains("dog"), Tristate::Unknown); // no letter ever seen
//!
//! let b_words = dict.words_starting_with('b', 0, usize::MAX, LengthUnit::Characters);
//! assert_eq!(b_words.len(), 2);
//! ```
//!
//! Building goes through [`DictionaryBuilder`] when words arrive piecemeal. The
//! builder is consumed by [`DictionaryBuilder::finish`], since packing needs
//! the alphabet's final size.

#![deny(unsafe_op_in_unsafe_fn)]

pub mod alphabet;
pub mod bits;
pub mod dictionary;
pub mod encoder;
pub mod error;
pub mod normalize;
pub mod persist;

pub use alphabet::Alphabet;
pub use dictionary::{
    Bucket, BuildStats, CompressedDictionary, DictionaryBuilder, DictionaryStats, LengthUnit,
    Normalizer, Tristate,
};
pub use encoder::{Encoded, SymbolEncoder, SymbolVec};
pub use error::{EncodeError, PersistError};

// =============================================================================
// Configuration
// =============================================================================

/// Most distinct characters an alphabet holds. Code 0 is reserved for padding,
/// which leaves 255 codes in a byte.
pub const MAX_LETTERS: usize = 255;

/// Words must be shorter than this many characters.
pub const MAX_WORD_LEN: usize = 64;

/// Widest symbol the packed format supports.
pub const MAX_BIT_WIDTH: u8 = 8;

/// Build-time settings for a [`DictionaryBuilder`].
#[derive(Debug, Clone)]
pub struct DictionaryConfig {
    /// Exclusive limit on a word's character count. Values above
    /// [`MAX_WORD_LEN`] are clamped.
    pub max_word_len: usize,
    /// Capacity hint for the number of words.
    pub initial_capacity: usize,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            max_word_len: MAX_WORD_LEN,
            initial_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod proptests;
