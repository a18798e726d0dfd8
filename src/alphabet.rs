//! Dynamic character alphabet.
//!
//! Characters are registered on first use and keep the position they were
//! registered at for the lifetime of the alphabet. Positions are the symbol
//! indices that get bit-packed, so the alphabet is capped at [`MAX_LETTERS`]
//! entries: the packed stream stores index `i` as code `i + 1` and reserves
//! code 0 for padding, so the largest code has to fit in a byte.

use crate::MAX_LETTERS;

/// Ordered, append-only set of characters. A character's position is its index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alphabet {
    letters: Vec<char>,
}

impl Alphabet {
    pub fn new() -> Self {
        Self {
            letters: Vec::new(),
        }
    }

    /// Build an alphabet from letters in index order.
    ///
    /// Returns the first offending letter if it appears twice, or `Err(None)`
    /// when there are more than [`MAX_LETTERS`].
    pub fn from_letters<I>(letters: I) -> Result<Self, Option<char>>
    where
        I: IntoIterator<Item = char>,
    {
        let mut alphabet = Self::new();
        for letter in letters {
            if alphabet.index_of(letter).is_some() {
                return Err(Some(letter));
            }
            if alphabet.index_of_or_insert(letter).is_none() {
                return Err(None);
            }
        }
        Ok(alphabet)
    }

    /// Index of `letter`, if registered.
    #[inline]
    pub fn index_of(&self, letter: char) -> Option<u8> {
        // Alphabets are tiny; a linear scan beats hashing here.
        self.letters
            .iter()
            .position(|&c| c == letter)
            .map(|i| i as u8)
    }

    /// Index of `letter`, registering it at the next free index if needed.
    ///
    /// Returns `None` only when the letter is new and the alphabet is full.
    pub fn index_of_or_insert(&mut self, letter: char) -> Option<u8> {
        if let Some(index) = self.index_of(letter) {
            return Some(index);
        }
        if self.letters.len() >= MAX_LETTERS {
            return None;
        }
        self.letters.push(letter);
        Some((self.letters.len() - 1) as u8)
    }

    /// Letter registered at `index`, or `None` past the end.
    #[inline]
    pub fn letter_at(&self, index: usize) -> Option<char> {
        self.letters.get(index).copied()
    }

    /// Highest index handed out so far.
    #[inline]
    pub fn highest_index_used(&self) -> Option<usize> {
        self.letters.len().checked_sub(1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.letters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.letters.len() >= MAX_LETTERS
    }

    /// Letters in index order.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.letters.iter().copied()
    }
}
