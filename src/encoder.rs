//! Conversion between words and alphabet symbol indices.

use smallvec::SmallVec;

use crate::alphabet::Alphabet;
use crate::bits;
use crate::error::EncodeError;
use crate::MAX_WORD_LEN;

/// Symbol indices of one word. Most words fit inline.
pub type SymbolVec = SmallVec<[u8; 24]>;

/// Outcome of resolving every character of a word against an alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    /// Every character resolved.
    Indices(SymbolVec),
    /// No character resolved. Nothing is known about the word.
    AllUnknown,
    /// Some but not all characters resolved. The word cannot be stored.
    PartiallyUnknown,
}

/// Encodes words against a borrowed alphabet without growing it.
#[derive(Debug, Clone, Copy)]
pub struct SymbolEncoder<'a> {
    alphabet: &'a Alphabet,
    max_word_len: usize,
}

impl<'a> SymbolEncoder<'a> {
    pub fn new(alphabet: &'a Alphabet) -> Self {
        Self {
            alphabet,
            max_word_len: MAX_WORD_LEN,
        }
    }

    /// Use a tighter length limit than [`MAX_WORD_LEN`].
    pub fn with_max_word_len(alphabet: &'a Alphabet, max_word_len: usize) -> Self {
        Self {
            alphabet,
            max_word_len: max_word_len.min(MAX_WORD_LEN),
        }
    }

    pub fn alphabet(&self) -> &'a Alphabet {
        self.alphabet
    }

    /// Resolve `word` to symbol indices. Unknown characters are not registered.
    pub fn encode(&self, word: &str) -> Result<Encoded, EncodeError> {
        let alphabet = self.alphabet;
        encode_with(word, self.max_word_len, |c| alphabet.index_of(c))
    }

    /// Bit width packed words over this alphabet use.
    pub fn bit_width(&self) -> u8 {
        bits::bit_width(self.alphabet)
    }

    /// Pack resolved indices at the alphabet's current width.
    pub fn pack(&self, indices: &[u8]) -> Vec<u8> {
        bits::pack(indices, self.bit_width())
    }

    /// Decode a packed word.
    pub fn decode(&self, packed: &[u8]) -> String {
        bits::unpack(packed, self.bit_width(), self.alphabet)
    }

    /// Index of the first symbol of a packed word, from its leading byte.
    pub fn first_symbol(&self, packed: &[u8]) -> Option<u8> {
        bits::first_symbol(packed, self.bit_width())
    }
}

/// Resolve `word` against `alphabet`, registering new characters.
///
/// A character that cannot be registered because the alphabet is full counts
/// as unknown, so the result is never [`Encoded::Indices`] for such a word.
pub fn encode_inserting(
    alphabet: &mut Alphabet,
    word: &str,
    max_word_len: usize,
) -> Result<Encoded, EncodeError> {
    encode_with(word, max_word_len.min(MAX_WORD_LEN), |c| {
        alphabet.index_of_or_insert(c)
    })
}

fn encode_with<F>(word: &str, max_word_len: usize, mut resolve: F) -> Result<Encoded, EncodeError>
where
    F: FnMut(char) -> Option<u8>,
{
    let len = word.chars().count();
    if len >= max_word_len {
        return Err(EncodeError::WordTooLong {
            len,
            max: max_word_len,
        });
    }

    let mut indices = SymbolVec::with_capacity(len);
    let mut unknown = 0usize;
    for c in word.chars() {
        match resolve(c) {
            Some(index) => indices.push(index),
            None => unknown += 1,
        }
    }

    Ok(match unknown {
        0 => Encoded::Indices(indices),
        n if n == len => Encoded::AllUnknown,
        _ => Encoded::PartiallyUnknown,
    })
}
