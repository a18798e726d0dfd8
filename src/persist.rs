//! Binary form of a frozen dictionary.
//!
//! Layout (integers are LEB128 varints unless noted):
//!
//! ```text
//! magic "LXPK" | version: u8
//! name_len | name (UTF-8)
//! letter_count | letters (Unicode scalar values, in index order)
//! bit_width: u8 | max_word_len | word_count
//! bucket_count
//! per bucket: unit_len | entry_count | entry_count * unit_len bytes
//! ```
//!
//! The bit width is derived from the letter count; it is stored anyway so a
//! reader can reject a blob whose alphabet and entries disagree.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use crate::alphabet::Alphabet;
use crate::dictionary::CompressedDictionary;
use crate::encoder::{Encoded, SymbolEncoder};
use crate::error::{PersistError, Result};
use crate::{bits, MAX_LETTERS, MAX_WORD_LEN};

const MAGIC: &[u8; 4] = b"LXPK";
const VERSION: u8 = 1;

// =============================================================================
// Varints
// =============================================================================

/// Append `value` as a variable-length integer (1-10 bytes).
pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Decode a variable-length integer. Returns `(value, bytes_consumed)`.
///
/// `None` if the input ends mid-integer or the value overflows `u64`.
pub fn decode_varint(buf: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for (i, &byte) in buf.iter().enumerate() {
        if shift >= 64 {
            return None;
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
        shift += 7;
    }
    None
}

/// Bytes needed to encode `value` as a varint.
pub fn varint_size(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &'static str) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or(PersistError::Truncated(what))?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self, what: &'static str) -> Result<u8> {
        Ok(self.take(1, what)?[0])
    }

    fn varint(&mut self, what: &'static str) -> Result<u64> {
        let (value, used) =
            decode_varint(&self.buf[self.pos..]).ok_or(PersistError::Truncated(what))?;
        self.pos += used;
        Ok(value)
    }

    fn usize(&mut self, what: &'static str) -> Result<usize> {
        usize::try_from(self.varint(what)?).map_err(|_| PersistError::Truncated(what))
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Whether `entry` decodes to a non-empty word that packs back to exactly
/// `entry`. Rejects zero codes in place of letters, codes past the alphabet,
/// and entries padded out to a longer bucket than their word needs.
fn is_packed_word(entry: &[u8], encoder: &SymbolEncoder<'_>) -> bool {
    let word = encoder.decode(entry);
    if word.is_empty() {
        return false;
    }
    match encoder.encode(&word) {
        Ok(Encoded::Indices(indices)) => encoder.pack(&indices) == entry,
        _ => false,
    }
}

// =============================================================================
// Dictionary I/O
// =============================================================================

impl<N> CompressedDictionary<N> {
    /// Serialize to the binary form.
    pub fn to_bytes(&self) -> Vec<u8> {
        let stats = self.stats();
        let mut buf = Vec::with_capacity(64 + self.name().len() + stats.packed_bytes);

        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);

        encode_varint(self.name().len() as u64, &mut buf);
        buf.extend_from_slice(self.name().as_bytes());

        encode_varint(self.alphabet().len() as u64, &mut buf);
        for letter in self.alphabet().iter() {
            encode_varint(u64::from(u32::from(letter)), &mut buf);
        }

        buf.push(self.bit_width());
        encode_varint(self.max_word_len() as u64, &mut buf);
        encode_varint(self.len() as u64, &mut buf);

        encode_varint(stats.bucket_count as u64, &mut buf);
        for bucket in self.buckets() {
            encode_varint(bucket.unit_len() as u64, &mut buf);
            encode_varint(bucket.len() as u64, &mut buf);
            buf.extend_from_slice(bucket.as_bytes());
        }
        buf
    }

    /// Parse the binary form, attaching `normalize` for queries.
    pub fn from_bytes(bytes: &[u8], normalize: N) -> Result<Self> {
        let mut r = Reader::new(bytes);

        if r.take(MAGIC.len(), "magic")? != MAGIC {
            return Err(PersistError::InvalidMagic);
        }
        let version = r.u8("version")?;
        if version != VERSION {
            return Err(PersistError::UnsupportedVersion(version));
        }

        let name_len = r.usize("name length")?;
        let name = std::str::from_utf8(r.take(name_len, "name")?)
            .map_err(|_| PersistError::InvalidUtf8)?
            .to_owned();

        let letter_count = r.usize("letter count")?;
        if letter_count > MAX_LETTERS {
            return Err(PersistError::TooManyLetters(letter_count));
        }
        let mut letters = Vec::with_capacity(letter_count);
        for _ in 0..letter_count {
            let raw = r.varint("letter")?;
            let letter = u32::try_from(raw)
                .ok()
                .and_then(char::from_u32)
                .ok_or(PersistError::InvalidLetter(raw))?;
            letters.push(letter);
        }
        let alphabet = Alphabet::from_letters(letters).map_err(|dup| match dup {
            Some(letter) => PersistError::DuplicateLetter(letter),
            None => PersistError::TooManyLetters(letter_count),
        })?;

        let stored = r.u8("bit width")?;
        let derived = bits::bit_width(&alphabet);
        if stored != derived {
            return Err(PersistError::BitWidthMismatch { stored, derived });
        }

        let max_word_len = r.usize("max word length")?.min(MAX_WORD_LEN);
        let word_count = r.usize("word count")?;

        let encoder = SymbolEncoder::with_max_word_len(&alphabet, max_word_len);

        let bucket_count = r.usize("bucket count")?;
        let mut buckets = BTreeMap::new();
        let mut actual = 0usize;
        for _ in 0..bucket_count {
            let unit_len = r.usize("bucket unit length")?;
            let entries = r.usize("bucket entry count")?;
            let size = unit_len
                .checked_mul(entries)
                .ok_or(PersistError::Truncated("bucket data"))?;
            let data = r.take(size, "bucket data")?;

            if unit_len == 0 || entries == 0 || buckets.contains_key(&unit_len) {
                return Err(PersistError::InvalidBucket(unit_len));
            }
            let strictly_sorted = data
                .chunks_exact(unit_len)
                .zip(data.chunks_exact(unit_len).skip(1))
                .all(|(a, b)| a < b);
            if !strictly_sorted {
                return Err(PersistError::UnsortedBucket(unit_len));
            }

            if !data.chunks_exact(unit_len).all(|entry| is_packed_word(entry, &encoder)) {
                return Err(PersistError::InvalidEntry(unit_len));
            }

            actual += entries;
            buckets.insert(unit_len, data.to_vec());
        }

        if actual != word_count {
            return Err(PersistError::WordCountMismatch {
                stored: word_count,
                actual,
            });
        }
        if r.remaining() > 0 {
            return Err(PersistError::TrailingBytes(r.remaining()));
        }

        Ok(Self::from_parts(
            name,
            alphabet,
            max_word_len,
            buckets,
            word_count,
            normalize,
        ))
    }

    /// Write the binary form to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes();
        fs::write(path, &bytes)?;
        debug!(path = %path.display(), bytes = bytes.len(), words = self.len(), "saved dictionary");
        Ok(())
    }

    /// Memory-map `path` and parse it.
    ///
    /// The file must not be truncated or rewritten by anyone while this call
    /// runs. Once it returns, the dictionary owns copies of every bucket and
    /// the file is no longer referenced.
    pub fn open(path: impl AsRef<Path>, normalize: N) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // SAFETY: mapping a file is only sound while no other process modifies
        // it; callers must not truncate or rewrite `path` until `open` returns.
        // The map is dropped at the end of this function.
        let map = unsafe { Mmap::map(&file)? };
        let dict = Self::from_bytes(&map, normalize)?;
        debug!(path = %path.display(), bytes = map.len(), words = dict.len(), "opened dictionary");
        Ok(dict)
    }
}
