//! Length-bucketed dictionary of bit-packed words.
//!
//! Words are ingested through a [`DictionaryBuilder`], which grows the alphabet
//! and keeps each word's symbol indices pending. Packing needs the alphabet's
//! final bit width, so nothing is packed until [`DictionaryBuilder::finish`]
//! consumes the builder and produces an immutable [`CompressedDictionary`].
//!
//! Layout of the frozen dictionary:
//!
//! ```text
//! packed length 2 -> [e0 e0][e1 e1][e2 e2]...   (sorted, distinct)
//! packed length 3 -> [e0 e0 e0][e1 e1 e1]...
//! ```
//!
//! Every entry in a bucket has the bucket's length, so entry `i` lives at
//! `i * unit_len` and a bucket can be binary searched with index arithmetic.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::{debug, trace};

use crate::alphabet::Alphabet;
use crate::bits;
use crate::encoder::{encode_inserting, Encoded, SymbolEncoder, SymbolVec};
use crate::{DictionaryConfig, MAX_WORD_LEN};

/// Normalizer type used when none is named: a plain function pointer.
pub type Normalizer = fn(&str) -> Option<String>;

/// Three-valued membership answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tristate {
    True,
    False,
    /// Every character of the query is foreign to the dictionary's alphabet.
    Unknown,
}

impl Tristate {
    #[inline]
    pub fn is_true(self) -> bool {
        self == Tristate::True
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        if value {
            Tristate::True
        } else {
            Tristate::False
        }
    }
}

/// Unit a length bound in [`CompressedDictionary::words_starting_with`] is
/// measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    /// Packed size of the entry in bytes, i.e. the bucket key. Filters whole
    /// buckets without decoding.
    PackedBytes,
    /// Number of characters in the decoded word.
    Characters,
}

/// Counters collected while building a dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Words pulled from the source.
    pub ingested: usize,
    /// Words the normalizer excluded.
    pub rejected: usize,
    /// Words at or over the length limit.
    pub dropped_too_long: usize,
    /// Words with a character that no longer fit in the alphabet.
    pub dropped_alphabet_full: usize,
    /// Words that normalized to the empty string.
    pub dropped_empty: usize,
    /// Accepted words that were already present.
    pub duplicates: usize,
    /// Distinct words stored.
    pub stored: usize,
}

/// Size statistics for a frozen dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DictionaryStats {
    /// Bytes of packed word data across all buckets.
    pub packed_bytes: usize,
    /// Distinct words stored.
    pub word_count: usize,
    pub bucket_count: usize,
    /// Average packed bytes per word.
    pub bytes_per_word: f64,
}

// =============================================================================
// Builder
// =============================================================================

/// Ingestion phase of a [`CompressedDictionary`].
pub struct DictionaryBuilder<N = Normalizer> {
    name: String,
    normalize: N,
    config: DictionaryConfig,
    alphabet: Alphabet,
    /// Symbol indices of accepted words, packed only once the alphabet is final.
    pending: Vec<SymbolVec>,
    stats: BuildStats,
}

impl<N> DictionaryBuilder<N>
where
    N: Fn(&str) -> Option<String>,
{
    pub fn new(name: impl Into<String>, normalize: N) -> Self {
        Self::with_config(name, normalize, DictionaryConfig::default())
    }

    pub fn with_config(name: impl Into<String>, normalize: N, mut config: DictionaryConfig) -> Self {
        config.max_word_len = config.max_word_len.min(MAX_WORD_LEN);
        Self {
            name: name.into(),
            normalize,
            pending: Vec::with_capacity(config.initial_capacity),
            config,
            alphabet: Alphabet::new(),
            stats: BuildStats::default(),
        }
    }

    /// Normalize and encode one word. Returns whether the word was kept.
    pub fn ingest(&mut self, word: &str) -> bool {
        self.stats.ingested += 1;

        let Some(normalized) = (self.normalize)(word) else {
            self.stats.rejected += 1;
            return false;
        };

        match encode_inserting(&mut self.alphabet, &normalized, self.config.max_word_len) {
            Ok(Encoded::Indices(indices)) if indices.is_empty() => {
                self.stats.dropped_empty += 1;
                trace!(raw = word, "dropping word: empty after normalization");
                false
            }
            Ok(Encoded::Indices(indices)) => {
                self.pending.push(indices);
                true
            }
            Ok(Encoded::AllUnknown | Encoded::PartiallyUnknown) => {
                self.stats.dropped_alphabet_full += 1;
                trace!(word = %normalized, "dropping word: alphabet is full");
                false
            }
            Err(err) => {
                self.stats.dropped_too_long += 1;
                trace!(word = %normalized, %err, "dropping word");
                false
            }
        }
    }

    /// Ingest every word of `words`.
    pub fn ingest_all<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.ingest(word.as_ref());
        }
    }

    /// Alphabet as grown so far.
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn finish(self) -> CompressedDictionary<N> {
        self.finish_with_stats().0
    }

    /// Pack every pending word at the final bit width and freeze.
    pub fn finish_with_stats(self) -> (CompressedDictionary<N>, BuildStats) {
        let Self {
            name,
            normalize,
            config,
            alphabet,
            pending,
            mut stats,
        } = self;

        let width = bits::bit_width(&alphabet);

        let mut raw: BTreeMap<usize, Vec<u8>> = BTreeMap::new();
        for indices in &pending {
            let packed = bits::pack(indices, width);
            raw.entry(packed.len()).or_default().extend_from_slice(&packed);
        }
        drop(pending);

        let mut buckets = BTreeMap::new();
        let mut count = 0usize;
        for (unit_len, data) in raw {
            let (sorted, duplicates) = sort_unique(&data, unit_len);
            stats.duplicates += duplicates;
            count += sorted.len() / unit_len;
            buckets.insert(unit_len, sorted);
        }
        stats.stored = count;

        debug!(
            name = %name,
            ingested = stats.ingested,
            stored = stats.stored,
            duplicates = stats.duplicates,
            rejected = stats.rejected,
            dropped = stats.dropped_too_long + stats.dropped_alphabet_full + stats.dropped_empty,
            letters = alphabet.len(),
            bit_width = width,
            buckets = buckets.len(),
            "built compressed dictionary"
        );

        let dict = CompressedDictionary {
            name,
            alphabet,
            width,
            max_word_len: config.max_word_len,
            buckets,
            count,
            normalize,
        };
        (dict, stats)
    }
}

/// Sort the fixed-width entries of `data` and drop repeats.
///
/// Returns the dense sorted buffer and the number of entries removed.
fn sort_unique(data: &[u8], unit_len: usize) -> (Vec<u8>, usize) {
    assert!(unit_len > 0 && data.len() % unit_len == 0);
    let mut order: Vec<&[u8]> = data.chunks_exact(unit_len).collect();
    order.sort_unstable();

    let mut out: Vec<u8> = Vec::with_capacity(data.len());
    let mut duplicates = 0usize;
    for e in order {
        if out.len() >= unit_len && &out[out.len() - unit_len..] == e {
            duplicates += 1;
            continue;
        }
        out.extend_from_slice(e);
    }
    out.shrink_to_fit();
    (out, duplicates)
}

// =============================================================================
// Buckets
// =============================================================================

/// Read-only view of one packed-length bucket.
#[derive(Clone, Copy)]
pub struct Bucket<'a> {
    unit_len: usize,
    data: &'a [u8],
}

impl<'a> Bucket<'a> {
    /// # Panics
    /// Panics if `data` is not a whole number of `unit_len` entries.
    pub(crate) fn new(unit_len: usize, data: &'a [u8]) -> Self {
        assert!(
            unit_len > 0 && data.len() % unit_len == 0,
            "bucket of {} bytes is not made of {unit_len}-byte entries",
            data.len()
        );
        Self { unit_len, data }
    }

    /// Packed length of every entry.
    #[inline]
    pub fn unit_len(&self) -> usize {
        self.unit_len
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / self.unit_len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The dense sorted buffer.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    #[inline]
    fn entry(&self, index: usize) -> &'a [u8] {
        let offset = index * self.unit_len;
        &self.data[offset..offset + self.unit_len]
    }

    pub fn get(&self, index: usize) -> Option<&'a [u8]> {
        (index < self.len()).then(|| self.entry(index))
    }

    /// Entries in sorted order.
    pub fn iter(&self) -> std::slice::ChunksExact<'a, u8> {
        self.data.chunks_exact(self.unit_len)
    }

    /// Binary search for an exact entry.
    ///
    /// `Ok(index)` if found, otherwise `Err(insertion_point)`.
    ///
    /// # Panics
    /// Panics if `probe` is not `unit_len` bytes long.
    pub fn binary_search(&self, probe: &[u8]) -> Result<usize, usize> {
        assert_eq!(probe.len(), self.unit_len, "probe length must match bucket");
        let mut low = 0usize;
        let mut high = self.len();
        while low < high {
            let mid = low + (high - low) / 2;
            match self.entry(mid).cmp(probe) {
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid,
                Ordering::Equal => return Ok(mid),
            }
        }
        Err(low)
    }
}

impl fmt::Debug for Bucket<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("unit_len", &self.unit_len)
            .field("entries", &self.len())
            .finish()
    }
}

// =============================================================================
// Frozen dictionary
// =============================================================================

/// Immutable, queryable word set stored as bit-packed, length-bucketed entries.
///
/// All queries take `&self`; the dictionary can be shared across threads as
/// long as its normalizer can.
#[derive(Clone)]
pub struct CompressedDictionary<N = Normalizer> {
    name: String,
    alphabet: Alphabet,
    width: u8,
    max_word_len: usize,
    buckets: BTreeMap<usize, Vec<u8>>,
    /// Distinct entries across all buckets.
    count: usize,
    normalize: N,
}

impl<N> CompressedDictionary<N>
where
    N: Fn(&str) -> Option<String>,
{
    /// Build from a word source in one pass.
    pub fn build<I, S>(name: impl Into<String>, words: I, normalize: N) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = DictionaryBuilder::new(name, normalize);
        builder.ingest_all(words);
        builder.finish()
    }

    /// Membership test.
    ///
    /// `Unknown` when no character of the normalized word is in the alphabet;
    /// `False` when only some are, when the word is too long or excluded by
    /// the normalizer, or when it simply is not stored.
    pub fn contains(&self, word: &str) -> Tristate {
        let Some(normalized) = (self.normalize)(word) else {
            return Tristate::False;
        };

        let indices = match self.encoder().encode(&normalized) {
            Ok(Encoded::Indices(indices)) => indices,
            Ok(Encoded::AllUnknown) => return Tristate::Unknown,
            Ok(Encoded::PartiallyUnknown) | Err(_) => return Tristate::False,
        };
        if indices.is_empty() {
            return Tristate::False;
        }

        let packed = bits::pack(&indices, self.width);
        match self.bucket(packed.len()) {
            Some(bucket) => bucket.binary_search(&packed).is_ok().into(),
            None => Tristate::False,
        }
    }

    /// Normalizer this dictionary applies to queries.
    pub fn normalizer(&self) -> &N {
        &self.normalize
    }
}

impl<N> CompressedDictionary<N> {
    pub(crate) fn from_parts(
        name: String,
        alphabet: Alphabet,
        max_word_len: usize,
        buckets: BTreeMap<usize, Vec<u8>>,
        count: usize,
        normalize: N,
    ) -> Self {
        let width = bits::bit_width(&alphabet);
        Self {
            name,
            alphabet,
            width,
            max_word_len,
            buckets,
            count,
            normalize,
        }
    }

    /// Words whose first character is `first`, decoded.
    ///
    /// `min_len` and `max_len` are inclusive and measured in `unit`. With
    /// [`LengthUnit::PackedBytes`] whole buckets are skipped by key; with
    /// [`LengthUnit::Characters`] each candidate is checked after decoding.
    pub fn words_starting_with(
        &self,
        first: char,
        min_len: usize,
        max_len: usize,
        unit: LengthUnit,
    ) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let Some(target) = self.alphabet.index_of(first) else {
            return out;
        };

        for bucket in self.buckets() {
            if unit == LengthUnit::PackedBytes
                && (bucket.unit_len() < min_len || bucket.unit_len() > max_len)
            {
                continue;
            }
            for entry in bucket.iter() {
                if bits::first_symbol(entry, self.width) != Some(target) {
                    continue;
                }
                let word = bits::unpack(entry, self.width, &self.alphabet);
                if unit == LengthUnit::Characters {
                    let len = word.chars().count();
                    if len < min_len || len > max_len {
                        continue;
                    }
                }
                out.insert(word);
            }
        }
        out
    }

    /// Every stored word.
    pub fn all_words(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.traverse(|word| {
            out.insert(word.to_owned());
        });
        out
    }

    /// Visit every stored word, bucket by bucket in ascending packed length.
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(&str),
    {
        for bucket in self.buckets() {
            for entry in bucket.iter() {
                visit(&bits::unpack(entry, self.width, &self.alphabet));
            }
        }
    }

    /// Search the bucket matching `packed.len()` for an exact entry.
    ///
    /// With no bucket of that length the insertion point is `0`.
    pub fn binary_search(&self, packed: &[u8]) -> Result<usize, usize> {
        match self.bucket(packed.len()) {
            Some(bucket) => bucket.binary_search(packed),
            None => Err(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of distinct words stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Bits per symbol in every packed entry.
    pub fn bit_width(&self) -> u8 {
        self.width
    }

    /// Exclusive character limit words were built under.
    pub fn max_word_len(&self) -> usize {
        self.max_word_len
    }

    /// Encoder over this dictionary's alphabet.
    pub fn encoder(&self) -> SymbolEncoder<'_> {
        SymbolEncoder::with_max_word_len(&self.alphabet, self.max_word_len)
    }

    /// Bucket keys (packed byte lengths) in ascending order.
    pub fn bucket_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.keys().copied()
    }

    pub fn bucket(&self, unit_len: usize) -> Option<Bucket<'_>> {
        self.buckets
            .get(&unit_len)
            .map(|data| Bucket::new(unit_len, data))
    }

    pub fn buckets(&self) -> impl Iterator<Item = Bucket<'_>> + '_ {
        self.buckets
            .iter()
            .map(|(&unit_len, data)| Bucket::new(unit_len, data))
    }

    pub fn stats(&self) -> DictionaryStats {
        let packed_bytes = self.buckets.values().map(Vec::len).sum();
        DictionaryStats {
            packed_bytes,
            word_count: self.count,
            bucket_count: self.buckets.len(),
            bytes_per_word: if self.count > 0 {
                packed_bytes as f64 / self.count as f64
            } else {
                0.0
            },
        }
    }
}

impl<N> fmt::Debug for CompressedDictionary<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedDictionary")
            .field("name", &self.name)
            .field("letters", &self.alphabet.len())
            .field("bit_width", &self.width)
            .field("words", &self.count)
            .field("buckets", &self.buckets.len())
            .finish()
    }
}
