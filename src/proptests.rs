use super::*;

use proptest::prelude::*;
use std::collections::BTreeSet;

fn validate_dictionary<N>(d: &CompressedDictionary<N>) {
    let mut entries = 0usize;
    for bucket in d.buckets() {
        assert!(!bucket.is_empty(), "empty bucket {}", bucket.unit_len());
        assert_eq!(bucket.as_bytes().len() % bucket.unit_len(), 0);

        let mut prev: Option<&[u8]> = None;
        for (i, entry) in bucket.iter().enumerate() {
            if let Some(prev) = prev {
                assert!(prev < entry, "bucket entries must be strictly increasing");
            }
            prev = Some(entry);

            assert_eq!(bucket.binary_search(entry), Ok(i));
            let word = bits::unpack(entry, d.bit_width(), d.alphabet());
            assert_eq!(
                bits::pack(&d.encoder().encode(&word).map(indices).unwrap(), d.bit_width()),
                entry,
                "stored entry must re-encode to itself"
            );
            entries += 1;
        }
    }
    assert_eq!(entries, d.len(), "bucket entries must match len()");
}

fn indices(encoded: Encoded) -> SymbolVec {
    match encoded {
        Encoded::Indices(v) => v,
        other => panic!("expected indices, got {other:?}"),
    }
}

fn model(words: &[String]) -> BTreeSet<String> {
    words
        .iter()
        .filter(|w| !w.is_empty() && w.chars().count() < MAX_WORD_LEN)
        .cloned()
        .collect()
}

fn word_strategy() -> impl Strategy<Value = String> {
    // Small alphabets make shared prefixes and shared packed lengths common.
    prop_oneof![
        8 => "[a-f]{0,10}",
        2 => "[a-zäöü]{1,20}",
        1 => "x{60,70}",
    ]
}

fn probe_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{0,12}"
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_membership_matches_model(
        words in prop::collection::vec(word_strategy(), 0..=300),
        probes in prop::collection::vec(probe_strategy(), 0..=100),
    ) {
        let d = CompressedDictionary::build("prop", &words, normalize::identity as Normalizer);
        let m = model(&words);

        validate_dictionary(&d);
        prop_assert_eq!(d.len(), m.len());
        prop_assert_eq!(d.all_words(), m.clone());

        for w in &m {
            prop_assert_eq!(d.contains(w), Tristate::True);
        }

        for p in &probes {
            let known = p.chars().filter(|&c| d.alphabet().index_of(c).is_some()).count();
            let total = p.chars().count();
            let expected = if total == 0 {
                Tristate::False
            } else if known == 0 {
                Tristate::Unknown
            } else if known < total {
                Tristate::False
            } else {
                m.contains(p).into()
            };
            prop_assert_eq!(d.contains(p), expected, "probe {:?}", p);
        }
    }

    #[test]
    fn prop_round_trip_over_alphabet(
        words in prop::collection::vec("[a-m]{1,10}", 1..=50),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 0..MAX_WORD_LEN),
    ) {
        let d = CompressedDictionary::build("rt", &words, normalize::identity as Normalizer);
        let letters: Vec<char> = d.alphabet().iter().collect();
        let word: String = picks.iter().map(|i| *i.get(&letters)).collect();

        let enc = d.encoder();
        let packed = enc.pack(&indices(enc.encode(&word).unwrap()));
        prop_assert_eq!(packed.len(), bits::packed_len(word.chars().count(), d.bit_width()));
        prop_assert_eq!(enc.decode(&packed), word);
    }

    #[test]
    fn prop_binary_search_rejects_absent(
        words in prop::collection::vec("[a-h]{1,8}", 1..=200),
        probes in prop::collection::vec("[a-h]{1,8}", 0..=100),
    ) {
        let d = CompressedDictionary::build("bs", &words, normalize::identity as Normalizer);
        let m = model(&words);
        let width = d.bit_width();

        for p in &probes {
            if let Ok(Encoded::Indices(ix)) = d.encoder().encode(p) {
                let packed = bits::pack(&ix, width);
                match d.binary_search(&packed) {
                    Ok(i) => {
                        prop_assert!(m.contains(p));
                        let bucket = d.bucket(packed.len()).unwrap();
                        prop_assert_eq!(bucket.get(i), Some(packed.as_slice()));
                    }
                    Err(at) => {
                        prop_assert!(!m.contains(p));
                        if let Some(bucket) = d.bucket(packed.len()) {
                            prop_assert!(at <= bucket.len());
                            if at > 0 {
                                prop_assert!(bucket.get(at - 1).unwrap() < packed.as_slice());
                            }
                            if at < bucket.len() {
                                prop_assert!(bucket.get(at).unwrap() > packed.as_slice());
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn prop_words_starting_with_matches_model(
        words in prop::collection::vec("[a-e]{1,12}", 0..=200),
        first in prop::sample::select(vec!['a', 'b', 'c', 'd', 'e', 'z']),
        min_len in 0usize..8,
        span in 0usize..8,
    ) {
        let d = CompressedDictionary::build("prefix", &words, normalize::identity as Normalizer);
        let m = model(&words);
        let max_len = min_len + span;

        let by_chars: BTreeSet<String> = m
            .iter()
            .filter(|w| w.starts_with(first))
            .filter(|w| (min_len..=max_len).contains(&w.chars().count()))
            .cloned()
            .collect();
        prop_assert_eq!(
            d.words_starting_with(first, min_len, max_len, LengthUnit::Characters),
            by_chars
        );

        let width = d.bit_width();
        let by_bytes: BTreeSet<String> = m
            .iter()
            .filter(|w| w.starts_with(first))
            .filter(|w| (min_len..=max_len).contains(&bits::packed_len(w.chars().count(), width)))
            .cloned()
            .collect();
        prop_assert_eq!(
            d.words_starting_with(first, min_len, max_len, LengthUnit::PackedBytes),
            by_bytes
        );
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let words = ["a", "b", "ab", "ba", "abc", "cab"];
    let expected: BTreeSet<String> = words.iter().map(|w| w.to_string()).collect();

    // Alphabet order follows first use, so the packed bytes differ per order,
    // but the stored word set must not.
    for_each_permutation(&words, |perm| {
        let d = CompressedDictionary::build("perm", &perm, normalize::identity as Normalizer);
        validate_dictionary(&d);
        assert_eq!(d.len(), words.len());
        assert_eq!(d.all_words(), expected);
        for w in &words {
            assert_eq!(d.contains(w), Tristate::True);
        }
        assert_eq!(d.contains("abcd"), Tristate::False);
        assert_eq!(d.contains("zz"), Tristate::Unknown);
    });
}

#[test]
fn randomized_large_corpus() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let letters: Vec<char> = "abcdefghijklmnopqrstuvwxyzåäö'-".chars().collect();
    let mut rng = StdRng::seed_from_u64(7);
    let words: Vec<String> = (0..20_000)
        .map(|_| {
            let len = rng.gen_range(1..20);
            (0..len).map(|_| letters[rng.gen_range(0..letters.len())]).collect()
        })
        .collect();

    let (d, stats) = {
        let mut b = DictionaryBuilder::new("random", normalize::identity as Normalizer);
        b.ingest_all(&words);
        b.finish_with_stats()
    };
    let m = model(&words);

    validate_dictionary(&d);
    assert_eq!(d.bit_width(), 5);
    assert_eq!(d.len(), m.len());
    assert_eq!(stats.stored + stats.duplicates, words.len());
    for w in &words {
        assert_eq!(d.contains(w), Tristate::True, "{w}");
    }
    assert!(d.stats().bytes_per_word < 12.0);
}
