//! Integration tests for argsort, intersection and deduplication

use proptest::prelude::*;
use strand::algorithms::{compare_bytes, sorted_order};
use strand::{argsort, intersect, unique, PackedStrings, Sequence, SortConfig};

fn words() -> impl Strategy<Value = Vec<Vec<u8>>> {
    let word = prop::collection::vec(prop::sample::select(b"abAB\x00\xFF".to_vec()), 0..9);
    prop::collection::vec(word, 0..200)
}

fn identity(n: usize) -> Vec<u64> {
    (0..n as u64).collect()
}

fn assert_permutation(order: &[u64], n: usize) {
    let mut seen = order.to_vec();
    seen.sort_unstable();
    assert_eq!(seen, identity(n));
}

#[test]
fn test_sort_words() {
    let words = ["delta", "alpha", "charlie", "bravo", "alpha", ""];
    let mut order = identity(words.len());
    argsort(&words[..], &mut order, &SortConfig::default()).unwrap();
    let sorted: Vec<&str> = order.iter().map(|&i| words[i as usize]).collect();
    assert_eq!(sorted, ["", "alpha", "alpha", "bravo", "charlie", "delta"]);
}

#[test]
fn test_shared_prefixes_fall_back_to_full_compare() {
    let words = ["prefix-c", "prefix-a", "prefix", "prefix-b", "pre"];
    let order = sorted_order(&words[..], &SortConfig::default()).unwrap();
    assert_eq!(order, [4, 2, 1, 3, 0]);
}

#[test]
fn test_case_insensitive() {
    let words = ["b", "A", "a", "C"];
    let order = sorted_order(&words[..], &SortConfig::case_insensitive()).unwrap();
    let sorted: Vec<String> = order.iter().map(|&i| words[i as usize].to_ascii_lowercase()).collect();
    assert_eq!(sorted, ["a", "a", "b", "c"]);
}

#[test]
fn test_rejects_bad_order() {
    let words = ["x", "y"];
    let mut too_short = [0u64];
    assert!(argsort(&words[..], &mut too_short, &SortConfig::default()).is_err());
    let mut out_of_range = [0u64, 7];
    assert!(argsort(&words[..], &mut out_of_range, &SortConfig::default()).is_err());

    let bad = SortConfig {
        radix_rounds: 9,
        ..SortConfig::default()
    };
    let mut order = identity(2);
    assert!(argsort(&words[..], &mut order, &bad).is_err());
}

#[test]
fn test_packed_strings() {
    let data = b"pearapplefig";
    let offsets = [4, 9, 12];
    let packed = PackedStrings::new(data, &offsets).unwrap();
    assert_eq!(packed.len(), 3);
    let order = sorted_order(&packed, &SortConfig::default()).unwrap();
    assert_eq!(order, [1, 2, 0]);
    assert!(PackedStrings::new(data, &[5, 3]).is_err());
}

#[test]
fn test_intersect_and_unique() {
    let a = ["apple", "fig", "pear", "fig"];
    let b = ["fig", "kiwi", "apple", "fig", "fig"];
    let mut pairs = intersect(&a[..], &b[..]).unwrap();
    pairs.sort_unstable();
    assert_eq!(pairs.len(), 3);
    assert!(pairs.iter().all(|&(i, j)| a[i] == b[j]));
    assert_eq!(pairs.iter().filter(|p| a[p.0] == "fig").count(), 2);

    let mut order = sorted_order(&b[..], &SortConfig::default()).unwrap();
    let distinct = unique(&b[..], &mut order).unwrap();
    assert_eq!(distinct, 3);
    let firsts: Vec<&str> = order[..distinct].iter().map(|&i| b[i as usize]).collect();
    assert_eq!(firsts, ["apple", "fig", "kiwi"]);
    assert_permutation(&order, b.len());
}

#[test]
fn test_empty_and_single() {
    let empty: [&str; 0] = [];
    assert!(sorted_order(&empty[..], &SortConfig::default()).unwrap().is_empty());
    assert!(intersect(&empty[..], &["a"][..]).unwrap().is_empty());
    let one = ["solo"];
    assert_eq!(sorted_order(&one[..], &SortConfig::default()).unwrap(), [0]);
}

proptest! {
    #[test]
    fn prop_sorted_permutation(words in words(), rounds in 0usize..=4, threshold in 2usize..=64) {
        let config = SortConfig {
            radix_rounds: rounds,
            insertion_threshold: threshold,
            ..SortConfig::default()
        };
        let mut order = identity(words.len());
        argsort(&words, &mut order, &config).unwrap();
        assert_permutation(&order, words.len());
        for pair in order.windows(2) {
            prop_assert!(words[pair[0] as usize] <= words[pair[1] as usize]);
        }
    }

    #[test]
    fn prop_case_folded_order(words in words()) {
        let order = sorted_order(&words, &SortConfig::case_insensitive()).unwrap();
        for pair in order.windows(2) {
            let x = &words[pair[0] as usize];
            let y = &words[pair[1] as usize];
            prop_assert_ne!(compare_bytes(x, y, true), std::cmp::Ordering::Greater);
        }
    }

    #[test]
    fn prop_partial_prefix_is_smallest(words in words(), k in 0usize..50) {
        let k = k.min(words.len());
        let full = sorted_order(&words, &SortConfig::default()).unwrap();
        let partial = sorted_order(&words, &SortConfig::partial(k)).unwrap();
        assert_permutation(&partial, words.len());
        for i in 0..k {
            prop_assert_eq!(&words[partial[i] as usize], &words[full[i] as usize]);
        }
    }

    #[test]
    fn prop_unique_counts_distinct(words in words()) {
        let mut order = sorted_order(&words, &SortConfig::default()).unwrap();
        let distinct = unique(&words, &mut order).unwrap();
        let mut expected = words.clone();
        expected.sort();
        expected.dedup();
        prop_assert_eq!(distinct, expected.len());
        for pair in order[..distinct].windows(2) {
            prop_assert!(Sequence::get(&words, pair[0] as usize) < Sequence::get(&words, pair[1] as usize));
        }
    }

    #[test]
    fn prop_intersect_pairs_match(a in words(), b in words()) {
        let pairs = intersect(&a, &b).unwrap();
        let mut used_a = vec![false; a.len()];
        let mut used_b = vec![false; b.len()];
        for &(i, j) in &pairs {
            prop_assert_eq!(&a[i], &b[j]);
            prop_assert!(!used_a[i] && !used_b[j]);
            used_a[i] = true;
            used_b[j] = true;
        }
        let common: usize = {
            let mut sa = a.clone();
            sa.sort();
            let mut sb = b.clone();
            sb.sort();
            let (mut i, mut j, mut n) = (0, 0, 0);
            while i < sa.len() && j < sb.len() {
                match sa[i].cmp(&sb[j]) {
                    std::cmp::Ordering::Less => i += 1,
                    std::cmp::Ordering::Greater => j += 1,
                    std::cmp::Ordering::Equal => { n += 1; i += 1; j += 1; }
                }
            }
            n
        };
        prop_assert_eq!(pairs.len(), common);
    }
}
