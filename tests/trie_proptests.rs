//! Property-based tests for `HashTrie`.
//!
//! Differential testing against a `BTreeMap` oracle. Hashes are raw 16-bit
//! keys with no mixing, so small keys share long zero prefixes and force
//! nested expansions.

#![expect(clippy::unwrap_used, reason = "fail fast in tests")]

use hashtrie::split::HashSplitter;
use hashtrie::{Config, HashTrie, Immediate, InsertError, NoStats, UpdateError, Updated};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Versions per key in the item pool.
const VERSIONS: u8 = 3;

#[repr(align(4))]
#[derive(Debug)]
struct Item {
    hash: [u8; 2],
    key: u16,
    version: u8,
}

fn item_hash(item: &Item) -> &[u8; 2] {
    &item.hash
}

// ============================================================================
//  Strategies
// ============================================================================

/// Keys biased toward small values and shared prefixes.
fn key() -> impl Strategy<Value = u16> {
    prop_oneof![
        3 => 0u16..32,
        2 => (0u16..16).prop_map(|k| k << 12),
        1 => any::<u16>(),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Insert(u16, u8),
    Upsert(u16, u8),
    Replace(u16, u8),
    Erase(u16),
    Extract(u16),
    Unlink(u16, u8),
    Find(u16),
}

impl Op {
    fn item(&self) -> Option<(u16, u8)> {
        match *self {
            Self::Insert(k, v) | Self::Upsert(k, v) | Self::Replace(k, v) | Self::Unlink(k, v) => {
                Some((k, v))
            }
            Self::Erase(_) | Self::Extract(_) | Self::Find(_) => None,
        }
    }
}

fn operations(max_ops: usize) -> impl Strategy<Value = Vec<Op>> {
    let version = 0..VERSIONS;
    prop::collection::vec(
        prop_oneof![
            4 => (key(), version.clone()).prop_map(|(k, v)| Op::Insert(k, v)),
            2 => (key(), version.clone()).prop_map(|(k, v)| Op::Upsert(k, v)),
            1 => (key(), version.clone()).prop_map(|(k, v)| Op::Replace(k, v)),
            2 => key().prop_map(Op::Erase),
            1 => key().prop_map(Op::Extract),
            1 => (key(), version).prop_map(|(k, v)| Op::Unlink(k, v)),
            2 => key().prop_map(Op::Find),
        ],
        0..=max_ops,
    )
}

/// Every item the operations reference, built before the trie so the
/// items never move while linked.
fn pool(ops: &[Op]) -> (Vec<Item>, HashMap<(u16, u8), usize>) {
    let wanted: BTreeSet<(u16, u8)> = ops.iter().filter_map(Op::item).collect();
    let items: Vec<Item> = wanted
        .iter()
        .map(|&(key, version)| Item {
            hash: key.to_be_bytes(),
            key,
            version,
        })
        .collect();
    let index = wanted.into_iter().enumerate().map(|(i, kv)| (kv, i)).collect();
    (items, index)
}

fn new_trie<'a>(array_bits: usize) -> HashTrie<'a, Item, 2, Immediate, NoStats> {
    let config = Config::new(item_hash)
        .with_head_bits(4)
        .with_array_bits(array_bits);
    HashTrie::with_parts(config, Immediate, NoStats).unwrap()
}

// ============================================================================
//  Differential
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Every operation agrees with a `BTreeMap<key, version>` oracle.
    #[test]
    fn differential_random_ops(ops in operations(200), array_bits in prop::sample::select(vec![2usize, 4])) {
        let (items, index) = pool(&ops);
        let trie = new_trie(array_bits);
        let mut oracle: BTreeMap<u16, u8> = BTreeMap::new();
        let guard = trie.guard();

        for op in &ops {
            match *op {
                Op::Insert(k, v) => {
                    let item = &items[index[&(k, v)]];
                    let expected = if oracle.contains_key(&k) {
                        Err(InsertError::Duplicate)
                    } else {
                        oracle.insert(k, v);
                        Ok(())
                    };
                    prop_assert_eq!(trie.insert(item), expected);
                }
                Op::Upsert(k, v) => {
                    let item = &items[index[&(k, v)]];
                    let replaced = oracle.insert(k, v).is_some();
                    prop_assert_eq!(trie.upsert(item), Ok(replaced));
                }
                Op::Replace(k, v) => {
                    let item = &items[index[&(k, v)]];
                    match (oracle.get(&k).copied(), trie.update(item, false, &guard)) {
                        (Some(old), Ok(Updated::Replaced(got))) => {
                            prop_assert_eq!(got.version, old);
                            oracle.insert(k, v);
                        }
                        (None, Err(UpdateError::NotFound)) => {}
                        (want, got) => prop_assert!(false, "oracle {:?}, trie {:?}", want, got),
                    }
                }
                Op::Erase(k) => {
                    let got = trie.erase(&k.to_be_bytes(), &guard).map(|i| i.version);
                    prop_assert_eq!(got, oracle.remove(&k));
                }
                Op::Extract(k) => {
                    let got = trie.extract(&k.to_be_bytes()).map(|i| i.version);
                    prop_assert_eq!(got, oracle.remove(&k));
                }
                Op::Unlink(k, v) => {
                    let item = &items[index[&(k, v)]];
                    let linked = oracle.get(&k) == Some(&v);
                    prop_assert_eq!(trie.unlink(item), linked);
                    if linked {
                        oracle.remove(&k);
                    }
                }
                Op::Find(k) => {
                    let got = trie.find(&k.to_be_bytes(), &guard).map(|i| i.version);
                    prop_assert_eq!(got, oracle.get(&k).copied());
                }
            }
            prop_assert_eq!(trie.len(), oracle.len());
        }

        let mut seen: Vec<(u16, u8)> = trie.iter(&guard).map(|i| (i.key, i.version)).collect();
        seen.sort_unstable();
        let expected: Vec<(u16, u8)> = oracle.into_iter().collect();
        prop_assert_eq!(seen, expected);
    }
}

// ============================================================================
//  Structure
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Level statistics account for every linked item and every cell.
    #[test]
    fn level_statistics_are_consistent(keys in prop::collection::btree_set(key(), 0..150)) {
        let items: Vec<Item> = keys
            .iter()
            .map(|&key| Item { hash: key.to_be_bytes(), key, version: 0 })
            .collect();
        let trie = new_trie(2);
        for item in &items {
            trie.insert(item).unwrap();
        }

        let levels = trie.all_level_statistics();
        prop_assert!(levels.len() <= trie.max_height());

        let data: usize = levels.iter().map(|l| l.data_cell_count).sum();
        prop_assert_eq!(data, items.len());

        for l in &levels {
            prop_assert_eq!(
                l.data_cell_count + l.array_cell_count + l.empty_cell_count,
                l.total_cells()
            );
        }
        for pair in levels.windows(2) {
            prop_assert_eq!(pair[0].array_cell_count, pair[1].array_node_count);
        }
    }

    /// Iteration order is the big-endian order of the hash bytes.
    #[test]
    fn iteration_follows_hash_order(keys in prop::collection::btree_set(any::<u16>(), 0..100)) {
        let items: Vec<Item> = keys
            .iter()
            .map(|&key| Item { hash: key.to_be_bytes(), key, version: 0 })
            .collect();
        let trie = new_trie(4);
        for item in items.iter().rev() {
            trie.insert(item).unwrap();
        }

        let guard = trie.guard();
        let order: Vec<u16> = trie.iter(&guard).map(|i| i.key).collect();
        let sorted: Vec<u16> = keys.into_iter().collect();
        prop_assert_eq!(order, sorted);
    }

    /// Segments cut at any width reassemble into the original hash.
    #[test]
    fn splitter_segments_reassemble(hash: [u8; 8], width in 1usize..=16) {
        let mut splitter = HashSplitter::new(&hash);
        let mut bits: u128 = 0;
        let mut total: usize = 0;

        while !splitter.eos() {
            let (segment, cut) = splitter.safe_cut(width);
            bits = (bits << cut) | segment as u128;
            total += cut;
        }

        prop_assert_eq!(total, 64);
        prop_assert_eq!(bits as u64, u64::from_be_bytes(hash));
    }
}
