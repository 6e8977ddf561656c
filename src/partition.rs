//! Grouping helpers for node lists
//!
//! Both functions make a single pass and keep first-seen order, for groups
//! and for the items inside each group, so reports built from them are stable.

use crate::error::{Result, ScaleError};
use indexmap::IndexMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Group `items` by `key_fn`
///
/// # Example
/// ```
/// use scalelib::partition::partition;
/// let groups = partition(vec!["a1", "b1", "a2"], |s| s.chars().next());
/// assert_eq!(groups[&Some('a')], vec!["a1", "a2"]);
/// ```
pub fn partition<T, K, I, F>(items: I, mut key_fn: F) -> IndexMap<K, Vec<T>>
where
    I: IntoIterator<Item = T>,
    K: Hash + Eq,
    F: FnMut(&T) -> K,
{
    let mut by_key: IndexMap<K, Vec<T>> = IndexMap::new();
    for item in items {
        let key = key_fn(&item);
        by_key.entry(key).or_default().push(item);
    }
    by_key
}

/// Group `items` by `key_fn`, requiring exactly one item per key
///
/// Fails with [`ScaleError::PartitionCardinality`] naming the first key whose
/// group does not hold a single item, together with that whole group.
pub fn partition_single<T, K, I, F>(items: I, key_fn: F) -> Result<IndexMap<K, T>>
where
    I: IntoIterator<Item = T>,
    K: Hash + Eq + Debug,
    T: Debug,
    F: FnMut(&T) -> K,
{
    let grouped = partition(items, key_fn);
    let mut ret = IndexMap::with_capacity(grouped.len());

    for (key, mut values) in grouped {
        if values.len() != 1 {
            return Err(ScaleError::PartitionCardinality {
                key: format!("{:?}", key),
                values: values.iter().map(|v| format!("{:?}", v)).collect(),
            });
        }
        if let Some(value) = values.pop() {
            ret.insert(key, value);
        }
    }

    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_partition_keeps_first_seen_order() {
        let hosts = vec!["b-1", "a-1", "b-2", "c-1", "a-2"];
        let groups = partition(hosts, |h| h.split('-').next().unwrap_or("").to_string());

        let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(groups["b"], vec!["b-1", "b-2"]);
        assert_eq!(groups["a"], vec!["a-1", "a-2"]);
        assert_eq!(groups["c"], vec!["c-1"]);
    }

    #[test]
    fn test_partition_empty() {
        let groups = partition(Vec::<u32>::new(), |n| n % 2);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_partition_single_ok() {
        let singles = partition_single(vec![("b1", 1), ("b2", 2)], |(k, _)| *k).unwrap();
        assert_eq!(singles.len(), 2);
        assert_eq!(singles["b1"], ("b1", 1));
        assert_eq!(singles["b2"], ("b2", 2));
    }

    #[test]
    fn test_partition_single_reports_collision() {
        let err = partition_single(vec![("b1", 1), ("b2", 2), ("b1", 3)], |(k, _)| *k)
            .unwrap_err();
        match err {
            ScaleError::PartitionCardinality { key, values } => {
                assert_eq!(key, "\"b1\"");
                assert_eq!(values, vec!["(\"b1\", 1)", "(\"b1\", 3)"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    proptest! {
        #[test]
        fn prop_partition_covers_every_item_in_order(items in prop::collection::vec(0u8..16, 0..64)) {
            let indexed: Vec<(usize, u8)> = items.iter().copied().enumerate().collect();
            let groups = partition(indexed.clone(), |(_, v)| v % 5);

            let total: usize = groups.values().map(Vec::len).sum();
            prop_assert_eq!(total, indexed.len());

            for (key, group) in &groups {
                prop_assert!(group.iter().all(|(_, v)| v % 5 == *key));
                prop_assert!(group.windows(2).all(|w| w[0].0 < w[1].0));
            }
        }

        #[test]
        fn prop_partition_single_fails_iff_duplicate(items in prop::collection::vec(0u8..12, 0..24)) {
            let groups = partition(items.clone(), |v| *v);
            let has_duplicate = groups.values().any(|g| g.len() != 1);

            match partition_single(items, |v| *v) {
                Ok(singles) => {
                    prop_assert!(!has_duplicate);
                    prop_assert_eq!(singles.len(), groups.len());
                }
                Err(ScaleError::PartitionCardinality { key, values }) => {
                    prop_assert!(has_duplicate);
                    let key: u8 = key.parse().unwrap();
                    let expected: Vec<String> = groups[&key].iter().map(|v| format!("{:?}", v)).collect();
                    prop_assert_eq!(values, expected);
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }
}
