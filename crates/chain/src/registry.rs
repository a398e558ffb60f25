//! Candidate pool set for staked-position discovery.

use cl_lens_domain::PoolKey;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Upper bound on dynamically discovered keys kept in the registry.
const MAX_DISCOVERED: usize = 100;

/// The pools worth asking about when enumerating staked positions: a
/// static allow-list unioned with a capped, dynamically discovered set.
///
/// Plain state owned by the orchestrating caller; nothing here talks to
/// the network.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolRegistry {
    allow_list: Vec<PoolKey>,
    discovered: Vec<PoolKey>,
}

impl PoolRegistry {
    #[must_use]
    pub fn new(allow_list: Vec<PoolKey>) -> Self {
        Self {
            allow_list,
            discovered: Vec::new(),
        }
    }

    /// Adds dynamically discovered keys, keeping at most `MAX_DISCOVERED`.
    pub fn extend_discovered(&mut self, keys: impl IntoIterator<Item = PoolKey>) {
        for key in keys {
            if self.discovered.len() >= MAX_DISCOVERED {
                break;
            }
            self.discovered.push(key);
        }
    }

    /// All candidate keys, deduplicated, allow-list first.
    #[must_use]
    pub fn candidates(&self) -> Vec<PoolKey> {
        let mut seen = HashSet::new();
        self.allow_list
            .iter()
            .chain(self.discovered.iter())
            .filter(|key| seen.insert((*key).clone()))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allow_list.is_empty() && self.discovered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cl_lens_domain::Address;

    fn key(a: &str, b: &str, spacing: i32) -> PoolKey {
        PoolKey {
            token0: a.parse::<Address>().unwrap(),
            token1: b.parse::<Address>().unwrap(),
            tick_spacing: spacing,
        }
    }

    const T0: &str = "0x1111111111111111111111111111111111111111";
    const T1: &str = "0x2222222222222222222222222222222222222222";
    const T2: &str = "0x3333333333333333333333333333333333333333";

    #[test]
    fn candidates_deduplicate_across_sources() {
        let mut registry = PoolRegistry::new(vec![key(T0, T1, 100), key(T0, T2, 200)]);
        registry.extend_discovered(vec![key(T0, T1, 100), key(T1, T2, 1)]);
        let candidates = registry.candidates();
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0], key(T0, T1, 100));
    }

    #[test]
    fn same_pair_with_different_spacing_is_distinct() {
        let registry = PoolRegistry::new(vec![key(T0, T1, 100), key(T0, T1, 200)]);
        assert_eq!(registry.candidates().len(), 2);
    }

    #[test]
    fn discovered_set_is_capped() {
        let mut registry = PoolRegistry::default();
        let keys = (0..150).map(|i| key(T0, T1, i));
        registry.extend_discovered(keys);
        assert_eq!(registry.candidates().len(), 100);
    }
}
