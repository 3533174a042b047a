//! Property-Based Tests for the Resource Cache
//!
//! # Test Properties
//!
//! 1. **Size Bound**: after every put/remove the total size is within the
//!    budget, or exactly one oversized entry is held
//! 2. **Size Accounting**: the running size equals the sum of live entries
//! 3. **Release Accounting**: releases + live entries == successful puts

#![cfg(test)]

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use proptest::prelude::*;

use super::{CacheConfig, ResourceCache};
use crate::clock::ManualClock;

#[derive(Debug, Clone)]
enum Op {
    Put { key: u8, size: u16 },
    Remove { key: u8 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..12, 0u16..400).prop_map(|(key, size)| Op::Put { key, size }),
        1 => (0u8..12).prop_map(|key| Op::Remove { key }),
    ]
}

fn budget_strategy() -> impl Strategy<Value = u64> {
    100u64..1200
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_size_within_budget(
        max in budget_strategy(),
        ops in prop::collection::vec(op_strategy(), 1..80),
    ) {
        let clock = Arc::new(ManualClock::new());
        let cache = ResourceCache::with_clock(
            CacheConfig { max_cache_size: max, max_age: Duration::from_secs(3600) },
            clock.clone(),
        );

        let mut puts = 0u64;
        for op in ops {
            match op {
                Op::Put { key, size } => {
                    cache.put(&format!("k{}", key), Bytes::from(vec![0u8; size as usize]));
                    puts += 1;
                }
                Op::Remove { key } => {
                    cache.remove(&format!("k{}", key));
                }
            }
            clock.advance(Duration::from_millis(1));

            let size = cache.size();
            prop_assert!(size <= max || cache.len() == 1,
                "size {} over budget {} with {} entries", size, max, cache.len());

            let stats = cache.stats();
            prop_assert_eq!(stats.releases + stats.entries as u64, puts);
        }
    }

    #[test]
    fn prop_size_matches_live_entries(
        sizes in prop::collection::vec(0u16..300, 1..40),
    ) {
        let cache = ResourceCache::with_clock(
            CacheConfig { max_cache_size: 1000, max_age: Duration::from_secs(3600) },
            Arc::new(ManualClock::new()),
        );
        for (i, size) in sizes.iter().enumerate() {
            cache.put(&format!("k{}", i), Bytes::from(vec![1u8; *size as usize]));
        }

        let live: u64 = cache
            .urls()
            .iter()
            .filter_map(|url| cache.get(url))
            .map(|data| data.len() as u64)
            .sum();
        prop_assert_eq!(live, cache.size());
    }
}
