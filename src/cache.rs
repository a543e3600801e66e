//! Per-pair channel matrix cache
//!
//! An arena of shared matrices addressed through a reciprocal pair key, so
//! (a, b) and (b, a) land on the same slot. Entries are replaced in place
//! and never evicted individually.

use std::collections::HashMap;
use std::sync::Arc;

use crate::channel::ChannelMatrix;
use crate::condition::ChannelCondition;

/// Reciprocal key for a pair of node ids
#[inline]
pub fn pair_key(a: u32, b: u32) -> u64 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    ((low as u64) << 32) | high as u64
}

/// Why a cached matrix cannot be reused
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Staleness {
    ConditionChanged,
    Expired { age_s: f64 },
}

/// State of a pair in the cache
#[derive(Debug, Clone)]
pub enum CacheState {
    Absent,
    Fresh(Arc<ChannelMatrix>),
    Stale(Arc<ChannelMatrix>, Staleness),
}

/// Arena of channel matrices keyed by node pair
#[derive(Debug, Default)]
pub struct ChannelMatrixCache {
    entries: Vec<Arc<ChannelMatrix>>,
    index: HashMap<u64, usize>,
}

impl ChannelMatrixCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: u64) -> Option<&Arc<ChannelMatrix>> {
        self.index.get(&key).map(|&slot| &self.entries[slot])
    }

    /// Classify the entry for `key` against the current condition and time.
    /// A zero `update_period_s` disables time-based expiry.
    pub fn state(&self, key: u64, condition: &ChannelCondition, now: f64, update_period_s: f64) -> CacheState {
        let Some(matrix) = self.get(key) else {
            return CacheState::Absent;
        };

        if matrix.condition != *condition {
            return CacheState::Stale(Arc::clone(matrix), Staleness::ConditionChanged);
        }

        let age_s = now - matrix.generated_at;
        if update_period_s > 0.0 && age_s > update_period_s {
            return CacheState::Stale(Arc::clone(matrix), Staleness::Expired { age_s });
        }

        CacheState::Fresh(Arc::clone(matrix))
    }

    /// Store a matrix, replacing any previous one for the same pair
    pub fn insert(&mut self, key: u64, matrix: Arc<ChannelMatrix>) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot] = matrix,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(matrix);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockage::BlockerState;
    use crate::clusters::{ClusterAngles, Polarisation};
    use crate::lsp::LargeScaleParameters;

    fn matrix(condition: ChannelCondition, generated_at: f64) -> Arc<ChannelMatrix> {
        Arc::new(ChannelMatrix {
            generated_at,
            condition,
            node_ids: (1, 2),
            num_clusters: 0,
            delays: Vec::new(),
            angles: ClusterAngles::default(),
            coefficients: Vec::new(),
            powers: Vec::new(),
            attenuation_db: Vec::new(),
            polarisation: Polarisation::default(),
            lsp: LargeScaleParameters {
                shadowing: 0.0,
                k_factor_db: 0.0,
                delay_spread: 1e-7,
                asd: 10.0,
                asa: 10.0,
                zsd: 5.0,
                zsa: 5.0,
            },
            blocker_state: BlockerState::default(),
        })
    }

    #[test]
    fn test_pair_key_symmetric() {
        assert_eq!(pair_key(3, 7), pair_key(7, 3));
        assert_eq!(pair_key(3, 7), (3u64 << 32) | 7);
        assert_ne!(pair_key(3, 7), pair_key(3, 8));
        assert_eq!(pair_key(u32::MAX, 0), u32::MAX as u64);
    }

    #[test]
    fn test_absent_then_fresh() {
        let mut cache = ChannelMatrixCache::new();
        let key = pair_key(1, 2);
        let los = ChannelCondition::los();
        assert!(matches!(cache.state(key, &los, 0.0, 0.0), CacheState::Absent));

        cache.insert(key, matrix(los, 0.0));
        assert!(matches!(cache.state(key, &los, 100.0, 0.0), CacheState::Fresh(_)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_condition_change_is_stale() {
        let mut cache = ChannelMatrixCache::new();
        let key = pair_key(1, 2);
        cache.insert(key, matrix(ChannelCondition::los(), 0.0));

        match cache.state(key, &ChannelCondition::nlos(), 0.0, 0.0) {
            CacheState::Stale(_, reason) => assert_eq!(reason, Staleness::ConditionChanged),
            other => panic!("expected stale, got {:?}", other),
        }
    }

    #[test]
    fn test_expiry() {
        let mut cache = ChannelMatrixCache::new();
        let key = pair_key(1, 2);
        let los = ChannelCondition::los();
        cache.insert(key, matrix(los, 1.0));

        assert!(matches!(cache.state(key, &los, 1.005, 0.01), CacheState::Fresh(_)));
        assert!(matches!(
            cache.state(key, &los, 1.5, 0.01),
            CacheState::Stale(_, Staleness::Expired { .. })
        ));
    }

    #[test]
    fn test_replace_in_place() {
        let mut cache = ChannelMatrixCache::new();
        let los = ChannelCondition::los();
        cache.insert(pair_key(1, 2), matrix(los, 0.0));
        cache.insert(pair_key(5, 6), matrix(los, 0.0));
        cache.insert(pair_key(2, 1), matrix(los, 3.0));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(pair_key(1, 2)).unwrap().generated_at, 3.0);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(pair_key(1, 2)).is_none());
    }
}
