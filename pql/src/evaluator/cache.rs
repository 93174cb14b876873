use lru::LruCache;
use pkb::relationship::{RelationshipType, StmtNo};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::rc::Rc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Values on the right of a bound (or wildcard) left side.
    Forward,
    /// Values on the left of a bound (or wildcard) right side.
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub rs: RelationshipType,
    pub direction: Direction,
    pub bound: Option<StmtNo>,
}

impl CacheKey {
    pub fn new(rs: RelationshipType, direction: Direction, bound: Option<StmtNo>) -> Self {
        Self {
            rs,
            direction,
            bound,
        }
    }
}

/// LRU memo of single-sided lookups for one on-demand evaluator. Entries are
/// never invalidated since the knowledge base does not change after
/// extraction.
pub struct RelationCache {
    inner: LruCache<CacheKey, Rc<HashSet<StmtNo>>>,
    hits: usize,
    misses: usize,
}

impl RelationCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<Rc<HashSet<StmtNo>>> {
        match self.inner.get(key) {
            Some(values) => {
                self.hits += 1;
                trace!(rs = %key.rs, direction = ?key.direction, bound = ?key.bound, "cache.hit");
                Some(Rc::clone(values))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn put(&mut self, key: CacheKey, values: Rc<HashSet<StmtNo>>) {
        self.inner.put(key, values);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_and_miss() {
        let mut cache = RelationCache::new(4);
        let key = CacheKey::new(RelationshipType::NextT, Direction::Forward, Some(1));

        assert!(cache.get(&key).is_none());
        cache.put(key, Rc::new(HashSet::from([2, 3])));

        assert_eq!(cache.get(&key).as_deref(), Some(&HashSet::from([2, 3])));
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn test_least_recently_used_is_evicted() {
        let mut cache = RelationCache::new(0);
        let first = CacheKey::new(RelationshipType::Affects, Direction::Forward, Some(1));
        let second = CacheKey::new(RelationshipType::Affects, Direction::Backward, Some(1));

        cache.put(first, Rc::new(HashSet::new()));
        cache.put(second, Rc::new(HashSet::new()));

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&first).is_none());
        assert!(cache.get(&second).is_some());
    }
}
