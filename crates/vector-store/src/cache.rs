use crate::record::EmbeddingRecord;
use docctx_units::UnitId;
use lru::LruCache;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Fingerprint of everything an embedding depends on (blake3, hex)
#[must_use]
pub fn content_hash(parts: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

struct CachedEmbedding {
    fingerprint: String,
    record: EmbeddingRecord,
}

/// Bounded LRU cache of embeddings keyed by unit id.
///
/// An entry only hits when the caller's fingerprint matches the one it was
/// stored with; a mismatch means the unit's text (or model/template) changed
/// and the stale entry is evicted.
pub struct EmbeddingCache {
    entries: Mutex<LruCache<UnitId, CachedEmbedding>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, id: &UnitId, fingerprint: &str) -> Option<EmbeddingRecord> {
        let mut entries = self.lock();
        let matches = entries.peek(id).map(|entry| entry.fingerprint == fingerprint);
        let fresh = match matches {
            Some(true) => entries.get(id).map(|entry| entry.record.clone()),
            Some(false) => {
                entries.pop(id);
                log::debug!("Evicted stale embedding for {id}");
                None
            }
            None => None,
        };
        drop(entries);

        if fresh.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        fresh
    }

    pub fn insert(&self, fingerprint: impl Into<String>, record: EmbeddingRecord) {
        self.lock().put(
            record.unit_id.clone(),
            CachedEmbedding {
                fingerprint: fingerprint.into(),
                record,
            },
        );
    }

    pub fn invalidate(&self, id: &UnitId) -> bool {
        self.lock().pop(id).is_some()
    }

    /// Drop every entry whose unit is no longer live; returns the count
    pub fn prune(&self, live: &HashSet<UnitId>) -> usize {
        let mut entries = self.lock();
        let orphans: Vec<UnitId> = entries
            .iter()
            .filter(|(id, _)| !live.contains(*id))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &orphans {
            entries.pop(id);
        }
        orphans.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    /// (hits, misses) since creation
    #[must_use]
    pub fn hit_stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<UnitId, CachedEmbedding>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for EmbeddingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> EmbeddingRecord {
        EmbeddingRecord::new(UnitId::from(id), vec![1.0, 0.0]).unwrap()
    }

    #[test]
    fn test_hit_requires_matching_fingerprint() {
        let cache = EmbeddingCache::new(8);
        let id = UnitId::from("a.rs::f");
        cache.insert(content_hash(&["fn f() {}"]), record("a.rs::f"));

        assert!(cache.get(&id, &content_hash(&["fn f() {}"])).is_some());
        assert!(cache.get(&id, &content_hash(&["fn f() { 1 }"])).is_none());
        // stale entry evicted on mismatch
        assert!(cache.is_empty());
        assert_eq!(cache.hit_stats(), (1, 1));
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = EmbeddingCache::new(2);
        cache.insert("x", record("a"));
        cache.insert("x", record("b"));
        assert!(cache.get(&UnitId::from("a"), "x").is_some());
        cache.insert("x", record("c"));

        assert!(cache.get(&UnitId::from("b"), "x").is_none());
        assert!(cache.get(&UnitId::from("a"), "x").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_prune_removes_orphans() {
        let cache = EmbeddingCache::new(8);
        cache.insert("x", record("a"));
        cache.insert("x", record("b"));
        let live: HashSet<UnitId> = [UnitId::from("a")].into_iter().collect();
        assert_eq!(cache.prune(&live), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_hash_separates_parts() {
        assert_ne!(content_hash(&["ab", "c"]), content_hash(&["a", "bc"]));
    }
}
