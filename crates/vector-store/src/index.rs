use crate::error::{Result, VectorStoreError};
use crate::record::{l2_norm, EmbeddingRecord, SearchHit};
use docctx_units::UnitId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Tail size past which upserts are folded into a fresh base segment
pub const DEFAULT_MERGE_THRESHOLD: usize = 256;

#[derive(Debug, Default)]
struct Segment {
    records: Vec<EmbeddingRecord>,
    positions: HashMap<UnitId, usize>,
}

impl Segment {
    fn from_records(records: Vec<EmbeddingRecord>) -> Self {
        let positions = records
            .iter()
            .enumerate()
            .map(|(pos, r)| (r.unit_id.clone(), pos))
            .collect();
        Self { records, positions }
    }

    fn get(&self, id: &UnitId) -> Option<&EmbeddingRecord> {
        self.positions.get(id).map(|&pos| &self.records[pos])
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Immutable view of the index. Readers hold one of these for the whole query.
#[derive(Debug, Default)]
struct Snapshot {
    dimension: Option<usize>,
    base: Arc<Segment>,
    tail: Arc<Segment>,
    removed: Arc<HashSet<UnitId>>,
}

impl Snapshot {
    fn live_records(&self) -> impl Iterator<Item = &EmbeddingRecord> {
        let base = self.base.records.iter().filter(move |r| {
            !self.tail.positions.contains_key(&r.unit_id) && !self.removed.contains(&r.unit_id)
        });
        let tail = self
            .tail
            .records
            .iter()
            .filter(move |r| !self.removed.contains(&r.unit_id));
        base.chain(tail)
    }

    fn get(&self, id: &UnitId) -> Option<&EmbeddingRecord> {
        if self.removed.contains(id) {
            return None;
        }
        self.tail.get(id).or_else(|| self.base.get(id))
    }

    fn merged(&self) -> Self {
        let records: Vec<EmbeddingRecord> = self.live_records().cloned().collect();
        Self {
            dimension: self.dimension,
            base: Arc::new(Segment::from_records(records)),
            tail: Arc::new(Segment::default()),
            removed: Arc::new(HashSet::new()),
        }
    }
}

/// Exact nearest-neighbour index over embedding vectors.
///
/// `build` swaps in a complete new snapshot. `upsert` and `remove` copy only
/// the small tail segment (or tombstone set) and publish a new snapshot, so
/// concurrent `query` calls always see a complete state.
#[derive(Debug)]
pub struct SimilarityIndex {
    current: RwLock<Arc<Snapshot>>,
    writer: std::sync::Mutex<()>,
    merge_threshold: usize,
}

impl Default for SimilarityIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::with_merge_threshold(DEFAULT_MERGE_THRESHOLD)
    }

    #[must_use]
    pub fn with_merge_threshold(merge_threshold: usize) -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::default())),
            writer: std::sync::Mutex::new(()),
            merge_threshold: merge_threshold.max(1),
        }
    }

    /// Independent index starting from the current snapshot.
    ///
    /// Segments are shared; writes to the fork are not visible here and the
    /// other way round.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            current: RwLock::new(self.snapshot()),
            writer: std::sync::Mutex::new(()),
            merge_threshold: self.merge_threshold,
        }
    }

    /// Replace the whole index with `records`.
    ///
    /// The dimension is fixed by the first record; records of any other
    /// dimension are dropped. Later duplicates of an id win.
    pub fn build(&self, records: impl IntoIterator<Item = EmbeddingRecord>) -> usize {
        let mut dimension = None;
        let mut by_id: HashMap<UnitId, EmbeddingRecord> = HashMap::new();
        let mut dropped = 0usize;

        for record in records {
            let dim = *dimension.get_or_insert(record.dimension());
            if record.dimension() != dim {
                log::warn!(
                    "Dropping embedding for {}: dimension {} != {dim}",
                    record.unit_id,
                    record.dimension()
                );
                dropped += 1;
                continue;
            }
            by_id.insert(record.unit_id.clone(), record);
        }

        let mut records: Vec<EmbeddingRecord> = by_id.into_values().collect();
        records.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
        let count = records.len();

        let snapshot = Snapshot {
            dimension,
            base: Arc::new(Segment::from_records(records)),
            tail: Arc::new(Segment::default()),
            removed: Arc::new(HashSet::new()),
        };

        let _guard = self.lock_writer();
        self.publish(snapshot);
        log::info!("Built similarity index: {count} vectors, {dropped} dropped");
        count
    }

    /// Add or replace one record without rebuilding the base segment
    pub fn upsert(&self, record: EmbeddingRecord) -> Result<()> {
        let _guard = self.lock_writer();
        let current = self.snapshot();

        if let Some(expected) = current.dimension {
            if record.dimension() != expected {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    actual: record.dimension(),
                });
            }
        }

        let mut tail_records = current.tail.records.clone();
        match current.tail.positions.get(&record.unit_id) {
            Some(&pos) => tail_records[pos] = record.clone(),
            None => tail_records.push(record.clone()),
        }

        let removed = if current.removed.contains(&record.unit_id) {
            let mut removed = (*current.removed).clone();
            removed.remove(&record.unit_id);
            Arc::new(removed)
        } else {
            Arc::clone(&current.removed)
        };

        let next = Snapshot {
            dimension: current.dimension.or(Some(record.dimension())),
            base: Arc::clone(&current.base),
            tail: Arc::new(Segment::from_records(tail_records)),
            removed,
        };

        if next.tail.len() > self.merge_threshold {
            log::debug!("Merging similarity index tail ({} records)", next.tail.len());
            self.publish(next.merged());
        } else {
            self.publish(next);
        }
        Ok(())
    }

    /// Drop one id from the index; returns whether it was present
    pub fn remove(&self, id: &UnitId) -> bool {
        let _guard = self.lock_writer();
        let current = self.snapshot();
        if current.get(id).is_none() {
            return false;
        }

        let mut removed = (*current.removed).clone();
        removed.insert(id.clone());
        let next = Snapshot {
            dimension: current.dimension,
            base: Arc::clone(&current.base),
            tail: Arc::clone(&current.tail),
            removed: Arc::new(removed),
        };

        if next.removed.len() > self.merge_threshold {
            self.publish(next.merged());
        } else {
            self.publish(next);
        }
        true
    }

    /// Top-`k` units with cosine similarity >= `min_score`.
    ///
    /// Sorted by score descending, ties by ascending unit id. An empty index
    /// yields an empty result.
    pub fn query(&self, vector: &[f32], k: usize, min_score: f32) -> Result<Vec<SearchHit>> {
        let snapshot = self.snapshot();
        let Some(dimension) = snapshot.dimension else {
            return Ok(Vec::new());
        };
        if k == 0 || snapshot.live_records().next().is_none() {
            return Ok(Vec::new());
        }
        if vector.len() != dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }

        let query_norm = l2_norm(vector);
        let mut hits: Vec<SearchHit> = snapshot
            .live_records()
            .filter_map(|record| {
                let score = record.similarity(vector, query_norm);
                (score >= min_score).then(|| SearchHit {
                    unit_id: record.unit_id.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.unit_id.cmp(&b.unit_id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    #[must_use]
    pub fn vector_of(&self, id: &UnitId) -> Option<Vec<f32>> {
        self.snapshot().get(id).map(|r| r.vector.clone())
    }

    #[must_use]
    pub fn contains(&self, id: &UnitId) -> bool {
        self.snapshot().get(id).is_some()
    }

    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.snapshot().dimension
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshot().live_records().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All live records sorted by unit id
    #[must_use]
    pub fn records(&self) -> Vec<EmbeddingRecord> {
        let mut records: Vec<EmbeddingRecord> = self.snapshot().live_records().cloned().collect();
        records.sort_by(|a, b| a.unit_id.cmp(&b.unit_id));
        records
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn publish(&self, snapshot: Snapshot) {
        let next = Arc::new(snapshot);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    fn lock_writer(&self) -> std::sync::MutexGuard<'_, ()> {
        self.writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(id: &str, vector: &[f32]) -> EmbeddingRecord {
        EmbeddingRecord::new(UnitId::from(id), vector.to_vec()).unwrap()
    }

    fn ids(hits: &[SearchHit]) -> Vec<&str> {
        hits.iter().map(|h| h.unit_id.as_str()).collect()
    }

    #[test]
    fn test_empty_index_query_is_empty() {
        let index = SimilarityIndex::new();
        assert!(index.query(&[1.0, 0.0], 5, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_build_drops_mismatched_dimensions() {
        let index = SimilarityIndex::new();
        let kept = index.build(vec![
            record("a", &[1.0, 0.0]),
            record("b", &[1.0, 0.0, 0.0]),
            record("c", &[0.0, 1.0]),
        ]);
        assert_eq!(kept, 2);
        assert_eq!(index.dimension(), Some(2));
        assert!(!index.contains(&UnitId::from("b")));
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        let index = SimilarityIndex::new();
        index.build(vec![
            record("zeta", &[1.0, 0.0]),
            record("alpha", &[2.0, 0.0]),
            record("mid", &[0.0, 1.0]),
        ]);
        let hits = index.query(&[1.0, 0.0], 10, 0.5).unwrap();
        assert_eq!(ids(&hits), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_upsert_shadows_base_and_remove_tombstones() {
        let index = SimilarityIndex::new();
        index.build(vec![record("a", &[1.0, 0.0]), record("b", &[0.0, 1.0])]);

        index.upsert(record("a", &[0.0, 1.0])).unwrap();
        let hits = index.query(&[0.0, 1.0], 10, 0.9).unwrap();
        assert_eq!(ids(&hits), vec!["a", "b"]);
        assert_eq!(index.len(), 2);

        assert!(index.remove(&UnitId::from("b")));
        assert!(!index.remove(&UnitId::from("b")));
        let hits = index.query(&[0.0, 1.0], 10, 0.9).unwrap();
        assert_eq!(ids(&hits), vec!["a"]);

        index.upsert(record("b", &[0.0, 1.0])).unwrap();
        assert!(index.contains(&UnitId::from("b")));
    }

    #[test]
    fn test_tail_merges_past_threshold() {
        let index = SimilarityIndex::with_merge_threshold(2);
        for i in 0..5 {
            index.upsert(record(&format!("u{i}"), &[1.0, i as f32])).unwrap();
        }
        assert_eq!(index.len(), 5);
        assert!(index.snapshot().tail.len() <= 2);
    }

    #[test]
    fn test_fork_isolates_writes() {
        let index = SimilarityIndex::new();
        index.build(vec![record("a", &[1.0, 0.0]), record("b", &[0.0, 1.0])]);

        let fork = index.fork();
        fork.upsert(record("c", &[1.0, 1.0])).unwrap();
        assert!(fork.remove(&UnitId::from("a")));

        assert_eq!(index.len(), 2);
        assert!(index.contains(&UnitId::from("a")));
        assert!(!index.contains(&UnitId::from("c")));
        assert_eq!(fork.len(), 2);
        assert!(Arc::ptr_eq(&index.snapshot().base, &fork.snapshot().base));
    }

    #[test]
    fn test_upsert_rejects_wrong_dimension() {
        let index = SimilarityIndex::new();
        index.upsert(record("a", &[1.0, 0.0])).unwrap();
        let err = index.upsert(record("b", &[1.0])).unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }
}
