use crate::config::IndexerConfig;
use crate::error::Result;
use crate::parsed::ParsedFile;
use crate::stats::IndexStats;
use docctx_graph::{DependencyGraph, GraphBuilder, RawReference};
use docctx_units::{StructuralUnit, UnitId, UnitStore};
use docctx_vector_store::{
    content_hash, save_index, EmbeddingCache, EmbeddingProvider, EmbeddingRecord,
    EmbeddingTemplates, SimilarityIndex, VectorStoreError,
};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Read-only view of an indexed codebase, shared with the assembler
#[derive(Debug, Clone)]
pub struct CodebaseIndex {
    pub units: Arc<UnitStore>,
    pub graph: Arc<DependencyGraph>,
    pub vectors: Arc<SimilarityIndex>,
    references: Arc<BTreeMap<String, Vec<RawReference>>>,
}

impl CodebaseIndex {
    /// Assemble an index from prebuilt parts (no references are retained, so
    /// a later `reindex_file` only sees the re-indexed file's references)
    #[must_use]
    pub fn from_parts(
        units: Arc<UnitStore>,
        graph: Arc<DependencyGraph>,
        vectors: Arc<SimilarityIndex>,
    ) -> Self {
        Self {
            units,
            graph,
            vectors,
            references: Arc::new(BTreeMap::new()),
        }
    }

    /// Unresolved references per file, as last supplied by the parser
    pub fn references(&self) -> impl Iterator<Item = &RawReference> {
        self.references.values().flatten()
    }
}

/// Builds and maintains a [`CodebaseIndex`].
///
/// Embeddings go through the shared [`EmbeddingCache`], keyed by a
/// fingerprint of model, template and rendered text, so unchanged units are
/// never re-embedded across passes.
pub struct CodebaseIndexer {
    provider: Arc<dyn EmbeddingProvider>,
    templates: EmbeddingTemplates,
    template_hash: String,
    cache: Arc<EmbeddingCache>,
    config: IndexerConfig,
}

impl CodebaseIndexer {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: IndexerConfig) -> Result<Self> {
        Self::with_templates(provider, EmbeddingTemplates::default(), config)
    }

    pub fn with_templates(
        provider: Arc<dyn EmbeddingProvider>,
        templates: EmbeddingTemplates,
        config: IndexerConfig,
    ) -> Result<Self> {
        config.validate()?;
        templates.validate()?;
        let template_hash = templates.template_hash();
        Ok(Self {
            provider,
            templates,
            template_hash,
            cache: Arc::new(EmbeddingCache::new(config.cache_capacity)),
            config,
        })
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }

    #[must_use]
    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    /// Batch build: load units, embed them (cache first), build the similarity
    /// index and the dependency graph. Units the provider cannot embed are
    /// logged and left out; the build continues.
    pub async fn build(&self, files: Vec<ParsedFile>) -> Result<(CodebaseIndex, IndexStats)> {
        let started = Instant::now();
        log::info!("Indexing {} files", files.len());

        let mut stats = IndexStats {
            files: files.len(),
            ..IndexStats::default()
        };
        let (store, references) = collect(files);

        let mut units: Vec<&StructuralUnit> = store.iter().collect();
        units.sort_by(|a, b| a.id.cmp(&b.id));
        let records = self.embed_units(&units, &mut stats).await?;

        Ok(self.finish(store, references, records, stats, started))
    }

    /// Batch build from vectors computed elsewhere; the provider is not called.
    ///
    /// Vectors for unknown units and invalid vectors are dropped with a warning.
    pub async fn build_precomputed<I>(
        &self,
        files: Vec<ParsedFile>,
        vectors: I,
    ) -> Result<(CodebaseIndex, IndexStats)>
    where
        I: IntoIterator<Item = (UnitId, Vec<f32>)>,
    {
        let started = Instant::now();
        let mut stats = IndexStats {
            files: files.len(),
            ..IndexStats::default()
        };
        let (store, references) = collect(files);

        let mut records = Vec::new();
        for (id, vector) in vectors {
            if !store.contains(&id) {
                log::warn!("Dropping vector for unknown unit {id}");
                stats.pruned += 1;
                continue;
            }
            match EmbeddingRecord::new(id, vector) {
                Ok(record) => records.push(record),
                Err(err) => log::warn!("{err}"),
            }
        }
        stats.cached = records.len();
        stats.failed = store.len().saturating_sub(records.len());

        Ok(self.finish(store, references, records, stats, started))
    }

    /// Replace one file's units, vectors and outgoing references.
    ///
    /// The returned index has its own unit store, graph and a fork of the
    /// similarity index; `index` is left untouched for in-flight readers. An
    /// empty `ParsedFile` removes the file.
    pub async fn reindex_file(
        &self,
        index: &CodebaseIndex,
        file: ParsedFile,
    ) -> Result<(CodebaseIndex, IndexStats)> {
        let started = Instant::now();
        log::debug!("Re-indexing {}", file.file_path);

        let mut stats = IndexStats {
            files: 1,
            ..IndexStats::default()
        };
        let mut store = (*index.units).clone();
        let mut references = (*index.references).clone();

        let removed = store.remove_file(&file.file_path);
        references.remove(&file.file_path);
        for unit in file.units {
            store.put(unit);
        }
        if !file.references.is_empty() {
            references.insert(file.file_path.clone(), file.references);
        }

        let fresh = store.units_in_file(&file.file_path);
        stats.units = fresh.len();
        let records = self.embed_units(&fresh, &mut stats).await?;

        let embedded: HashSet<UnitId> = records.iter().map(|r| r.unit_id.clone()).collect();
        let stale: Vec<UnitId> = removed
            .into_iter()
            .chain(fresh.iter().map(|u| u.id.clone()))
            .filter(|id| !embedded.contains(id))
            .collect();
        let vectors = index.vectors.fork();
        for record in records {
            vectors.upsert(record)?;
        }
        for id in &stale {
            if vectors.remove(id) {
                stats.pruned += 1;
            }
            if !store.contains(id) {
                self.cache.invalidate(id);
            }
        }

        let (graph, report) =
            GraphBuilder::new(&store).build(references.values().flatten().cloned());
        stats.edges = report.edges;
        stats.dangling_edges = report.dangling;
        stats.time_ms = started.elapsed().as_millis() as u64;
        log::info!("Re-indexed {}: {stats:?}", file.file_path);

        let updated = CodebaseIndex {
            units: Arc::new(store),
            graph: Arc::new(graph),
            vectors: Arc::new(vectors),
            references: Arc::new(references),
        };
        Ok((updated, stats))
    }

    /// Persist the index's vectors under the provider's model id
    pub async fn save_vectors(&self, index: &CodebaseIndex, path: &Path) -> Result<()> {
        save_index(path, self.provider.model_id(), &index.vectors).await?;
        Ok(())
    }

    fn finish(
        &self,
        store: UnitStore,
        references: BTreeMap<String, Vec<RawReference>>,
        records: Vec<EmbeddingRecord>,
        mut stats: IndexStats,
        started: Instant,
    ) -> (CodebaseIndex, IndexStats) {
        stats.units = store.len();

        let vectors = SimilarityIndex::with_merge_threshold(self.config.merge_threshold);
        vectors.build(records);

        let live: HashSet<UnitId> = store.ids().into_iter().collect();
        let pruned = self.cache.prune(&live);
        if pruned > 0 {
            log::info!("Pruned {pruned} cached embeddings of removed units");
        }
        stats.pruned += pruned;

        let (graph, report) =
            GraphBuilder::new(&store).build(references.values().flatten().cloned());
        stats.edges = report.edges;
        stats.dangling_edges = report.dangling;
        stats.time_ms = started.elapsed().as_millis() as u64;
        log::info!("Indexing completed: {stats:?}");

        let index = CodebaseIndex {
            units: Arc::new(store),
            graph: Arc::new(graph),
            vectors: Arc::new(vectors),
            references: Arc::new(references),
        };
        (index, stats)
    }

    /// Embed units in batches of `concurrency` spawned tasks
    async fn embed_units(
        &self,
        units: &[&StructuralUnit],
        stats: &mut IndexStats,
    ) -> Result<Vec<EmbeddingRecord>> {
        let model_id = self.provider.model_id().to_string();
        let mut records = Vec::with_capacity(units.len());

        for batch in units.chunks(self.config.concurrency) {
            let mut tasks = Vec::with_capacity(batch.len());
            for unit in batch {
                let text = match self.templates.render_unit(unit) {
                    Ok(text) => text,
                    Err(err) => {
                        log::warn!("Skipping {}: {err}", unit.id);
                        stats.failed += 1;
                        continue;
                    }
                };
                let fingerprint = content_hash(&[
                    model_id.as_str(),
                    self.template_hash.as_str(),
                    text.as_str(),
                ]);
                if let Some(record) = self.cache.get(&unit.id, &fingerprint) {
                    stats.cached += 1;
                    records.push(record);
                    continue;
                }

                let provider = Arc::clone(&self.provider);
                let id = unit.id.clone();
                let task = tokio::spawn(async move {
                    let vector = provider.embed(&text).await;
                    (id, fingerprint, vector)
                });
                tasks.push(task);
            }

            for task in tasks {
                let (id, fingerprint, vector) = task.await?;
                match self.accept(id, vector) {
                    Ok(record) => {
                        self.cache.insert(fingerprint, record.clone());
                        stats.embedded += 1;
                        records.push(record);
                    }
                    Err(err) => {
                        log::warn!("{err}");
                        stats.failed += 1;
                    }
                }
            }
        }

        Ok(records)
    }

    fn accept(
        &self,
        unit: UnitId,
        vector: docctx_vector_store::Result<Vec<f32>>,
    ) -> docctx_vector_store::Result<EmbeddingRecord> {
        let vector = vector.map_err(|err| VectorStoreError::EmbeddingUnavailable {
            unit: unit.clone(),
            reason: err.to_string(),
        })?;
        let expected = self.provider.dimension();
        if vector.len() != expected {
            return Err(VectorStoreError::EmbeddingUnavailable {
                unit,
                reason: format!("expected dimension {expected}, got {}", vector.len()),
            });
        }
        EmbeddingRecord::new(unit, vector)
    }
}

fn collect(files: Vec<ParsedFile>) -> (UnitStore, BTreeMap<String, Vec<RawReference>>) {
    let mut store = UnitStore::new();
    let mut references: BTreeMap<String, Vec<RawReference>> = BTreeMap::new();
    for file in files {
        for unit in file.units {
            if let Some(previous) = store.put(unit) {
                log::warn!("Duplicate unit {} (last definition wins)", previous.id);
            }
        }
        if !file.references.is_empty() {
            references
                .entry(file.file_path)
                .or_default()
                .extend(file.references);
        }
    }
    (store, references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docctx_units::{SourceSpan, UnitKind};
    use docctx_vector_store::HashingEmbedder;

    #[tokio::test]
    async fn test_precomputed_vectors_for_unknown_units_are_dropped() {
        let indexer =
            CodebaseIndexer::new(Arc::new(HashingEmbedder::new(4)), IndexerConfig::default())
                .unwrap();
        let file = ParsedFile::new("a.py").with_unit(StructuralUnit::new(
            "a.py",
            "f",
            UnitKind::Function,
            SourceSpan::new(1, 1, "def f(): pass"),
        ));

        let (index, stats) = indexer
            .build_precomputed(
                vec![file],
                vec![
                    (UnitId::from("a.py::f"), vec![1.0, 0.0]),
                    (UnitId::from("gone.py::g"), vec![0.0, 1.0]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(index.vectors.len(), 1);
        assert_eq!(stats.pruned, 1);
        assert_eq!(stats.failed, 0);
    }
}
