use crate::config::AssemblerConfig;
use crate::context_pack::{
    BundleItem, ContextBundle, ContextBundleBudget, ContextCandidate, Provenance,
    CONTEXT_BUNDLE_VERSION,
};
use crate::error::{Result, SearchError};
use crate::filter::{ExcludeRules, UnitFilter};
use crate::fusion::structural_score;
use crate::packer::pack;
use docctx_indexer::CodebaseIndex;
use docctx_units::{SizeMeasure, StructuralUnit, UnitId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// Selects and ranks supporting context for a target unit.
///
/// Read-only over the index; cheap to clone and safe to call from many
/// requests at once.
#[derive(Clone)]
pub struct ContextAssembler {
    index: CodebaseIndex,
    config: AssemblerConfig,
    rules: Arc<ExcludeRules>,
    filter: Option<Arc<dyn UnitFilter>>,
    measure: Arc<dyn SizeMeasure>,
    mean_cost: usize,
}

impl ContextAssembler {
    pub fn new(index: CodebaseIndex, config: AssemblerConfig) -> Result<Self> {
        config.validate()?;
        let rules = Arc::new(ExcludeRules::from_config(&config)?);
        let measure = config.size_measure.build();
        let mean_cost = mean_cost(&index, measure.as_ref());
        Ok(Self {
            index,
            config,
            rules,
            filter: None,
            measure,
            mean_cost,
        })
    }

    /// Add a caller predicate on top of the configured exclusions
    #[must_use]
    pub fn with_filter(mut self, filter: impl UnitFilter + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Replace the configured size measure
    #[must_use]
    pub fn with_measure(mut self, measure: impl SizeMeasure + 'static) -> Self {
        self.measure = Arc::new(measure);
        self.mean_cost = mean_cost(&self.index, self.measure.as_ref());
        self
    }

    #[must_use]
    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    #[must_use]
    pub fn index(&self) -> &CodebaseIndex {
        &self.index
    }

    /// Merged, filtered and sorted candidates for the configured budget
    pub fn rank(&self, target: &UnitId) -> Result<Vec<ContextCandidate>> {
        self.rank_for_budget(target, self.config.budget)
    }

    pub fn assemble_default(&self, target: &UnitId) -> Result<ContextBundle> {
        self.assemble(target, self.config.budget)
    }

    /// Build the context bundle for `target` within `budget`
    pub fn assemble(&self, target: &UnitId, budget: usize) -> Result<ContextBundle> {
        let ranked = self.rank_for_budget(target, budget)?;
        let candidates = ranked.len();

        let costed: Vec<(ContextCandidate, &StructuralUnit, usize)> = ranked
            .into_iter()
            .filter_map(|candidate| {
                let unit = self.index.units.get(&candidate.unit_id).ok()?;
                let cost = self.cost(unit);
                Some((candidate, unit, cost))
            })
            .collect();
        let outcome = pack(costed, budget, |(_, _, cost)| *cost);

        let items: Vec<BundleItem> = outcome
            .selected
            .into_iter()
            .map(|(candidate, unit, cost)| BundleItem {
                id: candidate.unit_id,
                kind: unit.kind,
                qualified_name: unit.qualified_name.clone(),
                file: unit.file_path.clone(),
                start_line: unit.span.start_line,
                end_line: unit.span.end_line,
                score: candidate.score,
                provenance: candidate.provenance,
                hops: candidate.hops,
                cost,
                content: unit.text().to_string(),
            })
            .collect();

        log::debug!(
            "Assembled {} of {candidates} candidates for {target} ({}/{budget}, {} skipped, {} oversized)",
            items.len(),
            outcome.used,
            outcome.skipped,
            outcome.oversized
        );

        Ok(ContextBundle {
            version: CONTEXT_BUNDLE_VERSION,
            target: target.clone(),
            items,
            budget: ContextBundleBudget {
                max_cost: budget,
                used_cost: outcome.used,
                skipped_items: outcome.skipped,
                oversized_items: outcome.oversized,
            },
        })
    }

    /// `assemble` on a blocking task, abandoned after `timeout`
    pub async fn assemble_within(
        &self,
        target: &UnitId,
        budget: usize,
        timeout: Duration,
    ) -> Result<ContextBundle> {
        let assembler = self.clone();
        let owned_target = target.clone();
        let task =
            tokio::task::spawn_blocking(move || assembler.assemble(&owned_target, budget));

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => {
                log::warn!("Context assembly for {target} timed out after {timeout:?}");
                Err(SearchError::Timeout(timeout))
            }
        }
    }

    fn rank_for_budget(&self, target: &UnitId, budget: usize) -> Result<Vec<ContextCandidate>> {
        self.index.units.get(target)?;

        let semantic = self.semantic_candidates(target, budget)?;
        let structural: HashMap<UnitId, usize> = self
            .index
            .graph
            .expand(target, self.config.max_hops)
            .into_iter()
            .map(|reach| (reach.id, reach.hops))
            .collect();

        let ids: BTreeSet<&UnitId> = semantic.keys().chain(structural.keys()).collect();
        let mut ranked = Vec::with_capacity(ids.len());
        for id in ids {
            if id == target {
                continue;
            }
            let Ok(unit) = self.index.units.get(id) else {
                log::debug!("Skipping {id}: not in the unit store");
                continue;
            };
            if !self.accepts(unit) {
                continue;
            }

            let semantic_score = semantic.get(id).copied();
            let hops = structural.get(id).copied();
            let provenance = match (semantic_score, hops) {
                (Some(_), Some(_)) => Provenance::Both,
                (Some(_), None) => Provenance::Semantic,
                _ => Provenance::Structural,
            };
            let score = self.config.merge.combine(
                semantic_score,
                hops.map(|h| structural_score(self.config.structural_decay, h)),
            );

            ranked.push(ContextCandidate {
                unit_id: id.clone(),
                score,
                provenance,
                semantic_score,
                hops,
            });
        }

        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.unit_id.cmp(&b.unit_id))
        });
        Ok(ranked)
    }

    fn semantic_candidates(&self, target: &UnitId, budget: usize) -> Result<HashMap<UnitId, f32>> {
        let Some(vector) = self.index.vectors.vector_of(target) else {
            log::debug!("No embedding for {target}; using structural candidates only");
            return Ok(HashMap::new());
        };

        let slots = budget.div_ceil(self.mean_cost.max(1)).max(1);
        // +1: the target itself is its own best match
        let k = slots
            .saturating_mul(self.config.overfetch_multiplier)
            .saturating_add(1);
        let hits = self
            .index
            .vectors
            .query(&vector, k, self.config.relevance_floor)?;

        Ok(hits.into_iter().map(|hit| (hit.unit_id, hit.score)).collect())
    }

    fn accepts(&self, unit: &StructuralUnit) -> bool {
        self.rules.accepts(unit) && self.filter.as_ref().map_or(true, |f| f.accepts(unit))
    }

    fn cost(&self, unit: &StructuralUnit) -> usize {
        self.measure.cost(unit).max(1)
    }
}

fn mean_cost(index: &CodebaseIndex, measure: &dyn SizeMeasure) -> usize {
    let units = index.units.len();
    if units == 0 {
        return 1;
    }
    let total: usize = index.units.iter().map(|u| measure.cost(u).max(1)).sum();
    total.div_ceil(units)
}
