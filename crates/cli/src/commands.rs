use crate::snapshot::Snapshot;
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use docctx_graph::TraversalDirection;
use docctx_search::{ContextAssembler, DocCtxConfig};
use docctx_units::UnitId;
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub struct ContextRequest<'a> {
    pub snapshot: &'a Path,
    pub target: &'a str,
    pub budget: Option<usize>,
    pub config: Option<&'a Path>,
    pub timeout: Option<Duration>,
    pub format: OutputFormat,
}

fn load_config(path: Option<&Path>) -> Result<DocCtxConfig> {
    match path {
        Some(path) => DocCtxConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(DocCtxConfig::default()),
    }
}

pub async fn context(request: ContextRequest<'_>) -> Result<String> {
    let config = load_config(request.config)?;
    let (index, _) = Snapshot::load(request.snapshot)
        .await?
        .index(config.indexer.clone())
        .await?;

    let budget = request.budget.unwrap_or(config.assembler.budget);
    if budget == 0 {
        bail!("budget must be > 0");
    }
    let assembler = ContextAssembler::new(index, config.assembler)?;
    let target = UnitId::from(request.target);

    let bundle = match request.timeout {
        Some(timeout) => assembler.assemble_within(&target, budget, timeout).await?,
        None => assembler.assemble(&target, budget)?,
    };

    match request.format {
        OutputFormat::Text => Ok(bundle.render()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&bundle)?),
    }
}

pub async fn neighbors(snapshot: &Path, target: &str, hops: usize) -> Result<String> {
    let (index, _) = Snapshot::load(snapshot)
        .await?
        .index(DocCtxConfig::default().indexer)
        .await?;
    let target = UnitId::from(target);
    if !index.units.contains(&target) {
        bail!("unit not found: {target}");
    }

    let outgoing = index
        .graph
        .neighbors(&target, TraversalDirection::Outgoing, &[]);
    let mut out = String::new();
    for reach in index.graph.expand(&target, hops) {
        let direction = if outgoing.contains(&reach.id) {
            "->"
        } else if reach.hops == 1 {
            "<-"
        } else {
            "~"
        };
        let _ = writeln!(out, "{}\t{direction}\t{}", reach.hops, reach.id);
    }
    Ok(out)
}

#[derive(Serialize)]
struct StatsReport {
    files: usize,
    units: usize,
    vectors: usize,
    dimension: Option<usize>,
    edges: usize,
    dangling_edges: usize,
    failed_embeddings: usize,
}

pub async fn stats(snapshot: &Path) -> Result<String> {
    let (index, stats) = Snapshot::load(snapshot)
        .await?
        .index(DocCtxConfig::default().indexer)
        .await?;

    let report = StatsReport {
        files: stats.files,
        units: index.units.len(),
        vectors: index.vectors.len(),
        dimension: index.vectors.dimension(),
        edges: index.graph.edge_count(),
        dangling_edges: stats.dangling_edges,
        failed_embeddings: stats.failed,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}
