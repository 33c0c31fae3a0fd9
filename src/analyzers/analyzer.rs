use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::clean::{CleanedDataset, clean};
use crate::analyzers::ratios::{RecipeRatios, derive_all};
use crate::analyzers::types::{RunMeta, RunResult};
use crate::error::PipelineError;
use crate::ingest::{RawTable, parse_records};
use crate::source::{DataSource, SourceId};

/// Everything a run produced: the input table, the cleaned data, the
/// per-recipe ratios (index-aligned with `dataset.recipes`), and the result.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub table: RawTable,
    pub dataset: CleanedDataset,
    pub ratios: Vec<RecipeRatios>,
    pub result: RunResult,
}

/// Runs ingest → clean → derive → aggregate over bytes already in memory.
pub fn analyze_bytes(
    bytes: &[u8],
    source: SourceId,
    timestamp_utc: DateTime<Utc>,
) -> Result<Analysis, PipelineError> {
    let table = parse_records(bytes)?;
    let dataset = clean(&table)?;
    let ratios = derive_all(&dataset.recipes);

    let undefined = ratios
        .iter()
        .filter(|r| r.protein_to_carbs.is_undefined() || r.carbs_to_fat.is_undefined())
        .count();
    if undefined > 0 {
        warn!(records = undefined, "Some ratios are undefined (zero denominator)");
    }

    let meta = RunMeta {
        timestamp_utc,
        source,
        rows_processed: dataset.len(),
    };
    let result = aggregate(&dataset, meta);

    Ok(Analysis {
        table,
        dataset,
        ratios,
        result,
    })
}

/// Reads the source and analyzes it. A failed read aborts the run.
#[tracing::instrument(skip(source), fields(source = %source.id()))]
pub async fn analyze(source: &dyn DataSource) -> Result<Analysis, PipelineError> {
    let bytes = source.read_bytes().await?;
    let analysis = analyze_bytes(&bytes, source.id(), Utc::now())?;

    info!(
        rows = analysis.result.meta.rows_processed,
        diet_types = analysis.result.avg_macros_by_diet_type.len(),
        parse_failures = analysis.dataset.parse_failures.len(),
        "Analysis complete"
    );
    Ok(analysis)
}
