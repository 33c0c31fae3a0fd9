//! Output formatting and persistence for run results.
//!
//! Supports a plain-text report, JSON documents, and a CSV export of the
//! processed dataset. Files are only written once the analysis has finished.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::analyzer::Analysis;
use crate::analyzers::clean::CleanedDataset;
use crate::analyzers::ratios::RecipeRatios;
use crate::analyzers::types::{Macro, RunResult};
use crate::charts;
use crate::error::PipelineError;
use crate::ingest::RawTable;

pub const RESULTS_FILE: &str = "results.json";
pub const AVERAGES_FILE: &str = "avg_macros.json";
const PROTEIN_TO_CARBS: &str = "Protein_to_Carbs_ratio";
const CARBS_TO_FAT: &str = "Carbs_to_Fat_ratio";

/// Which artifacts to write, and where.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub output_dir: PathBuf,
    pub json: bool,
    pub charts: bool,
    pub export_processed: bool,
    pub gzip: bool,
}

/// Logs the run result using Rust's debug pretty-print format.
pub fn print_pretty(result: &RunResult) {
    debug!("{:#?}", result);
}

/// Renders the human-readable report printed after a run.
pub fn render_report(analysis: &Analysis) -> String {
    let result = &analysis.result;
    let mut out = String::new();

    let _ = writeln!(out, "Source: {} ({} rows)", result.meta.source, result.meta.rows_processed);
    for col in &analysis.dataset.imputation {
        if col.imputed > 0 {
            let _ = writeln!(
                out,
                "  {}: {} missing value(s) filled with {:.4}{}",
                col.column,
                col.imputed,
                col.mean,
                if col.fallback_used { " (no numeric values; fallback)" } else { "" }
            );
        }
    }

    let _ = writeln!(out, "\nAverage macronutrient content by diet type:");
    let width = result
        .avg_macros_by_diet_type
        .iter()
        .map(|a| a.diet_type.len())
        .max()
        .unwrap_or(0)
        .max("Diet_type".len());
    let _ = write!(out, "{:<width$}", "Diet_type");
    for m in Macro::ALL {
        let _ = write!(out, " {:>12}", m.column());
    }
    out.push('\n');
    for avg in &result.avg_macros_by_diet_type {
        let _ = write!(out, "{:<width$}", avg.diet_type);
        for m in Macro::ALL {
            let _ = write!(out, " {:>12.4}", avg.get(m));
        }
        out.push('\n');
    }

    let _ = writeln!(out, "\nTop 5 protein-rich recipes for each diet type:");
    for avg in &result.avg_macros_by_diet_type {
        let _ = writeln!(out, "\nDiet: {}", avg.diet_type);
        for r in result.top_for(&avg.diet_type) {
            let _ = writeln!(
                out,
                "  {:<40} {:>10.2}  {}",
                r.recipe_name.as_deref().unwrap_or("-"),
                r.protein_g,
                r.cuisine_type.as_deref().unwrap_or("-")
            );
        }
    }

    let _ = writeln!(
        out,
        "\nDiet type with the highest average protein: {}",
        result.diet_type_with_highest_avg_protein.as_deref().unwrap_or("none")
    );

    let _ = writeln!(out, "\nMost common cuisine for each diet type:");
    for c in &result.most_common_cuisine_by_diet_type {
        let _ = writeln!(
            out,
            "  {:<width$} {}",
            c.diet_type,
            c.most_common_cuisine.as_deref().unwrap_or("-")
        );
    }

    out
}

/// Writes pretty JSON to `path` via a temporary sibling and a rename.
pub fn write_json_atomic(path: &Path, value: &impl Serialize) -> Result<(), PipelineError> {
    let sink = |e: &dyn std::fmt::Display| PipelineError::sink(path.display(), e);

    let json = serde_json::to_string_pretty(value).map_err(|e| sink(&e))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json).map_err(|e| sink(&e))?;
    fs::rename(&tmp_path, path).map_err(|e| sink(&e))?;
    Ok(())
}

/// Writes `results.json` and `avg_macros.json` into `dir`, creating it if needed.
pub fn write_results(dir: &Path, result: &RunResult) -> Result<Vec<PathBuf>, PipelineError> {
    ensure_dir(dir)?;

    let results_path = dir.join(RESULTS_FILE);
    write_json_atomic(&results_path, result)?;

    let averages_path = dir.join(AVERAGES_FILE);
    write_json_atomic(&averages_path, &result.avg_macros_by_diet_type)?;

    Ok(vec![results_path, averages_path])
}

/// Writes the cleaned dataset with every original column plus the two ratio columns.
pub fn export_processed(
    path: &Path,
    table: &RawTable,
    dataset: &CleanedDataset,
    ratios: &[RecipeRatios],
    gzip: bool,
) -> Result<(), PipelineError> {
    let sink = |e: &dyn std::fmt::Display| PipelineError::sink(path.display(), e);
    let file = File::create(path).map_err(|e| sink(&e))?;

    if gzip {
        let mut encoder = GzEncoder::new(file, Compression::default());
        write_processed(&mut encoder, table, dataset, ratios).map_err(|e| sink(&e))?;
        encoder.finish().map_err(|e| sink(&e))?;
    } else {
        write_processed(file, table, dataset, ratios).map_err(|e| sink(&e))?;
    }

    debug!(path = %path.display(), rows = dataset.len(), gzip, "Processed dataset exported");
    Ok(())
}

fn write_processed<W: Write>(
    writer: W,
    table: &RawTable,
    dataset: &CleanedDataset,
    ratios: &[RecipeRatios],
) -> csv::Result<()> {
    let macro_columns: Vec<(usize, Macro)> = Macro::ALL
        .into_iter()
        .filter_map(|m| table.column_index(m.column()).map(|idx| (idx, m)))
        .collect();

    let mut writer = WriterBuilder::new().flexible(true).from_writer(writer);

    let mut header: Vec<&str> = table.headers().iter().map(String::as_str).collect();
    header.extend([PROTEIN_TO_CARBS, CARBS_TO_FAT]);
    writer.write_record(&header)?;

    for ((row, recipe), ratio) in table.rows().iter().zip(&dataset.recipes).zip(ratios) {
        let mut cells: Vec<String> = (0..table.headers().len())
            .map(|idx| match macro_columns.iter().find(|(c, _)| *c == idx) {
                Some((_, m)) => recipe.get(*m).to_string(),
                None => row.record.get(idx).unwrap_or_default().to_string(),
            })
            .collect();
        cells.push(ratio.protein_to_carbs.to_string());
        cells.push(ratio.carbs_to_fat.to_string());
        writer.write_record(&cells)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes every artifact requested in `opts` and returns the paths written.
///
/// A failure stops at that artifact; files already written stay in place.
#[tracing::instrument(skip(analysis, opts), fields(output_dir = %opts.output_dir.display()))]
pub fn emit(analysis: &Analysis, opts: &EmitOptions) -> Result<Vec<PathBuf>, PipelineError> {
    let mut written = Vec::new();

    if opts.json {
        written.extend(write_results(&opts.output_dir, &analysis.result)?);
    }

    if opts.charts {
        ensure_dir(&opts.output_dir)?;
        written.extend(charts::render_all(&analysis.result, &opts.output_dir)?);
    }

    if opts.export_processed {
        ensure_dir(&opts.output_dir)?;
        let mut name = analysis.result.meta.source.processed_file_name();
        if opts.gzip {
            name.push_str(".gz");
        }
        let path = opts.output_dir.join(name);
        export_processed(&path, &analysis.table, &analysis.dataset, &analysis.ratios, opts.gzip)?;
        written.push(path);
    }

    info!(artifacts = written.len(), "Artifacts written");
    Ok(written)
}

fn ensure_dir(dir: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(dir).map_err(|e| PipelineError::sink(dir.display(), e))
}
