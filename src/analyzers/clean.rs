//! Numeric coercion and mean imputation.
//!
//! Cleaning runs in two explicit phases:
//! 1. [`parse_macros`] coerces every macro cell, marking anything that does
//!    not parse as missing and recording a [`ParseFailure`] for non-blank junk.
//! 2. [`impute`] computes each column's mean over the parsed values of the
//!    whole dataset and fills every missing cell with it.
//!
//! A column with no parsed values at all falls back to a mean of `0.0`; the
//! [`ColumnImputation`] for it has `fallback_used` set.

use serde::Serialize;
use tracing::{debug, warn};

use crate::analyzers::types::Macro;
use crate::analyzers::utility::mean;
use crate::error::PipelineError;
use crate::ingest::{CUISINE_TYPE, DIET_TYPE, RECIPE_NAME, RawTable};

/// A cell that held text but could not be read as a finite number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseFailure {
    pub line: usize,
    pub column: &'static str,
    pub raw: String,
}

/// A record after phase one: macros are `None` where missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    pub line: usize,
    pub diet_type: Option<String>,
    pub recipe_name: Option<String>,
    pub cuisine_type: Option<String>,
    pub macros: [Option<f64>; 3],
}

#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub records: Vec<ParsedRecord>,
    pub failures: Vec<ParseFailure>,
}

/// A fully cleaned recipe. Macro values are always present.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub line: usize,
    pub diet_type: Option<String>,
    pub recipe_name: Option<String>,
    pub cuisine_type: Option<String>,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl Recipe {
    pub fn get(&self, m: Macro) -> f64 {
        match m {
            Macro::Protein => self.protein_g,
            Macro::Carbs => self.carbs_g,
            Macro::Fat => self.fat_g,
        }
    }
}

/// How one macro column was imputed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnImputation {
    pub column: &'static str,
    pub observed: usize,
    pub imputed: usize,
    pub mean: f64,
    pub fallback_used: bool,
}

/// The working dataset of a run.
#[derive(Debug, Clone, Default)]
pub struct CleanedDataset {
    pub recipes: Vec<Recipe>,
    pub imputation: Vec<ColumnImputation>,
    pub parse_failures: Vec<ParseFailure>,
}

impl CleanedDataset {
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn imputation_for(&self, m: Macro) -> Option<&ColumnImputation> {
        self.imputation.iter().find(|c| c.column == m.column())
    }
}

/// Outcome of coercing one macro cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Value(f64),
    Blank,
    Invalid,
}

pub fn parse_cell(raw: Option<&str>) -> Cell {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else {
        return Cell::Blank;
    };
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Value(v),
        _ => Cell::Invalid,
    }
}

/// Phase one: coerce macro cells and pull out the categorical fields.
pub fn parse_macros(table: &RawTable) -> Result<ParsedTable, PipelineError> {
    let diet_idx = table.require_column(DIET_TYPE)?;
    let recipe_idx = table.require_column(RECIPE_NAME)?;
    let cuisine_idx = table.require_column(CUISINE_TYPE)?;
    let mut macro_idx = [0usize; 3];
    for m in Macro::ALL {
        macro_idx[m.index()] = table.require_column(m.column())?;
    }

    let mut parsed = ParsedTable {
        records: Vec::with_capacity(table.len()),
        failures: Vec::new(),
    };

    for row in table.rows() {
        let mut macros = [None; 3];
        for m in Macro::ALL {
            let raw = table.cell(row, macro_idx[m.index()]);
            match parse_cell(raw) {
                Cell::Value(v) => macros[m.index()] = Some(v),
                Cell::Blank => {}
                Cell::Invalid => parsed.failures.push(ParseFailure {
                    line: row.line,
                    column: m.column(),
                    raw: raw.unwrap_or_default().to_string(),
                }),
            }
        }

        parsed.records.push(ParsedRecord {
            line: row.line,
            diet_type: table.category(row, diet_idx).map(str::to_string),
            recipe_name: table.category(row, recipe_idx).map(str::to_string),
            cuisine_type: table.category(row, cuisine_idx).map(str::to_string),
            macros,
        });
    }

    if !parsed.failures.is_empty() {
        warn!(
            failures = parsed.failures.len(),
            "Some macro cells could not be parsed and will be imputed"
        );
    }

    Ok(parsed)
}

/// Phase two: replace every missing macro with its column mean.
pub fn impute(parsed: ParsedTable) -> CleanedDataset {
    let mut means = [0.0f64; 3];
    let mut imputation = Vec::with_capacity(3);

    for m in Macro::ALL {
        let observed: Vec<f64> = parsed
            .records
            .iter()
            .filter_map(|r| r.macros[m.index()])
            .collect();
        let imputed = parsed.records.len() - observed.len();
        let fallback_used = observed.is_empty();
        let column_mean = mean(&observed);

        if fallback_used && imputed > 0 {
            warn!(column = m.column(), "Column has no numeric values; imputing 0.0");
        }
        debug!(column = m.column(), observed = observed.len(), imputed, mean = column_mean, "Column imputed");

        means[m.index()] = column_mean;
        imputation.push(ColumnImputation {
            column: m.column(),
            observed: observed.len(),
            imputed,
            mean: column_mean,
            fallback_used,
        });
    }

    let recipes = parsed
        .records
        .into_iter()
        .map(|r| {
            let fill = |m: Macro| r.macros[m.index()].unwrap_or(means[m.index()]);
            Recipe {
                line: r.line,
                protein_g: fill(Macro::Protein),
                carbs_g: fill(Macro::Carbs),
                fat_g: fill(Macro::Fat),
                diet_type: r.diet_type,
                recipe_name: r.recipe_name,
                cuisine_type: r.cuisine_type,
            }
        })
        .collect();

    CleanedDataset {
        recipes,
        imputation,
        parse_failures: parsed.failures,
    }
}

/// Both phases in sequence.
pub fn clean(table: &RawTable) -> Result<CleanedDataset, PipelineError> {
    Ok(impute(parse_macros(table)?))
}
