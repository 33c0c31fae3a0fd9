//! Delimited-text ingestion.
//!
//! Turns raw bytes with a header row into a [`RawTable`]. Only tokenizing
//! happens here; numeric coercion is left to cleaning so that short rows and
//! junk cells never fail a run at this stage.

use std::collections::HashMap;

use csv::StringRecord;
use tracing::debug;

use crate::error::PipelineError;

pub const DIET_TYPE: &str = "Diet_type";
pub const RECIPE_NAME: &str = "Recipe_name";
pub const CUISINE_TYPE: &str = "Cuisine_type";
pub const PROTEIN: &str = "Protein(g)";
pub const CARBS: &str = "Carbs(g)";
pub const FAT: &str = "Fat(g)";

/// Tokens read as a missing value in text columns, besides the empty string.
/// Matched exactly: no trimming, no case folding.
pub const NA_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_na_token(value: &str) -> bool {
    NA_TOKENS.contains(&value)
}

/// One data row together with its 1-based line number in the source.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub line: usize,
    pub record: StringRecord,
}

/// Header plus rows, with column names kept exactly as declared.
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<RawRow>,
}

impl RawTable {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Like [`RawTable::column_index`] but fails with `MissingColumn`.
    pub fn require_column(&self, name: &str) -> Result<usize, PipelineError> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
    }

    /// Returns the cell at `column`, or `None` if the row is short or the cell is blank.
    pub fn cell<'a>(&self, row: &'a RawRow, column: usize) -> Option<&'a str> {
        row.record
            .get(column)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Categorical cell, verbatim. `None` if the row is short, the cell is
    /// empty, or it holds one of [`NA_TOKENS`]. Surrounding whitespace is kept,
    /// so `" vegan "` and `"vegan"` stay distinct values.
    pub fn category<'a>(&self, row: &'a RawRow, column: usize) -> Option<&'a str> {
        row.record
            .get(column)
            .filter(|value| !value.is_empty() && !is_na_token(value))
    }
}

/// Parses delimited text with a header row.
pub fn parse_records(bytes: &[u8]) -> Result<RawTable, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::MalformedInput {
            line: 1,
            message: e.to_string(),
        })?
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            if idx == 0 {
                name.trim_start_matches('\u{feff}').to_string()
            } else {
                name.to_string()
            }
        })
        .collect();

    // First declaration wins when a header name is repeated.
    let mut index = HashMap::with_capacity(headers.len());
    for (idx, name) in headers.iter().enumerate() {
        index.entry(name.clone()).or_insert(idx);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| PipelineError::MalformedInput {
            line: e.position().map(|p| p.line() as usize).unwrap_or(0),
            message: e.to_string(),
        })?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 2);
        rows.push(RawRow { line, record });
    }

    debug!(columns = headers.len(), rows = rows.len(), "Parsed delimited input");

    Ok(RawTable {
        headers,
        index,
        rows,
    })
}
