//! Nutrition aggregation pipeline.
//!
//! Raw rows are cleaned (numeric coercion, then mean imputation), ratios are
//! derived per recipe, and the cleaned recipes are grouped by diet type into
//! a single [`types::RunResult`].

pub mod aggregate;
pub mod analyzer;
pub mod clean;
pub mod publish;
pub mod ratios;
pub mod types;
pub mod utility;
