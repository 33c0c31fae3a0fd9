//! Data types used by the aggregation pipeline.
//!
//! Output records use the dataset's own column names as JSON keys so the
//! documents line up with the input file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::{CARBS, FAT, PROTEIN};
use crate::source::SourceId;

/// One of the three macronutrient columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Macro {
    Protein,
    Carbs,
    Fat,
}

impl Macro {
    pub const ALL: [Macro; 3] = [Macro::Protein, Macro::Carbs, Macro::Fat];

    /// Header name of the column in the input.
    pub fn column(self) -> &'static str {
        match self {
            Macro::Protein => PROTEIN,
            Macro::Carbs => CARBS,
            Macro::Fat => FAT,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Macro::Protein => 0,
            Macro::Carbs => 1,
            Macro::Fat => 2,
        }
    }
}

/// Run metadata: when, from where, and how many rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub timestamp_utc: DateTime<Utc>,
    pub source: SourceId,
    pub rows_processed: usize,
}

/// Mean macro content for one diet type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroAverages {
    #[serde(rename = "Diet_type")]
    pub diet_type: String,
    #[serde(rename = "Protein(g)")]
    pub protein_g: f64,
    #[serde(rename = "Carbs(g)")]
    pub carbs_g: f64,
    #[serde(rename = "Fat(g)")]
    pub fat_g: f64,
}

impl MacroAverages {
    pub fn get(&self, m: Macro) -> f64 {
        match m {
            Macro::Protein => self.protein_g,
            Macro::Carbs => self.carbs_g,
            Macro::Fat => self.fat_g,
        }
    }
}

/// A recipe selected into a diet type's top-N by protein.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRecipe {
    #[serde(rename = "Diet_type")]
    pub diet_type: String,
    #[serde(rename = "Recipe_name")]
    pub recipe_name: Option<String>,
    #[serde(rename = "Cuisine_type")]
    pub cuisine_type: Option<String>,
    #[serde(rename = "Protein(g)")]
    pub protein_g: f64,
    #[serde(rename = "Carbs(g)")]
    pub carbs_g: f64,
    #[serde(rename = "Fat(g)")]
    pub fat_g: f64,
}

/// Most frequent cuisine for one diet type. `None` when the group has no cuisine values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantCuisine {
    #[serde(rename = "Diet_type")]
    pub diet_type: String,
    #[serde(rename = "Most_common_cuisine")]
    pub most_common_cuisine: Option<String>,
}

/// Complete result of one run, serialized as `results.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub meta: RunMeta,
    pub avg_macros_by_diet_type: Vec<MacroAverages>,
    pub top5_protein_recipes_by_diet_type: Vec<TopRecipe>,
    pub diet_type_with_highest_avg_protein: Option<String>,
    pub most_common_cuisine_by_diet_type: Vec<DominantCuisine>,
}

impl RunResult {
    /// Top-N entries for a single diet type, in ranking order.
    pub fn top_for<'a>(&'a self, diet_type: &'a str) -> impl Iterator<Item = &'a TopRecipe> + 'a {
        self.top5_protein_recipes_by_diet_type
            .iter()
            .filter(move |r| r.diet_type == diet_type)
    }
}
