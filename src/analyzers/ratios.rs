//! Per-recipe macro ratios.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::analyzers::clean::Recipe;

/// Text written in place of a ratio that has no value.
pub const UNDEFINED_MARKER: &str = "undefined";

/// A quotient that is either a finite number or explicitly undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Defined(f64),
    Undefined,
}

impl Ratio {
    /// `numerator / denominator`; a zero denominator or non-finite result is `Undefined`.
    pub fn between(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            return Ratio::Undefined;
        }
        let value = numerator / denominator;
        if value.is_finite() {
            Ratio::Defined(value)
        } else {
            Ratio::Undefined
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Ratio::Undefined)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Defined(v) => write!(f, "{v}"),
            Ratio::Undefined => f.write_str(UNDEFINED_MARKER),
        }
    }
}

impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ratio::Defined(v) => serializer.serialize_f64(*v),
            Ratio::Undefined => serializer.serialize_str(UNDEFINED_MARKER),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecipeRatios {
    #[serde(rename = "Protein_to_Carbs_ratio")]
    pub protein_to_carbs: Ratio,
    #[serde(rename = "Carbs_to_Fat_ratio")]
    pub carbs_to_fat: Ratio,
}

pub fn derive(recipe: &Recipe) -> RecipeRatios {
    RecipeRatios {
        protein_to_carbs: Ratio::between(recipe.protein_g, recipe.carbs_g),
        carbs_to_fat: Ratio::between(recipe.carbs_g, recipe.fat_g),
    }
}

pub fn derive_all(recipes: &[Recipe]) -> Vec<RecipeRatios> {
    recipes.iter().map(derive).collect()
}
