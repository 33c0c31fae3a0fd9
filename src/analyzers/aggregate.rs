//! Grouping by diet type and the per-group statistics of a run.

use std::collections::BTreeMap;

use crate::analyzers::clean::{CleanedDataset, Recipe};
use crate::analyzers::types::{DominantCuisine, Macro, MacroAverages, RunMeta, RunResult, TopRecipe};
use crate::analyzers::utility::mean_of;

/// Number of recipes kept per diet type in the protein ranking.
pub const TOP_N: usize = 5;

/// Recipes sharing a diet type, in dataset order.
#[derive(Debug, Clone)]
pub struct DietGroup<'a> {
    pub diet_type: &'a str,
    pub members: Vec<&'a Recipe>,
}

/// Partitions recipes by diet type.
///
/// Groups come out sorted by diet type; recipes without a diet type belong to
/// no group. Within a group, members keep their dataset order, which is what
/// every tie-break below relies on.
pub fn group_by_diet(recipes: &[Recipe]) -> Vec<DietGroup<'_>> {
    let mut groups: BTreeMap<&str, Vec<&Recipe>> = BTreeMap::new();
    for recipe in recipes {
        if let Some(diet_type) = recipe.diet_type.as_deref() {
            groups.entry(diet_type).or_default().push(recipe);
        }
    }
    groups
        .into_iter()
        .map(|(diet_type, members)| DietGroup { diet_type, members })
        .collect()
}

pub fn average_macros(group: &DietGroup<'_>) -> MacroAverages {
    let avg = |m: Macro| mean_of(group.members.iter().map(|r| r.get(m)));
    MacroAverages {
        diet_type: group.diet_type.to_string(),
        protein_g: avg(Macro::Protein),
        carbs_g: avg(Macro::Carbs),
        fat_g: avg(Macro::Fat),
    }
}

/// Highest-protein members, descending; equal protein keeps dataset order.
pub fn top_by_protein(group: &DietGroup<'_>, n: usize) -> Vec<TopRecipe> {
    let mut ranked = group.members.clone();
    // sort_by is stable
    ranked.sort_by(|a, b| b.protein_g.total_cmp(&a.protein_g));
    ranked
        .into_iter()
        .take(n)
        .map(|r| TopRecipe {
            diet_type: group.diet_type.to_string(),
            recipe_name: r.recipe_name.clone(),
            cuisine_type: r.cuisine_type.clone(),
            protein_g: r.protein_g,
            carbs_g: r.carbs_g,
            fat_g: r.fat_g,
        })
        .collect()
}

/// Most frequent cuisine; on a tie the one seen first wins.
pub fn dominant_cuisine(group: &DietGroup<'_>) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for cuisine in group.members.iter().filter_map(|r| r.cuisine_type.as_deref()) {
        match counts.iter_mut().find(|(c, _)| *c == cuisine) {
            Some((_, n)) => *n += 1,
            None => counts.push((cuisine, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (cuisine, n) in counts {
        if best.is_none_or(|(_, top)| n > top) {
            best = Some((cuisine, n));
        }
    }
    best.map(|(cuisine, _)| cuisine.to_string())
}

/// Diet type with the largest mean protein; ties go to the earlier entry.
pub fn highest_avg_protein(averages: &[MacroAverages]) -> Option<String> {
    let mut best: Option<&MacroAverages> = None;
    for avg in averages {
        if best.is_none_or(|b| avg.protein_g > b.protein_g) {
            best = Some(avg);
        }
    }
    best.map(|b| b.diet_type.clone())
}

/// Builds the [`RunResult`] for a cleaned dataset.
pub fn aggregate(dataset: &CleanedDataset, meta: RunMeta) -> RunResult {
    let groups = group_by_diet(&dataset.recipes);

    let averages: Vec<MacroAverages> = groups.iter().map(average_macros).collect();
    let top = groups
        .iter()
        .flat_map(|g| top_by_protein(g, TOP_N))
        .collect();
    let cuisines = groups
        .iter()
        .map(|g| DominantCuisine {
            diet_type: g.diet_type.to_string(),
            most_common_cuisine: dominant_cuisine(g),
        })
        .collect();
    let highest = highest_avg_protein(&averages);

    RunResult {
        meta,
        avg_macros_by_diet_type: averages,
        top5_protein_recipes_by_diet_type: top,
        diet_type_with_highest_avg_protein: highest,
        most_common_cuisine_by_diet_type: cuisines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceId;
    use chrono::Utc;

    fn recipe(diet: &str, name: &str, cuisine: Option<&str>, protein_g: f64) -> Recipe {
        Recipe {
            line: 0,
            diet_type: Some(diet.to_string()),
            recipe_name: Some(name.to_string()),
            cuisine_type: cuisine.map(str::to_string),
            protein_g,
            carbs_g: 10.0,
            fat_g: 5.0,
        }
    }

    fn meta() -> RunMeta {
        RunMeta {
            timestamp_utc: Utc::now(),
            source: SourceId::File {
                path: "All_Diets.csv".into(),
            },
            rows_processed: 0,
        }
    }

    #[test]
    fn test_groups_sorted_and_untyped_rows_skipped() {
        let mut untyped = recipe("x", "nameless", None, 1.0);
        untyped.diet_type = None;
        let recipes = vec![
            recipe("vegan", "a", None, 1.0),
            untyped,
            recipe("keto", "b", None, 2.0),
            recipe("vegan", "c", None, 3.0),
        ];
        let groups = group_by_diet(&recipes);
        let names: Vec<_> = groups.iter().map(|g| g.diet_type).collect();
        assert_eq!(names, vec!["keto", "vegan"]);
        assert_eq!(groups[1].members.len(), 2);
    }

    #[test]
    fn test_top_by_protein_is_stable_on_ties() {
        let recipes = vec![
            recipe("paleo", "first", None, 10.0),
            recipe("paleo", "big", None, 50.0),
            recipe("paleo", "second", None, 10.0),
        ];
        let groups = group_by_diet(&recipes);
        let top = top_by_protein(&groups[0], TOP_N);
        let names: Vec<_> = top.iter().map(|r| r.recipe_name.as_deref().unwrap()).collect();
        assert_eq!(names, vec!["big", "first", "second"]);
    }

    #[test]
    fn test_top_by_protein_truncates() {
        let recipes: Vec<_> = (0..8)
            .map(|i| recipe("dash", &format!("r{i}"), None, i as f64))
            .collect();
        let groups = group_by_diet(&recipes);
        let top = top_by_protein(&groups[0], TOP_N);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].protein_g, 7.0);
        assert_eq!(top[4].protein_g, 3.0);
    }

    #[test]
    fn test_small_group_is_not_padded() {
        let recipes = vec![
            recipe("mediterranean", "a", None, 1.0),
            recipe("mediterranean", "b", None, 2.0),
        ];
        let groups = group_by_diet(&recipes);
        assert_eq!(top_by_protein(&groups[0], TOP_N).len(), 2);
    }

    #[test]
    fn test_dominant_cuisine_tie_goes_to_first_seen() {
        let recipes = vec![
            recipe("vegan", "a", Some("indian"), 1.0),
            recipe("vegan", "b", Some("italian"), 1.0),
            recipe("vegan", "c", Some("italian"), 1.0),
            recipe("vegan", "d", Some("indian"), 1.0),
        ];
        let groups = group_by_diet(&recipes);
        assert_eq!(dominant_cuisine(&groups[0]).as_deref(), Some("indian"));
    }

    #[test]
    fn test_dominant_cuisine_ignores_missing_values() {
        let recipes = vec![
            recipe("vegan", "a", None, 1.0),
            recipe("vegan", "b", None, 1.0),
            recipe("vegan", "c", Some("thai"), 1.0),
        ];
        let groups = group_by_diet(&recipes);
        assert_eq!(dominant_cuisine(&groups[0]).as_deref(), Some("thai"));

        let only_missing = vec![recipe("keto", "a", None, 1.0)];
        let groups = group_by_diet(&only_missing);
        assert_eq!(dominant_cuisine(&groups[0]), None);
    }

    #[test]
    fn test_highest_avg_protein_tie_and_empty() {
        let avg = |diet: &str, protein_g: f64| MacroAverages {
            diet_type: diet.into(),
            protein_g,
            carbs_g: 0.0,
            fat_g: 0.0,
        };
        assert_eq!(
            highest_avg_protein(&[avg("dash", 20.0), avg("keto", 20.0), avg("paleo", 5.0)]).as_deref(),
            Some("dash")
        );
        assert_eq!(highest_avg_protein(&[]), None);
    }

    #[test]
    fn test_aggregate_vegan_keto_scenario() {
        let recipes = vec![
            recipe("Vegan", "a", Some("asian"), 10.0),
            recipe("Vegan", "b", Some("asian"), 20.0),
            recipe("Keto", "c", Some("french"), 5.0),
        ];
        let dataset = CleanedDataset {
            recipes,
            ..Default::default()
        };
        let result = aggregate(&dataset, meta());

        let vegan = result
            .avg_macros_by_diet_type
            .iter()
            .find(|a| a.diet_type == "Vegan")
            .unwrap();
        assert_eq!(vegan.protein_g, 15.0);
        assert_eq!(result.diet_type_with_highest_avg_protein.as_deref(), Some("Vegan"));
        assert_eq!(result.top_for("Vegan").count(), 2);
        assert_eq!(result.top_for("Keto").count(), 1);
    }

    #[test]
    fn test_aggregate_empty_dataset() {
        let result = aggregate(&CleanedDataset::default(), meta());
        assert!(result.avg_macros_by_diet_type.is_empty());
        assert!(result.top5_protein_recipes_by_diet_type.is_empty());
        assert_eq!(result.diet_type_with_highest_avg_protein, None);
    }
}
