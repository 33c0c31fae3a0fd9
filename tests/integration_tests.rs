use std::fs;
use std::path::PathBuf;

use diet_insights::analyzers::analyzer::{analyze, analyze_bytes};
use diet_insights::analyzers::ratios::Ratio;
use diet_insights::analyzers::types::{Macro, RunResult};
use diet_insights::error::PipelineError;
use diet_insights::output::{AVERAGES_FILE, EmitOptions, RESULTS_FILE, emit};
use diet_insights::source::{DataSource, LocalFile, SourceId};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/All_Diets_sample.csv")
}

#[tokio::test]
async fn test_full_pipeline() {
    let analysis = analyze(&LocalFile::new(fixture())).await.expect("analysis failed");
    let result = &analysis.result;

    assert_eq!(result.meta.rows_processed, 16);

    let diets: Vec<_> = result
        .avg_macros_by_diet_type
        .iter()
        .map(|a| a.diet_type.as_str())
        .collect();
    assert_eq!(diets, vec!["dash", "keto", "paleo", "vegan"]);
    assert_eq!(result.diet_type_with_highest_avg_protein.as_deref(), Some("paleo"));

    // Seitan Wrap has no protein value: filled with the mean of the other 15 rows.
    let seitan = &analysis.dataset.recipes[6];
    assert!((seitan.protein_g - 410.0 / 15.0).abs() < 1e-9);
    // Salmon Avocado carbs are "n/a".
    assert_eq!(analysis.dataset.parse_failures.len(), 1);
    assert!((analysis.dataset.recipes[8].carbs_g - 347.0 / 15.0).abs() < 1e-9);

    // Bacon and Eggs has zero fat.
    assert_eq!(analysis.ratios[7].carbs_to_fat, Ratio::Undefined);
}

#[tokio::test]
async fn test_top5_and_dominant_cuisine() {
    let analysis = analyze(&LocalFile::new(fixture())).await.unwrap();
    let result = &analysis.result;

    let dash: Vec<_> = result
        .top_for("dash")
        .map(|r| r.recipe_name.as_deref().unwrap())
        .collect();
    assert_eq!(
        dash,
        vec!["Baked Cod", "Turkey Meatballs", "Bean Chili", "Black Bean Burger", "Veggie Omelette"]
    );
    assert_eq!(result.top_for("keto").count(), 2);

    let cuisine = |diet: &str| {
        result
            .most_common_cuisine_by_diet_type
            .iter()
            .find(|c| c.diet_type == diet)
            .and_then(|c| c.most_common_cuisine.clone())
    };
    assert_eq!(cuisine("dash").as_deref(), Some("mediterranean"));
    assert_eq!(cuisine("paleo").as_deref(), Some("american"));
    // All four vegan cuisines appear once: the first one wins.
    assert_eq!(cuisine("vegan").as_deref(), Some("indian"));
}

#[tokio::test]
async fn test_emit_all_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("simulated_nosql");
    let analysis = analyze(&LocalFile::new(fixture())).await.unwrap();

    let opts = EmitOptions {
        output_dir: out.clone(),
        json: true,
        charts: true,
        export_processed: true,
        gzip: false,
    };
    let written = emit(&analysis, &opts).unwrap();
    assert_eq!(written.len(), 6);
    for path in &written {
        assert!(path.exists(), "{} missing", path.display());
    }

    let results: RunResult =
        serde_json::from_str(&fs::read_to_string(out.join(RESULTS_FILE)).unwrap()).unwrap();
    assert_eq!(results.meta.source, analysis.result.meta.source);
    assert_eq!(results.meta.rows_processed, 16);
    assert_eq!(
        results.most_common_cuisine_by_diet_type,
        analysis.result.most_common_cuisine_by_diet_type
    );
    assert_eq!(results.top5_protein_recipes_by_diet_type.len(), 5 + 2 + 3 + 4);

    let averages: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join(AVERAGES_FILE)).unwrap()).unwrap();
    assert_eq!(averages[2]["Diet_type"], "paleo");
    assert!(averages[2]["Protein(g)"].as_f64().unwrap() > 48.0);

    let processed = fs::read_to_string(out.join("All_Diets_sample_processed.csv")).unwrap();
    let bacon = processed.lines().find(|l| l.contains("Bacon and Eggs")).unwrap();
    assert!(bacon.ends_with(",12.5,undefined"));
}

#[tokio::test]
async fn test_missing_source_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("simulated_nosql");

    let source = LocalFile::new(dir.path().join("All_Diets.csv"));
    let err = analyze(&source).await.unwrap_err();
    assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
    assert!(!out.exists());
}

#[test]
fn test_missing_required_column_is_fatal() {
    let csv = "Diet_type,Recipe_name,Protein(g),Carbs(g),Fat(g)\nvegan,Tofu,10,5,2\n";
    let source = SourceId::File {
        path: "no_cuisine.csv".into(),
    };
    let err = analyze_bytes(csv.as_bytes(), source, chrono::Utc::now()).unwrap_err();
    assert!(matches!(err, PipelineError::MissingColumn(ref c) if c == "Cuisine_type"));
}

#[tokio::test]
async fn test_group_averages_match_member_means() {
    let analysis = analyze(&LocalFile::new(fixture())).await.unwrap();

    for avg in &analysis.result.avg_macros_by_diet_type {
        let members: Vec<_> = analysis
            .dataset
            .recipes
            .iter()
            .filter(|r| r.diet_type.as_deref() == Some(avg.diet_type.as_str()))
            .collect();
        for m in Macro::ALL {
            let expected = members.iter().map(|r| r.get(m)).sum::<f64>() / members.len() as f64;
            assert!((avg.get(m) - expected).abs() < 1e-9);
        }
    }

    assert_eq!(
        LocalFile::new(fixture()).id(),
        SourceId::File {
            path: fixture().display().to_string()
        }
    );
}

#[test]
fn test_na_tokens_in_categories_are_missing() {
    let csv = "\
Diet_type,Recipe_name,Cuisine_type,Protein(g),Carbs(g),Fat(g)
vegan,a,n/a,10,5,2
vegan,b,n/a,11,5,2
vegan,c,thai,12,5,2
 vegan ,d,thai,13,5,2
NaN,e,thai,14,5,2
";
    let source = SourceId::File {
        path: "na_tokens.csv".into(),
    };
    let result = analyze_bytes(csv.as_bytes(), source, chrono::Utc::now())
        .unwrap()
        .result;

    let diets: Vec<_> = result
        .avg_macros_by_diet_type
        .iter()
        .map(|a| a.diet_type.as_str())
        .collect();
    assert_eq!(diets, vec![" vegan ", "vegan"]);

    let vegan = result
        .most_common_cuisine_by_diet_type
        .iter()
        .find(|c| c.diet_type == "vegan")
        .unwrap();
    assert_eq!(vegan.most_common_cuisine.as_deref(), Some("thai"));
    assert_eq!(result.meta.rows_processed, 5);
}

#[test]
fn test_huge_values_serialize_as_numbers() {
    let csv = "\
Diet_type,Recipe_name,Cuisine_type,Protein(g),Carbs(g),Fat(g)
v,a,x,1e308,1,1
v,b,x,1e308,1,1
v,c,x,,1,1
";
    let source = SourceId::File {
        path: "huge.csv".into(),
    };
    let analysis = analyze_bytes(csv.as_bytes(), source, chrono::Utc::now()).unwrap();
    assert!(analysis.dataset.recipes.iter().all(|r| r.protein_g.is_finite()));

    let averages = serde_json::to_value(&analysis.result.avg_macros_by_diet_type).unwrap();
    assert_eq!(averages[0]["Protein(g)"].as_f64(), Some(1e308));
}
