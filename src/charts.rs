//! PNG charts derived from a [`RunResult`].
//!
//! Charts are drawn with the plotters bitmap backend. Text is rendered with
//! an embedded DejaVu Sans face through `ab_glyph`, so no system font
//! libraries are needed.
//!
//! - bar chart: one cluster per diet type, one bar per macro
//!   (protein blue, carbs orange, fat green), with a macro legend
//! - heatmap: rows are diet types, columns are macros, darker is larger;
//!   every cell is annotated with its average
//! - scatter: top-5 recipes by protein, one column per diet type,
//!   colour per cuisine with a cuisine legend

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::{debug, warn};

use crate::analyzers::types::{Macro, MacroAverages, RunResult, TopRecipe};
use crate::error::PipelineError;

pub const BAR_CHART_FILE: &str = "avg_macronutrients_by_diet_type.png";
pub const HEATMAP_FILE: &str = "heatmap_macronutrients_by_diet_type.png";
pub const SCATTER_FILE: &str = "top5_protein_recipes_scatter.png";

const FONT: &str = "sans-serif";
static FONT_BYTES: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

const MACRO_COLORS: [RGBColor; 3] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
];

// Light yellow to dark blue, close to a YlGnBu ramp.
const HEAT_LOW: (f64, f64, f64) = (255.0, 255.0, 204.0);
const HEAT_HIGH: (f64, f64, f64) = (8.0, 29.0, 88.0);

const UNKNOWN_CUISINE: &str = "unknown";

type DrawResult = Result<(), Box<dyn std::error::Error>>;
type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Renders all three charts into `dir`. Returns the files written.
pub fn render_all(result: &RunResult, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let averages = &result.avg_macros_by_diet_type;
    if averages.is_empty() {
        warn!("No diet types to chart; skipping charts");
        return Ok(Vec::new());
    }

    let bar = dir.join(BAR_CHART_FILE);
    bar_chart(averages, &bar).map_err(|e| PipelineError::sink(bar.display(), e))?;

    let heat = dir.join(HEATMAP_FILE);
    heatmap(averages, &heat).map_err(|e| PipelineError::sink(heat.display(), e))?;

    let scatter = dir.join(SCATTER_FILE);
    let groups: Vec<&str> = averages.iter().map(|a| a.diet_type.as_str()).collect();
    top_scatter(&groups, &result.top5_protein_recipes_by_diet_type, &scatter)
        .map_err(|e| PipelineError::sink(scatter.display(), e))?;

    debug!(dir = %dir.display(), "Charts rendered");
    Ok(vec![bar, heat, scatter])
}

/// Registers the embedded face under the generic sans-serif family, once per process.
fn ensure_font() -> DrawResult {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| {
        plotters::style::register_font(FONT, FontStyle::Normal, FONT_BYTES).is_ok()
    });
    if ok {
        Ok(())
    } else {
        Err("embedded chart font could not be loaded".into())
    }
}

pub fn bar_chart(averages: &[MacroAverages], path: &Path) -> DrawResult {
    ensure_font()?;
    let y_max = axis_max(averages.iter().flat_map(|a| Macro::ALL.map(|m| a.get(m))));

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Average macronutrient content by diet type (g)", (FONT, 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..averages.len() as f64, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .label_style((FONT, 14))
        .draw()?;

    let bar_width = 0.8 / Macro::ALL.len() as f64;
    for m in Macro::ALL {
        let color = MACRO_COLORS[m.index()];
        chart
            .draw_series(averages.iter().enumerate().map(|(g, avg)| {
                let x0 = g as f64 + 0.1 + bar_width * m.index() as f64;
                Rectangle::new([(x0, 0.0), (x0 + bar_width, avg.get(m))], color.filled())
            }))?
            .label(m.column())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font((FONT, 14))
        .draw()?;

    let below_axis = averages.iter().enumerate().map(|(g, avg)| {
        let (x, y) = chart.backend_coord(&(g as f64 + 0.5, 0.0));
        ((x, y + 12), avg.diet_type.as_str())
    });
    draw_labels(&root, below_axis, Pos::new(HPos::Center, VPos::Top))?;

    root.present()?;
    Ok(())
}

pub fn heatmap(averages: &[MacroAverages], path: &Path) -> DrawResult {
    ensure_font()?;
    let max = axis_max(averages.iter().flat_map(|a| Macro::ALL.map(|m| a.get(m))));
    let rows = averages.len();

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Macronutrient heatmap by diet type (g)", (FONT, 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(120)
        .build_cartesian_2d(0f64..Macro::ALL.len() as f64, 0f64..rows as f64)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_label_formatter(&|_| String::new())
        .y_label_formatter(&|_| String::new())
        .draw()?;

    // first diet type on top
    let row_y = |row: usize| (rows - 1 - row) as f64;

    chart.draw_series(averages.iter().enumerate().flat_map(|(row, avg)| {
        Macro::ALL.into_iter().map(move |m| {
            let (x, y) = (m.index() as f64, row_y(row));
            Rectangle::new([(x, y), (x + 1.0, y + 1.0)], heat_color(avg.get(m) / max).filled())
        })
    }))?;

    chart.draw_series(averages.iter().enumerate().flat_map(|(row, avg)| {
        Macro::ALL.into_iter().map(move |m| {
            let value = avg.get(m);
            let ink = if value / max > 0.5 { &WHITE } else { &BLACK };
            let style = (FONT, 16).into_font().color(ink).pos(Pos::new(HPos::Center, VPos::Center));
            Text::new(format!("{value:.1}"), (m.index() as f64 + 0.5, row_y(row) + 0.5), style)
        })
    }))?;

    let columns = Macro::ALL.into_iter().map(|m| {
        let (x, y) = chart.backend_coord(&(m.index() as f64 + 0.5, 0.0));
        ((x, y + 12), m.column())
    });
    draw_labels(&root, columns, Pos::new(HPos::Center, VPos::Top))?;

    let diets = averages.iter().enumerate().map(|(row, avg)| {
        let (x, y) = chart.backend_coord(&(0.0, row_y(row) + 0.5));
        ((x - 10, y), avg.diet_type.as_str())
    });
    draw_labels(&root, diets, Pos::new(HPos::Right, VPos::Center))?;

    root.present()?;
    Ok(())
}

pub fn top_scatter(groups: &[&str], top: &[TopRecipe], path: &Path) -> DrawResult {
    ensure_font()?;
    let y_max = axis_max(top.iter().map(|r| r.protein_g));
    let cuisines = cuisine_order(top);

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Top 5 protein-rich recipes by diet type (protein g)", (FONT, 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..groups.len() as f64 - 0.5, 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_label_formatter(&|_| String::new())
        .label_style((FONT, 14))
        .draw()?;

    for (idx, &cuisine) in cuisines.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(
                top.iter()
                    .filter(|r| r.cuisine_type.as_deref() == cuisine)
                    .filter_map(|r| {
                        let x = groups.iter().position(|g| *g == r.diet_type)? as f64;
                        Some(Circle::new((x, r.protein_g), 6, color.filled()))
                    }),
            )?
            .label(cuisine.unwrap_or(UNKNOWN_CUISINE))
            .legend(move |(x, y)| Circle::new((x + 5, y), 5, color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font((FONT, 14))
        .draw()?;

    let below_axis = groups.iter().enumerate().map(|(g, name)| {
        let (x, y) = chart.backend_coord(&(g as f64, 0.0));
        ((x, y + 12), *name)
    });
    draw_labels(&root, below_axis, Pos::new(HPos::Center, VPos::Top))?;

    root.present()?;
    Ok(())
}

/// Cuisines in order of first appearance; each one gets a palette slot.
fn cuisine_order(top: &[TopRecipe]) -> Vec<Option<&str>> {
    let mut cuisines: Vec<Option<&str>> = Vec::new();
    for r in top {
        if !cuisines.contains(&r.cuisine_type.as_deref()) {
            cuisines.push(r.cuisine_type.as_deref());
        }
    }
    cuisines
}

/// Category names sit outside the plotting area, so they go on the root.
fn draw_labels<'s>(
    root: &Area<'_>,
    labels: impl Iterator<Item = ((i32, i32), &'s str)>,
    pos: Pos,
) -> DrawResult {
    let style = (FONT, 14).into_font().color(&BLACK).pos(pos);
    for (at, text) in labels {
        root.draw(&Text::new(text, at, style.clone()))?;
    }
    Ok(())
}

fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0f64, f64::max);
    if max > 0.0 { max * 1.1 } else { 1.0 }
}

fn heat_color(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let lerp = |a: f64, b: f64| (a + (b - a) * t).round() as u8;
    RGBColor(
        lerp(HEAT_LOW.0, HEAT_HIGH.0),
        lerp(HEAT_LOW.1, HEAT_HIGH.1),
        lerp(HEAT_LOW.2, HEAT_HIGH.2),
    )
}
