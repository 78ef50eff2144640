use serde::Serialize;
use wasm_bindgen::prelude::*;

use sylva_core::colors::{assign_colors, ColorMap};
use sylva_core::comparison::{compare_plots, PlotSide};
use sylva_core::schema::{load_reader, Normalized, SchemaReport};
use sylva_core::stats::{compute_plot_year_stats, compute_tree_increments, summary::dbh_bin_edges};
use sylva_core::{Category, Dataset, EngineConfig};

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Plain objects for maps and `null` for `None`, as the renderer expects.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn config(config_json: Option<String>) -> Result<EngineConfig, JsValue> {
    let cfg: EngineConfig = match config_json {
        Some(text) => serde_json::from_str(&text).map_err(|e| js_err(format!("Invalid config: {e}")))?,
        None => EngineConfig::default(),
    };
    cfg.validate().map_err(js_err)?;
    Ok(cfg)
}

fn load(csv: &str, cfg: &EngineConfig) -> Result<Normalized, JsValue> {
    load_reader(csv.as_bytes(), cfg).map_err(js_err)
}

/// Resolve a user-facing plot label, falling back to the label itself.
fn plot_id(ds: &Dataset, label: &str) -> String {
    ds.resolve_plot(label).unwrap_or_else(|| label.to_string())
}

#[derive(Serialize)]
struct Overview<'a> {
    report: &'a SchemaReport,
    plots: Vec<(String, String)>,
    years: Vec<i32>,
    species_colors: ColorMap,
    status_colors: ColorMap,
}

/// Normalize CSV text and describe it: schema report, plots, years and color maps.
#[wasm_bindgen]
pub fn normalize_csv(csv: &str, config_json: Option<String>) -> Result<JsValue, JsValue> {
    let cfg = config(config_json)?;
    let n = load(csv, &cfg)?;
    let colors = |c: Category| assign_colors(n.dataset.categories(c).iter().map(|s| Some(s.as_str())), &cfg.colors);
    to_js(&Overview {
        report: &n.report,
        plots: n.dataset.plots(),
        years: n.dataset.years(None),
        species_colors: colors(Category::Species),
        status_colors: colors(Category::Status),
    })
}

/// Yearly counts, basal area and composition for one plot; `null` for an unknown plot.
#[wasm_bindgen]
pub fn plot_year_stats(csv: &str, plot: &str, config_json: Option<String>) -> Result<JsValue, JsValue> {
    let cfg = config(config_json)?;
    let ds = load(csv, &cfg)?.dataset;
    let id = plot_id(&ds, plot);
    let stats = compute_plot_year_stats(&ds, Some(&id), cfg.plot_area_m2()).map_err(js_err)?;
    to_js(&stats)
}

/// Per-tree increments for one plot; `null` when none can be computed.
#[wasm_bindgen]
pub fn tree_increments(csv: &str, plot: &str, config_json: Option<String>) -> Result<JsValue, JsValue> {
    let cfg = config(config_json)?;
    let ds = load(csv, &cfg)?.dataset;
    let id = plot_id(&ds, plot);
    to_js(&compute_tree_increments(&ds, Some(&id)).map_err(js_err)?)
}

/// DBH histogram bin edges over the whole table; the bin count is clamped.
#[wasm_bindgen]
pub fn dbh_histogram_edges(csv: &str, bins: Option<usize>, config_json: Option<String>) -> Result<JsValue, JsValue> {
    let mut cfg = config(config_json)?;
    if let Some(b) = bins {
        cfg.histogram_bins = b;
    }
    let ds = load(csv, &cfg)?.dataset;
    to_js(&dbh_bin_edges(&ds, cfg.histogram_bins()))
}

/// Compare two plots. `control_csv`, when given, supplies plot B.
#[wasm_bindgen]
pub fn compare(
    csv: &str,
    plot_a: &str,
    plot_b: &str,
    control_csv: Option<String>,
    config_json: Option<String>,
) -> Result<JsValue, JsValue> {
    let cfg = config(config_json)?;
    let main = load(csv, &cfg)?.dataset;
    let control = control_csv.map(|c| load(&c, &cfg)).transpose()?.map(|n| n.dataset);
    let other = control.as_ref().unwrap_or(&main);

    let id_a = plot_id(&main, plot_a);
    let id_b = plot_id(other, plot_b);
    let report = compare_plots(PlotSide::new(&main, &id_a), PlotSide::new(other, &id_b), &cfg).map_err(js_err)?;
    to_js(&report)
}
