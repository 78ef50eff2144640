//! Two-plot comparison: runs the per-plot statistics for both sides and
//! combines them into one report.
//!
//! The sides may come from different datasets (a main inventory and a
//! control). With the `threading` feature the two sides are summarized in
//! parallel.

use serde::Serialize;

use crate::colors::{assign_colors, ColorMap};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::record::{Category, Dataset};
use crate::stats::{
    compute_plot_year_stats, compute_tree_increments, diversity, dominant_species, summary::mean,
    welch_t, DbhSummary, DominantSpecies, PlotYearStats, TreeIncrement, WelchTest,
};

// ── Inputs ────────────────────────────────────────────────────────────────────

/// One side of a comparison: a plot id within a dataset.
#[derive(Debug, Clone, Copy)]
pub struct PlotSide<'a> {
    pub dataset: &'a Dataset,
    pub plot_id: &'a str,
}

impl<'a> PlotSide<'a> {
    pub fn new(dataset: &'a Dataset, plot_id: &'a str) -> Self {
        Self { dataset, plot_id }
    }
}

// ── Outputs ───────────────────────────────────────────────────────────────────

/// Everything computed for one plot.
#[derive(Debug, Clone, Serialize)]
pub struct SideSummary {
    pub plot_id: String,
    pub label: String,
    /// `None` when the plot has no rows.
    pub stats: Option<PlotYearStats>,
    pub average_trees: f64,
    pub total_basal_area_m2: f64,
    pub richness: usize,
    /// `None` when no tree has two qualifying measurements.
    pub mean_increment: Option<f64>,
    pub dbh: DbhSummary,
    pub dominant_species: Option<DominantSpecies>,
    pub increments: Vec<TreeIncrement>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub a: SideSummary,
    pub b: SideSummary,
    /// Welch test of `a` increments against `b`; `None` when undefined.
    pub welch: Option<WelchTest>,
    pub species_colors: ColorMap,
    pub status_colors: ColorMap,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

fn summarize(side: PlotSide<'_>, cfg: &EngineConfig) -> Result<SideSummary> {
    let plot = Some(side.plot_id);
    let stats = compute_plot_year_stats(side.dataset, plot, cfg.plot_area_m2())?;
    let increments = compute_tree_increments(side.dataset, plot)?.unwrap_or_default();
    let rows = side.dataset.for_plot(plot);

    let label = side
        .dataset
        .plots()
        .into_iter()
        .find(|(id, _)| id == side.plot_id)
        .map(|(_, label)| label)
        .unwrap_or_else(|| side.plot_id.to_string());

    let values: Vec<f64> = increments.iter().map(|i| i.cm_per_year).collect();
    let summary = SideSummary {
        plot_id: side.plot_id.to_string(),
        label,
        average_trees: stats.as_ref().map_or(0.0, PlotYearStats::average_trees),
        total_basal_area_m2: stats.as_ref().map_or(0.0, PlotYearStats::total_basal_area),
        stats,
        richness: diversity(Some(rows.records())),
        mean_increment: mean(&values),
        dbh: DbhSummary::of(rows.records()),
        dominant_species: dominant_species(rows.records()),
        increments,
    };
    tracing::debug!(
        plot = side.plot_id,
        rows = rows.len(),
        increments = summary.increments.len(),
        "summarized plot"
    );
    Ok(summary)
}

/// Compare two plots.
///
/// A side whose plot has no rows yields an empty summary; a side whose rows
/// carry no year at all fails with `YearUnavailable`.
pub fn compare_plots(a: PlotSide<'_>, b: PlotSide<'_>, cfg: &EngineConfig) -> Result<ComparisonReport> {
    #[cfg(feature = "threading")]
    let (sa, sb) = rayon::join(|| summarize(a, cfg), || summarize(b, cfg));
    #[cfg(not(feature = "threading"))]
    let (sa, sb) = (summarize(a, cfg), summarize(b, cfg));
    let (sa, sb) = (sa?, sb?);

    let inc_a: Vec<f64> = sa.increments.iter().map(|i| i.cm_per_year).collect();
    let inc_b: Vec<f64> = sb.increments.iter().map(|i| i.cm_per_year).collect();
    let welch = welch_t(&inc_a, &inc_b, cfg.min_samples_for_stats);
    if welch.is_none() {
        tracing::debug!(n_a = inc_a.len(), n_b = inc_b.len(), "welch test undefined");
    }

    let union = |category: Category| {
        let (ca, cb) = (a.dataset.categories(category), b.dataset.categories(category));
        assign_colors(ca.iter().chain(&cb).map(|c| Some(c.as_str())), &cfg.colors)
    };

    Ok(ComparisonReport {
        a: sa,
        b: sb,
        welch,
        species_colors: union(Category::Species),
        status_colors: union(Category::Status),
    })
}
