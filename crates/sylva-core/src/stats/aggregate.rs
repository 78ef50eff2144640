//! Per-plot, per-year aggregation: tree counts, basal area and category
//! composition.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::record::{Category, Dataset, TreeRecord};

/// Basal area in m² for a DBH in cm: π · (dbh/200)².
///
/// Missing, non-finite or negative DBH contributes 0.
pub fn basal_area_m2(dbh_cm: Option<f64>) -> f64 {
    match dbh_cm {
        Some(d) if d.is_finite() && d >= 0.0 => {
            let r = d / 200.0;
            PI * r * r
        }
        _ => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub plot_id: Option<String>,
    pub count: usize,
    /// Trees per m² of plot area.
    pub density_per_m2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearBasalArea {
    pub year: i32,
    pub plot_id: Option<String>,
    pub basal_area_m2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionRow {
    pub year: i32,
    pub plot_id: Option<String>,
    pub category: String,
    pub count: usize,
    /// Share of the year's categorized trees; sums to 1 per year.
    pub proportion: f64,
}

/// Yearly statistics for one plot. Rows are sorted by year (then category).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotYearStats {
    pub plot_id: Option<String>,
    pub counts: Vec<YearCount>,
    pub basal_area: Vec<YearBasalArea>,
    pub species: Vec<CompositionRow>,
    pub status: Vec<CompositionRow>,
}

impl PlotYearStats {
    /// Mean tree count over the measured years.
    pub fn average_trees(&self) -> f64 {
        if self.counts.is_empty() {
            return 0.0;
        }
        self.counts.iter().map(|c| c.count as f64).sum::<f64>() / self.counts.len() as f64
    }

    /// Basal area summed over every measured year.
    pub fn total_basal_area(&self) -> f64 {
        self.basal_area.iter().map(|b| b.basal_area_m2).sum()
    }
}

/// Records of `plot_id` (all records when `None`) that carry a year.
///
/// `Ok(None)`: the plot has no rows. `Err(YearUnavailable)`: rows exist but
/// none of them has a derivable year.
pub(crate) fn dated_rows(dataset: &Dataset, plot_id: Option<&str>) -> Result<Option<Vec<TreeRecord>>> {
    let scoped = dataset.for_plot(plot_id);
    if scoped.is_empty() {
        tracing::debug!(plot = ?plot_id, "no rows for plot");
        return Ok(None);
    }
    let dated: Vec<TreeRecord> = scoped.records().iter().filter(|r| r.year.is_some()).cloned().collect();
    if dated.is_empty() {
        return Err(Error::YearUnavailable { plot: plot_id.map(str::to_string) });
    }
    Ok(Some(dated))
}

/// Per `(year, category)` counts and within-year proportions. Records with a
/// missing year or category are skipped.
pub fn composition(records: &[TreeRecord], plot_id: Option<&str>, category: Category) -> Vec<CompositionRow> {
    let mut counts: BTreeMap<(i32, &str), usize> = BTreeMap::new();
    let mut totals: BTreeMap<i32, usize> = BTreeMap::new();
    for r in records {
        if let (Some(year), Some(cat)) = (r.year, r.category(category)) {
            *counts.entry((year, cat)).or_default() += 1;
            *totals.entry(year).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|((year, cat), count)| CompositionRow {
            year,
            plot_id: plot_id.map(str::to_string),
            category: cat.to_string(),
            count,
            proportion: count as f64 / totals[&year] as f64,
        })
        .collect()
}

/// Yearly counts, basal area and species/status composition for one plot.
///
/// `plot_id = None` treats the whole dataset as already filtered.
pub fn compute_plot_year_stats(
    dataset: &Dataset,
    plot_id: Option<&str>,
    plot_area_m2: f64,
) -> Result<Option<PlotYearStats>> {
    let Some(rows) = dated_rows(dataset, plot_id)? else {
        return Ok(None);
    };
    let owned_id = plot_id.map(str::to_string);

    let mut by_year: BTreeMap<i32, (usize, f64)> = BTreeMap::new();
    for r in &rows {
        if let Some(year) = r.year {
            let e = by_year.entry(year).or_default();
            e.0 += 1;
            e.1 += basal_area_m2(r.dbh);
        }
    }

    let counts = by_year
        .iter()
        .map(|(&year, &(count, _))| YearCount {
            year,
            plot_id: owned_id.clone(),
            count,
            density_per_m2: if plot_area_m2 > 0.0 { count as f64 / plot_area_m2 } else { 0.0 },
        })
        .collect();
    let basal_area = by_year
        .iter()
        .map(|(&year, &(_, ba))| YearBasalArea { year, plot_id: owned_id.clone(), basal_area_m2: ba })
        .collect();

    tracing::debug!(plot = ?plot_id, rows = rows.len(), years = by_year.len(), "plot year stats");
    Ok(Some(PlotYearStats {
        plot_id: owned_id,
        counts,
        basal_area,
        species: composition(&rows, plot_id, Category::Species),
        status: composition(&rows, plot_id, Category::Status),
    }))
}
