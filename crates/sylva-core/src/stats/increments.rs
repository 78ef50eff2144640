//! Annualized DBH growth between consecutive measurements of the same tree.
//!
//! Per tree, qualifying measurements (year and a valid DBH) are sorted by year
//! with a stable sort, then each consecutive pair yields
//! `(dbh[i+1] - dbh[i]) / (year[i+1] - year[i])`. Pairs whose year delta is
//! not positive (duplicate years) are skipped.

use std::collections::BTreeMap;

use serde::Serialize;

use super::aggregate::dated_rows;
use crate::error::Result;
use crate::record::Dataset;

/// One growth interval of one tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeIncrement {
    pub tree_id: String,
    pub from_year: i32,
    pub to_year: i32,
    /// cm per year; negative when the recorded DBH shrank.
    pub cm_per_year: f64,
}

/// Growth intervals for every tree of a plot, ordered by tree id then year.
///
/// `Ok(None)` when the plot has no rows or no interval could be computed;
/// `Err(YearUnavailable)` when rows exist but none carries a year.
pub fn compute_tree_increments(
    dataset: &Dataset,
    plot_id: Option<&str>,
) -> Result<Option<Vec<TreeIncrement>>> {
    let Some(rows) = dated_rows(dataset, plot_id)? else {
        return Ok(None);
    };

    let mut by_tree: BTreeMap<&str, Vec<(i32, f64)>> = BTreeMap::new();
    for r in &rows {
        if let (Some(tree), Some(year), Some(dbh)) = (r.tree_id.as_deref(), r.year, r.valid_dbh()) {
            by_tree.entry(tree).or_default().push((year, dbh));
        }
    }

    let mut out = Vec::new();
    let mut skipped = 0usize;
    for (tree, mut series) in by_tree {
        if series.len() < 2 {
            continue;
        }
        series.sort_by_key(|&(year, _)| year);
        for pair in series.windows(2) {
            let (y0, d0) = pair[0];
            let (y1, d1) = pair[1];
            let dy = y1 - y0;
            if dy <= 0 {
                skipped += 1;
                continue;
            }
            out.push(TreeIncrement {
                tree_id: tree.to_string(),
                from_year: y0,
                to_year: y1,
                cm_per_year: (d1 - d0) / dy as f64,
            });
        }
    }

    if skipped > 0 {
        tracing::warn!(plot = ?plot_id, skipped, "skipped same-year measurement pairs");
    }
    if out.is_empty() {
        return Ok(None);
    }
    Ok(Some(out))
}

/// Increment values (cm/yr) for a plot; see [`compute_tree_increments`].
pub fn compute_dbh_increments(dataset: &Dataset, plot_id: Option<&str>) -> Result<Option<Vec<f64>>> {
    Ok(compute_tree_increments(dataset, plot_id)?
        .map(|incs| incs.into_iter().map(|i| i.cm_per_year).collect()))
}
