//! Descriptive metrics for a set of tree records: DBH summary, dominant
//! species and histogram bin edges.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::{Dataset, TreeRecord};

/// Count, mean and median of the valid DBH values of a record set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DbhSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

impl DbhSummary {
    pub fn of(records: &[TreeRecord]) -> Self {
        let values: Vec<f64> = records.iter().filter_map(TreeRecord::valid_dbh).collect();
        Self { count: values.len(), mean: mean(&values), median: median(&values) }
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    Some(if sorted.len() % 2 == 0 { (sorted[mid - 1] + sorted[mid]) / 2.0 } else { sorted[mid] })
}

/// Most frequent species and its share of all records (including records
/// without a species).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DominantSpecies {
    pub species: String,
    pub count: usize,
    pub share: f64,
}

/// Ties resolve to the lexicographically smallest species code.
pub fn dominant_species(records: &[TreeRecord]) -> Option<DominantSpecies> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for sp in records.iter().filter_map(|r| r.species.as_deref()) {
        *counts.entry(sp).or_default() += 1;
    }
    let (species, count) = counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (sp, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((sp, n)),
        })?;
    Some(DominantSpecies {
        species: species.to_string(),
        count,
        share: count as f64 / records.len() as f64,
    })
}

/// Equal-width histogram bin edges over the finite values.
///
/// `bins + 1` edges spanning `[min, max]`; a degenerate range is widened to
/// `[v - 0.5, v + 0.5]`. `None` for empty input or zero bins.
pub fn histogram_bin_edges(values: &[f64], bins: usize) -> Option<Vec<f64>> {
    if bins == 0 {
        return None;
    }
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (lo, hi) = finite.fold(None, |acc: Option<(f64, f64)>, v| match acc {
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        None => Some((v, v)),
    })?;
    let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
    let step = (hi - lo) / bins as f64;
    let mut edges: Vec<f64> = (0..bins).map(|i| lo + step * i as f64).collect();
    edges.push(hi);
    Some(edges)
}

/// Bin edges for every valid DBH of a dataset.
pub fn dbh_bin_edges(dataset: &Dataset, bins: usize) -> Option<Vec<f64>> {
    let values: Vec<f64> = dataset.records().iter().filter_map(TreeRecord::valid_dbh).collect();
    histogram_bin_edges(&values, bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tree(species: Option<&str>, dbh: Option<f64>) -> TreeRecord {
        TreeRecord { species: species.map(str::to_string), dbh, ..Default::default() }
    }

    #[test]
    fn dbh_summary_ignores_missing() {
        let recs = vec![
            tree(Some("A"), Some(10.0)),
            tree(Some("A"), None),
            tree(Some("B"), Some(30.0)),
            tree(Some("B"), Some(14.0)),
        ];
        let s = DbhSummary::of(&recs);
        assert_eq!(s.count, 3);
        assert_relative_eq!(s.mean.unwrap(), 18.0);
        assert_relative_eq!(s.median.unwrap(), 14.0);
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        assert_relative_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert_eq!(median(&[]), None);
        assert_eq!(DbhSummary::of(&[]).mean, None);
    }

    #[test]
    fn dominant_share_counts_all_rows() {
        let recs = vec![
            tree(Some("QR"), None),
            tree(Some("QR"), None),
            tree(Some("TC"), None),
            tree(None, None),
        ];
        let d = dominant_species(&recs).unwrap();
        assert_eq!(d.species, "QR");
        assert_eq!(d.count, 2);
        assert_relative_eq!(d.share, 0.5);
    }

    #[test]
    fn dominant_tie_is_lexicographic() {
        let recs = vec![tree(Some("TC"), None), tree(Some("AP"), None)];
        assert_eq!(dominant_species(&recs).unwrap().species, "AP");
        assert!(dominant_species(&[tree(None, None)]).is_none());
    }

    #[test]
    fn bin_edges_are_equal_width() {
        let edges = histogram_bin_edges(&[0.0, 10.0, 4.0], 5).unwrap();
        assert_eq!(edges.len(), 6);
        for (i, e) in edges.iter().enumerate() {
            assert_relative_eq!(*e, 2.0 * i as f64, epsilon = 1e-12);
        }
    }

    #[test]
    fn degenerate_range_is_widened() {
        let edges = histogram_bin_edges(&[7.0, 7.0, f64::NAN], 2).unwrap();
        assert_eq!(edges, vec![6.5, 7.0, 7.5]);
        assert!(histogram_bin_edges(&[], 10).is_none());
        assert!(histogram_bin_edges(&[1.0], 0).is_none());
    }
}
