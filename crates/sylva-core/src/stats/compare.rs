//! Species richness and the Welch two-sample comparison.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::record::TreeRecord;

/// Number of distinct non-null species. `None` and empty input give 0.
pub fn diversity(records: Option<&[TreeRecord]>) -> usize {
    let Some(records) = records else {
        return 0;
    };
    records
        .iter()
        .filter_map(|r| r.species.as_deref())
        .collect::<BTreeSet<_>>()
        .len()
}

/// Welch t-statistic with its Welch–Satterthwaite degrees of freedom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WelchTest {
    pub t: f64,
    /// `None` when the Satterthwaite denominator is zero.
    pub df: Option<f64>,
    pub n_a: usize,
    pub n_b: usize,
}

fn mean_and_var(v: &[f64]) -> (f64, f64) {
    let n = v.len() as f64;
    let mean = v.iter().sum::<f64>() / n;
    let var = v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

/// Two-sample Welch comparison of independent samples `a` and `b`.
///
/// Non-finite values are dropped first. Returns `None` (undefined) when
/// either sample has fewer than `min_samples` values or the standard error
/// is exactly zero.
pub fn welch_t(a: &[f64], b: &[f64], min_samples: usize) -> Option<WelchTest> {
    let a: Vec<f64> = a.iter().copied().filter(|v| v.is_finite()).collect();
    let b: Vec<f64> = b.iter().copied().filter(|v| v.is_finite()).collect();
    let min = min_samples.max(2);
    if a.len() < min || b.len() < min {
        return None;
    }

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (m1, s1) = mean_and_var(&a);
    let (m2, s2) = mean_and_var(&b);

    let se2 = s1 / n1 + s2 / n2;
    let denom = se2.sqrt();
    if denom == 0.0 {
        return None;
    }
    let t = (m1 - m2) / denom;

    let df_den = s1 * s1 / (n1 * n1 * (n1 - 1.0)) + s2 * s2 / (n2 * n2 * (n2 - 1.0));
    let df = (df_den != 0.0).then(|| se2 * se2 / df_den);

    Some(WelchTest { t, df, n_a: a.len(), n_b: b.len() })
}
