//! Plot-local coordinate canonicalization.
//!
//! Surveyed positions can fall outside the nominal plot because of GPS or
//! offset error. They are folded back with a true (always non-negative)
//! modulo, not clamped: for a 20 m plot, 23.5 → 3.5 and -1 → 19.

use crate::record::Dataset;

/// Wrap one coordinate into `[0, plot_size)`. Non-finite input is missing.
pub fn wrap_coordinate(v: f64, plot_size: f64) -> Option<f64> {
    if !v.is_finite() || !(plot_size.is_finite() && plot_size > 0.0) {
        return None;
    }
    let w = v.rem_euclid(plot_size);
    // rem_euclid can round up to exactly plot_size for tiny negative inputs.
    Some(if w >= plot_size { 0.0 } else { w })
}

/// New dataset with `x`, `y` wrapped into the plot footprint.
pub fn canonicalize_coordinates(dataset: &Dataset, plot_size: f64) -> Dataset {
    let records = dataset
        .records()
        .iter()
        .map(|r| {
            let mut r = r.clone();
            r.x = r.x.and_then(|x| wrap_coordinate(x, plot_size));
            r.y = r.y.and_then(|y| wrap_coordinate(y, plot_size));
            r
        })
        .collect();
    dataset.with_records(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::TreeRecord;
    use approx::assert_relative_eq;

    #[test]
    fn wraps_out_of_bounds_points() {
        assert_relative_eq!(wrap_coordinate(23.5, 20.0).unwrap(), 3.5);
        assert_relative_eq!(wrap_coordinate(-1.0, 20.0).unwrap(), 19.0);
        assert_relative_eq!(wrap_coordinate(20.0, 20.0).unwrap(), 0.0);
        assert_relative_eq!(wrap_coordinate(7.25, 20.0).unwrap(), 7.25);
    }

    #[test]
    fn result_is_always_inside_the_plot() {
        for v in [-1e-18, -40.0, -0.5, 39.999, 1e6] {
            let w = wrap_coordinate(v, 20.0).unwrap();
            assert!((0.0..20.0).contains(&w), "{v} -> {w}");
        }
    }

    #[test]
    fn non_finite_is_missing() {
        assert_eq!(wrap_coordinate(f64::NAN, 20.0), None);
        assert_eq!(wrap_coordinate(1.0, 0.0), None);
    }

    #[test]
    fn canonicalize_leaves_input_untouched() {
        let ds = Dataset::from_records(vec![TreeRecord {
            x: Some(23.5),
            y: Some(-1.0),
            ..Default::default()
        }]);
        let wrapped = canonicalize_coordinates(&ds, 20.0);
        assert_eq!(ds.records()[0].x, Some(23.5));
        assert_eq!(wrapped.records()[0].x, Some(3.5));
        assert_eq!(wrapped.records()[0].y, Some(19.0));
    }
}
