//! Engine configuration: plot geometry, column aliases and the color scheme.
//! Defaults reproduce the reference field protocol (20 m square plots).

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Canonical header names of the tree-record schema.
pub const X_COL: &str = "X";
pub const Y_COL: &str = "Y";
pub const DBH_COL: &str = "DBH";
pub const SPECIES_COL: &str = "Species";
pub const STATUS_COL: &str = "Status";
pub const CROWN_COL: &str = "CrownClass";
pub const TREE_ID_COL: &str = "TreeID";
pub const PLOT_ID_COL: &str = "PlotID";
pub const YEAR_COL: &str = "Year";
pub const DATE_COL: &str = "Date";

pub const MIN_HISTOGRAM_BINS: usize = 5;
pub const MAX_HISTOGRAM_BINS: usize = 20;
/// Finer rounding than this no longer survives an f64 round trip.
pub const MAX_TREE_ID_PRECISION: u32 = 15;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Side length of the square plot in metres; coordinates wrap into [0, plot_size_m).
    pub plot_size_m: f64,
    /// Minimum sample size for the two-sample comparison.
    pub min_samples_for_stats: usize,
    /// Decimals kept when a tree id is synthesized from coordinates.
    pub tree_id_precision: u32,
    /// Default bin count for DBH histograms, clamped to 5..=20.
    pub histogram_bins: usize,
    pub columns: ColumnAliases,
    pub colors: ColorScheme,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            plot_size_m: 20.0,
            min_samples_for_stats: 2,
            tree_id_precision: 2,
            histogram_bins: 10,
            columns: ColumnAliases::default(),
            colors: ColorScheme::default(),
        }
    }
}

impl EngineConfig {
    /// Load a JSON config; absent keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: Self = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.plot_size_m.is_finite() && self.plot_size_m > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "plot_size_m must be positive, got {}",
                self.plot_size_m
            )));
        }
        if self.min_samples_for_stats < 2 {
            return Err(Error::InvalidConfig(format!(
                "min_samples_for_stats must be at least 2, got {}",
                self.min_samples_for_stats
            )));
        }
        if self.tree_id_precision > MAX_TREE_ID_PRECISION {
            return Err(Error::InvalidConfig(format!(
                "tree_id_precision must be at most {MAX_TREE_ID_PRECISION}, got {}",
                self.tree_id_precision
            )));
        }
        if self.colors.palette.is_empty() {
            return Err(Error::InvalidConfig("color palette is empty".into()));
        }
        Ok(())
    }

    pub fn plot_area_m2(&self) -> f64 {
        self.plot_size_m * self.plot_size_m
    }

    pub fn histogram_bins(&self) -> usize {
        self.histogram_bins.clamp(MIN_HISTOGRAM_BINS, MAX_HISTOGRAM_BINS)
    }
}

/// Accepted header names per canonical field.
///
/// A canonical header that is already present always wins; otherwise the
/// first alias found in list order is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnAliases {
    pub x: Vec<String>,
    pub y: Vec<String>,
    pub dbh: Vec<String>,
    pub species: Vec<String>,
    pub status: Vec<String>,
    pub crown_class: Vec<String>,
    pub tree_id: Vec<String>,
    pub date: Vec<String>,
    pub year: Vec<String>,
    /// Alternate "year of inventory" headers, second in year-derivation priority.
    pub inventory_year: Vec<String>,
    /// (plot, subplot) header pairs, tried in order.
    pub plot_pairs: Vec<(String, String)>,
    pub plot: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            x: names(&["CoorX", "X", "Easting"]),
            y: names(&["CoorY", "Y", "Northing"]),
            dbh: names(&["DBH", "DBH)"]),
            species: names(&["Species"]),
            status: names(&["Status"]),
            crown_class: names(&["CrownClass"]),
            tree_id: names(&["TreeID", "StandardID"]),
            date: names(&["Date"]),
            year: names(&["Year"]),
            inventory_year: names(&["YearOfInventory", "Year of Inventory", "InventoryYear"]),
            plot_pairs: vec![
                ("Plots".into(), "Subplots".into()),
                ("Plot".into(), "SubPlot".into()),
            ],
            plot: names(&["PlotID", "Plot", "Plots"]),
        }
    }
}

/// Fixed colors for well-known codes plus the cyclic palette for everything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorScheme {
    pub known: BTreeMap<String, String>,
    pub palette: Vec<String>,
}

impl Default for ColorScheme {
    fn default() -> Self {
        let known = [
            ("QR", "green"),
            ("TC", "blue"),
            ("AP", "orange"),
            ("PR", "purple"),
            ("FG", "brown"),
            ("AS", "red"),
            ("OV", "olive"),
            ("AR", "lightpink"),
            ("AA", "peru"),
            ("FA", "black"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let palette = names(&[
            "red", "blue", "green", "orange", "purple", "brown", "pink", "gray", "olive", "cyan",
            "navy", "teal", "maroon", "gold", "lime", "magenta", "coral", "darkgreen",
            "slateblue", "khaki", "salmon", "turquoise", "indigo", "sienna", "orchid",
            "steelblue", "tomato", "darkkhaki", "plum", "cadetblue",
        ]);

        Self { known, palette }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.plot_area_m2(), 400.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: EngineConfig = serde_json::from_str(r#"{"plot_size_m": 30.0}"#).unwrap();
        assert_eq!(cfg.plot_size_m, 30.0);
        assert_eq!(cfg.min_samples_for_stats, 2);
        assert_eq!(cfg.columns.x[0], "CoorX");
        assert_eq!(cfg.colors.known["QR"], "green");
    }

    #[test]
    fn rejects_non_positive_plot_size() {
        let cfg = EngineConfig { plot_size_m: 0.0, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_small_min_samples() {
        let cfg = EngineConfig { min_samples_for_stats: 1, ..Default::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_excessive_tree_id_precision() {
        let cfg = EngineConfig { tree_id_precision: 400, ..Default::default() };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));
        let cfg = EngineConfig { tree_id_precision: MAX_TREE_ID_PRECISION, ..Default::default() };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn loads_and_validates_json_file() {
        let dir = std::env::temp_dir();
        let good = dir.join(format!("sylva-config-{}.json", std::process::id()));
        std::fs::write(&good, r#"{"plot_size_m": 25.0, "columns": {"species": ["Sp"]}}"#).unwrap();
        let cfg = EngineConfig::from_json_file(&good).unwrap();
        assert_eq!(cfg.plot_size_m, 25.0);
        assert_eq!(cfg.columns.species, vec!["Sp".to_string()]);
        assert_eq!(cfg.columns.dbh[0], "DBH");

        let bad = dir.join(format!("sylva-config-bad-{}.json", std::process::id()));
        std::fs::write(&bad, r#"{"tree_id_precision": 309}"#).unwrap();
        assert!(matches!(EngineConfig::from_json_file(&bad), Err(Error::InvalidConfig(_))));

        std::fs::write(&bad, "{not json").unwrap();
        assert!(matches!(EngineConfig::from_json_file(&bad), Err(Error::Json(_))));
        assert!(matches!(
            EngineConfig::from_json_file(dir.join("sylva-no-such-config.json")),
            Err(Error::Io(_))
        ));

        let _ = std::fs::remove_file(good);
        let _ = std::fs::remove_file(bad);
    }

    #[test]
    fn histogram_bins_are_clamped() {
        let cfg = EngineConfig { histogram_bins: 50, ..Default::default() };
        assert_eq!(cfg.histogram_bins(), MAX_HISTOGRAM_BINS);
        let cfg = EngineConfig { histogram_bins: 1, ..Default::default() };
        assert_eq!(cfg.histogram_bins(), MIN_HISTOGRAM_BINS);
    }
}
