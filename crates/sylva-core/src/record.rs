use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::schema::plot_id::canonical_plot_id;

/// One measurement of one tree in one year.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TreeRecord {
    /// Sampling plot; `"{plot}-{subplot}"` when subplots exist.
    pub plot_id: Option<String>,
    /// Human-readable plot label; `"{plot} - {subplot}"` for composites.
    pub plot_label: Option<String>,
    /// Stable across years for the same physical tree within a plot.
    pub tree_id: Option<String>,
    pub year: Option<i32>,
    /// Plot-local position in metres.
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Diameter at breast height, centimetres.
    pub dbh: Option<f64>,
    pub species: Option<String>,
    pub status: Option<String>,
    pub crown_class: Option<String>,
}

impl TreeRecord {
    /// DBH usable in basal-area and increment computations.
    pub fn valid_dbh(&self) -> Option<f64> {
        self.dbh.filter(|d| d.is_finite() && *d >= 0.0)
    }

    pub fn category(&self, category: Category) -> Option<&str> {
        match category {
            Category::Species => self.species.as_deref(),
            Category::Status => self.status.as_deref(),
            Category::CrownClass => self.crown_class.as_deref(),
        }
    }
}

/// Categorical attribute used for grouping and coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Species,
    Status,
    CrownClass,
}

/// Where the year of each record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearSource {
    Date,
    InventoryYear,
    Year,
}

/// Immutable, request-scoped table of tree records.
///
/// Every derived view (`for_plot`, `for_year`, coordinate wrapping) returns a
/// new `Dataset`; nothing rewrites records in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    records: Vec<TreeRecord>,
    /// Year sources present in the input, in derivation priority order.
    year_sources: Vec<YearSource>,
    /// True when plot ids were composed from plot/subplot pairs.
    composite_plots: bool,
}

impl Dataset {
    pub fn new(records: Vec<TreeRecord>, year_sources: Vec<YearSource>, composite_plots: bool) -> Self {
        Self { records, year_sources, composite_plots }
    }

    /// Dataset whose year availability is inferred from the records themselves.
    pub fn from_records(records: Vec<TreeRecord>) -> Self {
        let year_sources = if records.iter().any(|r| r.year.is_some()) {
            vec![YearSource::Year]
        } else {
            Vec::new()
        };
        Self { records, year_sources, composite_plots: false }
    }

    pub fn records(&self) -> &[TreeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn year_sources(&self) -> &[YearSource] {
        &self.year_sources
    }

    /// False when no year derivation path exists for this input at all.
    pub fn has_year_info(&self) -> bool {
        !self.year_sources.is_empty()
    }

    pub fn composite_plots(&self) -> bool {
        self.composite_plots
    }

    /// Records of one plot, or every record when `plot_id` is `None`.
    pub fn for_plot(&self, plot_id: Option<&str>) -> Dataset {
        let records = match plot_id {
            Some(id) => self
                .records
                .iter()
                .filter(|r| r.plot_id.as_deref() == Some(id))
                .cloned()
                .collect(),
            None => self.records.clone(),
        };
        Dataset { records, ..self.clone_meta() }
    }

    pub fn for_year(&self, year: i32) -> Dataset {
        let records = self.records.iter().filter(|r| r.year == Some(year)).cloned().collect();
        Dataset { records, ..self.clone_meta() }
    }

    /// Same metadata, records replaced.
    pub fn with_records(&self, records: Vec<TreeRecord>) -> Dataset {
        Dataset { records, ..self.clone_meta() }
    }

    fn clone_meta(&self) -> Dataset {
        Dataset {
            records: Vec::new(),
            year_sources: self.year_sources.clone(),
            composite_plots: self.composite_plots,
        }
    }

    /// Sorted unique `(plot_id, display label)` pairs.
    pub fn plots(&self) -> Vec<(String, String)> {
        let mut out: BTreeMap<String, String> = BTreeMap::new();
        for r in &self.records {
            if let Some(id) = &r.plot_id {
                out.entry(id.clone())
                    .or_insert_with(|| r.plot_label.clone().unwrap_or_else(|| id.clone()));
            }
        }
        out.into_iter().collect()
    }

    /// Map a user-facing plot label (display or id form) to a known plot id.
    pub fn resolve_plot(&self, label: &str) -> Option<String> {
        let wanted = canonical_plot_id(label);
        self.plots()
            .into_iter()
            .map(|(id, _)| id)
            .find(|id| *id == wanted || canonical_plot_id(id) == wanted)
    }

    /// Sorted distinct years, optionally restricted to one plot.
    pub fn years(&self, plot_id: Option<&str>) -> Vec<i32> {
        let years: BTreeSet<i32> = self
            .records
            .iter()
            .filter(|r| plot_id.is_none() || r.plot_id.as_deref() == plot_id)
            .filter_map(|r| r.year)
            .collect();
        years.into_iter().collect()
    }

    /// Sorted distinct non-null values of a category.
    pub fn categories(&self, category: Category) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().filter_map(|r| r.category(category)).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// `(year, dbh)` history of one tree, sorted by year.
    pub fn dbh_history(&self, plot_id: Option<&str>, tree_id: &str) -> Vec<(i32, f64)> {
        let mut history: Vec<(i32, f64)> = self
            .records
            .iter()
            .filter(|r| plot_id.is_none() || r.plot_id.as_deref() == plot_id)
            .filter(|r| r.tree_id.as_deref() == Some(tree_id))
            .filter_map(|r| Some((r.year?, r.valid_dbh()?)))
            .collect();
        history.sort_by_key(|(y, _)| *y);
        history
    }
}
