//! Time-series aggregation, growth increments and plot comparison metrics.

pub mod aggregate;
pub mod compare;
pub mod increments;
pub mod summary;

pub use aggregate::{basal_area_m2, composition, compute_plot_year_stats, PlotYearStats};
pub use compare::{diversity, welch_t, WelchTest};
pub use increments::{compute_dbh_increments, compute_tree_increments, TreeIncrement};
pub use summary::{dominant_species, histogram_bin_edges, DbhSummary, DominantSpecies};
