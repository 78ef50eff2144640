//! Forest inventory analytics: schema normalization of tree-measurement
//! tables, per-plot time series, growth increments and plot comparison.

pub mod colors;
pub mod comparison;
pub mod config;
pub mod coords;
pub mod error;
pub mod record;
pub mod schema;
pub mod stats;
pub mod table;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use record::{Category, Dataset, TreeRecord};
