//! Error types for the inventory engine.
//!
//! Only whole-operation impossibility is an error. Per-row problems become
//! missing values, empty selections are `Ok(None)` and degenerate statistics
//! are `None`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Required column '{field}' not found (tried: {})", tried.join(", "))]
    MissingColumn { field: &'static str, tried: Vec<String> },

    #[error("No year information could be derived{}", plot.as_deref().map(|p| format!(" for plot {p}")).unwrap_or_default())]
    YearUnavailable { plot: Option<String> },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_unavailable_names_the_plot() {
        let e = Error::YearUnavailable { plot: Some("1-1".into()) };
        assert_eq!(e.to_string(), "No year information could be derived for plot 1-1");
        let e = Error::YearUnavailable { plot: None };
        assert_eq!(e.to_string(), "No year information could be derived");
    }

    #[test]
    fn missing_column_lists_aliases() {
        let e = Error::MissingColumn { field: "DBH", tried: vec!["DBH".into(), "DBH)".into()] };
        assert_eq!(e.to_string(), "Required column 'DBH' not found (tried: DBH, DBH))");
    }
}
