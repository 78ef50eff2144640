//! Schema normalization: raw table → canonical tree records.
//!
//! Pipeline:
//!   header trim → column resolution → numeric/text coercion →
//!   year derivation → plot identity → tree identity.
//!
//! Rows are never dropped here. A field that cannot be resolved disables the
//! features depending on it and is reported as a [`SchemaWarning`].

pub mod coerce;
pub mod plot_id;
pub mod year;

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::config::{
    EngineConfig, CROWN_COL, DATE_COL, DBH_COL, PLOT_ID_COL, SPECIES_COL, STATUS_COL,
    TREE_ID_COL, X_COL, Y_COL, YEAR_COL,
};
use crate::error::{Error, Result};
use crate::record::{Dataset, TreeRecord, YearSource};
use crate::table::RawTable;
use coerce::{coerce_f64, coerce_year, format_number, text_cell};
use plot_id::{canonical_plot_id, composite_plot_id};
use year::parse_date_year;

/// Feature-disabling conditions found while normalizing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaWarning {
    /// No date, inventory-year or year column; time-based statistics are unavailable.
    YearUnavailable,
    /// Some rows have no derivable year and are left out of time-based statistics.
    RowsWithoutYear { count: usize },
    /// No plot or plot/subplot columns; plot selection is unavailable.
    PlotIdUnavailable,
    /// No coordinate columns resolved.
    CoordinatesUnavailable,
    /// No tree id column; ids were built from rounded coordinates.
    TreeIdSynthesized,
    /// Neither a tree id column nor coordinates; growth increments are unavailable.
    TreeIdUnavailable,
    /// Optional categorical column absent.
    ColumnMissing { field: String },
    /// Non-empty cells that could not be read as numbers.
    UnparsedValues { field: String, count: usize },
    /// More than one record for the same tree in the same year.
    DuplicateMeasurements { count: usize },
}

/// Which input header fed each canonical field, plus any warnings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaReport {
    pub rows: usize,
    pub resolved: BTreeMap<String, String>,
    pub year_sources: Vec<YearSource>,
    pub warnings: Vec<SchemaWarning>,
}

impl SchemaReport {
    fn warn(&mut self, w: SchemaWarning) {
        tracing::warn!(warning = ?w, "schema");
        self.warnings.push(w);
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone)]
pub struct Normalized {
    pub dataset: Dataset,
    pub report: SchemaReport,
}

/// Header actually used for a canonical field: the canonical name when
/// present, otherwise the first alias found.
pub fn resolve_column(table: &RawTable, canonical: &str, aliases: &[String]) -> Option<String> {
    if table.column(canonical).is_some() {
        return Some(canonical.to_string());
    }
    aliases.iter().find(|a| table.column(a).is_some()).cloned()
}

fn cell(col: Option<&[Option<String>]>, i: usize) -> Option<&str> {
    col.and_then(|c| c[i].as_deref())
}

/// Numeric column with the count of non-empty cells that failed to parse.
fn numeric_column(col: Option<&[Option<String>]>, n: usize) -> (Vec<Option<f64>>, usize) {
    let mut bad = 0usize;
    let values = (0..n)
        .map(|i| {
            let raw = cell(col, i)?;
            let v = coerce_f64(raw);
            if v.is_none() {
                bad += 1;
            }
            v
        })
        .collect();
    (values, bad)
}

/// Normalize a raw table into canonical tree records.
///
/// Fails only when the species or DBH column cannot be resolved.
pub fn normalize(raw: &RawTable, cfg: &EngineConfig) -> Result<Normalized> {
    let table = raw.with_trimmed_headers();
    let aliases = &cfg.columns;
    let n = table.n_rows();
    let mut report = SchemaReport { rows: n, ..Default::default() };

    let resolve = |canonical: &str, list: &[String], report: &mut SchemaReport| {
        let found = resolve_column(&table, canonical, list);
        if let Some(h) = &found {
            report.resolved.insert(canonical.to_string(), h.clone());
        }
        found
    };

    let species_h = resolve(SPECIES_COL, &aliases.species, &mut report).ok_or_else(|| {
        Error::MissingColumn { field: SPECIES_COL, tried: aliases.species.clone() }
    })?;
    let dbh_h = resolve(DBH_COL, &aliases.dbh, &mut report)
        .ok_or_else(|| Error::MissingColumn { field: DBH_COL, tried: aliases.dbh.clone() })?;
    let status_h = resolve(STATUS_COL, &aliases.status, &mut report);
    let crown_h = resolve(CROWN_COL, &aliases.crown_class, &mut report);
    let x_h = resolve(X_COL, &aliases.x, &mut report);
    let y_h = resolve(Y_COL, &aliases.y, &mut report);
    let tree_h = resolve(TREE_ID_COL, &aliases.tree_id, &mut report);
    let date_h = resolve(DATE_COL, &aliases.date, &mut report);
    let inv_h = aliases.inventory_year.iter().find(|a| table.column(a).is_some()).cloned();
    let year_h = resolve(YEAR_COL, &aliases.year, &mut report);

    let col = |h: &Option<String>| h.as_deref().and_then(|h| table.column(h));

    let species = table.column(&species_h);
    let (dbh, dbh_bad) = numeric_column(table.column(&dbh_h), n);
    if dbh_bad > 0 {
        report.warn(SchemaWarning::UnparsedValues { field: DBH_COL.into(), count: dbh_bad });
    }
    for (field, h) in [(STATUS_COL, &status_h), (CROWN_COL, &crown_h)] {
        if h.is_none() {
            report.warn(SchemaWarning::ColumnMissing { field: field.into() });
        }
    }

    // Coordinates stay raw here; wrapping into the plot is a separate step.
    let (xs, ys) = match (col(&x_h), col(&y_h)) {
        (Some(xc), Some(yc)) => {
            let (xs, xb) = numeric_column(Some(xc), n);
            let (ys, yb) = numeric_column(Some(yc), n);
            if xb + yb > 0 {
                report.warn(SchemaWarning::UnparsedValues { field: "X/Y".into(), count: xb + yb });
            }
            (xs, ys)
        }
        _ => {
            report.warn(SchemaWarning::CoordinatesUnavailable);
            (vec![None; n], vec![None; n])
        }
    };

    let years = derive_years(&table, date_h.as_deref(), inv_h.as_deref(), year_h.as_deref(), &mut report);
    if let Some(h) = &inv_h {
        report.resolved.insert("YearOfInventory".into(), h.clone());
    }
    let (plot_ids, composite) = derive_plot_ids(&table, cfg, &mut report);
    let tree_ids = derive_tree_ids(col(&tree_h), &xs, &ys, cfg.tree_id_precision, n, &mut report);

    let records: Vec<TreeRecord> = (0..n)
        .map(|i| {
            let (plot_id, plot_label) = plot_ids[i].clone().unzip();
            TreeRecord {
                plot_id,
                plot_label,
                tree_id: tree_ids[i].clone(),
                year: years[i],
                x: xs[i],
                y: ys[i],
                dbh: dbh[i],
                species: text_cell(cell(species, i)),
                status: text_cell(cell(col(&status_h), i)),
                crown_class: text_cell(cell(col(&crown_h), i)),
            }
        })
        .collect();

    let dupes = count_duplicate_measurements(&records);
    if dupes > 0 {
        report.warn(SchemaWarning::DuplicateMeasurements { count: dupes });
    }

    tracing::debug!(rows = n, resolved = report.resolved.len(), "normalized inventory");
    let dataset = Dataset::new(records, report.year_sources.clone(), composite);
    Ok(Normalized { dataset, report })
}

/// Per-row year: date, then inventory year, then year. A row falls through
/// to the next source when the preferred one is missing or unparseable.
fn derive_years(
    table: &RawTable,
    date_h: Option<&str>,
    inv_h: Option<&str>,
    year_h: Option<&str>,
    report: &mut SchemaReport,
) -> Vec<Option<i32>> {
    let date = date_h.and_then(|h| table.column(h));
    let inv = inv_h.and_then(|h| table.column(h));
    let year = year_h.and_then(|h| table.column(h));

    for (present, source) in [
        (date.is_some(), YearSource::Date),
        (inv.is_some(), YearSource::InventoryYear),
        (year.is_some(), YearSource::Year),
    ] {
        if present {
            report.year_sources.push(source);
        }
    }
    if report.year_sources.is_empty() {
        report.warn(SchemaWarning::YearUnavailable);
        return vec![None; table.n_rows()];
    }

    let years: Vec<Option<i32>> = (0..table.n_rows())
        .map(|i| {
            cell(date, i)
                .and_then(parse_date_year)
                .or_else(|| cell(inv, i).and_then(coerce_year))
                .or_else(|| cell(year, i).and_then(coerce_year))
        })
        .collect();

    let missing = years.iter().filter(|y| y.is_none()).count();
    if missing > 0 {
        report.warn(SchemaWarning::RowsWithoutYear { count: missing });
    }
    years
}

/// Per-row `(plot_id, display_label)` and whether ids are composite.
fn derive_plot_ids(
    table: &RawTable,
    cfg: &EngineConfig,
    report: &mut SchemaReport,
) -> (Vec<Option<(String, String)>>, bool) {
    let n = table.n_rows();

    let pair = cfg
        .columns
        .plot_pairs
        .iter()
        .find(|(p, s)| table.column(p).is_some() && table.column(s).is_some());
    if let Some((p_h, s_h)) = pair {
        report.resolved.insert("Plot".into(), p_h.clone());
        report.resolved.insert("Subplot".into(), s_h.clone());
        let plots = table.column(p_h);
        let subs = table.column(s_h);
        let ids = (0..n)
            .map(|i| composite_plot_id(cell(plots, i)?, cell(subs, i)?))
            .collect();
        return (ids, true);
    }

    match resolve_column(table, PLOT_ID_COL, &cfg.columns.plot) {
        Some(h) => {
            report.resolved.insert(PLOT_ID_COL.into(), h.clone());
            let plots = table.column(&h);
            let ids = (0..n)
                .map(|i| {
                    let id = canonical_plot_id(cell(plots, i)?);
                    (!id.is_empty()).then(|| (id.clone(), id))
                })
                .collect();
            (ids, false)
        }
        None => {
            report.warn(SchemaWarning::PlotIdUnavailable);
            (vec![None; n], false)
        }
    }
}

fn derive_tree_ids(
    col: Option<&[Option<String>]>,
    xs: &[Option<f64>],
    ys: &[Option<f64>],
    precision: u32,
    n: usize,
    report: &mut SchemaReport,
) -> Vec<Option<String>> {
    if let Some(c) = col {
        return (0..n).map(|i| text_cell(c[i].as_deref())).collect();
    }
    if xs.iter().all(Option::is_none) {
        report.warn(SchemaWarning::TreeIdUnavailable);
        return vec![None; n];
    }
    report.warn(SchemaWarning::TreeIdSynthesized);
    (0..n)
        .map(|i| Some(synthesize_tree_id(xs[i]?, ys[i]?, precision)))
        .collect()
}

/// Tree id from coordinates rounded to `precision` decimals, e.g. `"3.5_12.25"`.
pub fn synthesize_tree_id(x: f64, y: f64, precision: u32) -> String {
    let scale = 10f64.powi(precision as i32);
    let round = |v: f64| format_number((v * scale).round() / scale);
    format!("{}_{}", round(x), round(y))
}

fn count_duplicate_measurements(records: &[TreeRecord]) -> usize {
    let mut seen: HashMap<(&str, &str, i32), usize> = HashMap::new();
    for r in records {
        if let (Some(t), Some(y)) = (r.tree_id.as_deref(), r.year) {
            *seen.entry((r.plot_id.as_deref().unwrap_or(""), t, y)).or_default() += 1;
        }
    }
    seen.values().filter(|&&c| c > 1).map(|c| c - 1).sum()
}

/// Read and normalize a delimited file in one step.
pub fn load_path(path: impl AsRef<Path>, cfg: &EngineConfig) -> Result<Normalized> {
    normalize(&RawTable::from_path(path)?, cfg)
}

pub fn load_reader<R: Read>(reader: R, cfg: &EngineConfig) -> Result<Normalized> {
    normalize(&RawTable::from_reader(reader)?, cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> Normalized {
        load_reader(csv.as_bytes(), &EngineConfig::default()).unwrap()
    }

    #[test]
    fn headers_are_trimmed_and_aliases_resolved() {
        let n = load(" CoorX ,CoorY, Species ,DBH,Year\n23.5,1,QR,10,2010\n");
        let r = &n.dataset.records()[0];
        assert_eq!(r.x, Some(23.5));
        assert_eq!(r.species.as_deref(), Some("QR"));
        assert_eq!(n.report.resolved["X"], "CoorX");
    }

    #[test]
    fn canonical_coordinate_header_wins() {
        let n = load("CoorX,X,CoorY,Y,Species,DBH\n1,2,3,4,QR,10\n");
        let r = &n.dataset.records()[0];
        assert_eq!((r.x, r.y), (Some(2.0), Some(4.0)));
    }

    #[test]
    fn missing_required_columns_fail() {
        let err = load_reader("Species,X\nQR,1\n".as_bytes(), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { field: "DBH", .. }));
        let err = load_reader("DBH\n1\n".as_bytes(), &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn { field: "Species", .. }));
    }

    #[test]
    fn dbh_alias_with_stray_parenthesis() {
        let n = load("Species,DBH)\nQR,12\n");
        assert_eq!(n.dataset.records()[0].dbh, Some(12.0));
    }

    #[test]
    fn year_prefers_date_then_inventory_then_year() {
        let csv = "Species,DBH,Date,YearOfInventory,Year\n\
                   QR,1,25/06/2015,2014,2013\n\
                   QR,1,garbage,2014,2013\n\
                   QR,1,,, 2013 \n\
                   QR,1,,,\n";
        let n = load(csv);
        let years: Vec<_> = n.dataset.records().iter().map(|r| r.year).collect();
        assert_eq!(years, vec![Some(2015), Some(2014), Some(2013), None]);
        assert_eq!(
            n.report.year_sources,
            vec![YearSource::Date, YearSource::InventoryYear, YearSource::Year]
        );
        assert!(n.report.warnings.contains(&SchemaWarning::RowsWithoutYear { count: 1 }));
    }

    #[test]
    fn no_year_columns_is_signalled() {
        let n = load("Species,DBH\nQR,1\n");
        assert!(!n.dataset.has_year_info());
        assert!(n.report.warnings.contains(&SchemaWarning::YearUnavailable));
        assert_eq!(n.dataset.len(), 1);
    }

    #[test]
    fn plot_subplot_pairs_compose() {
        let n = load("Plot,SubPlot,Species,DBH\n1,2,QR,1\n1,,QR,1\n");
        let r = &n.dataset.records()[0];
        assert_eq!(r.plot_id.as_deref(), Some("1-2"));
        assert_eq!(r.plot_label.as_deref(), Some("1 - 2"));
        assert_eq!(n.dataset.records()[1].plot_id, None);
        assert!(n.dataset.composite_plots());

        let n = load("Plots,Subplots,Species,DBH\n3,1,QR,1\n");
        assert_eq!(n.dataset.records()[0].plot_id.as_deref(), Some("3-1"));
    }

    #[test]
    fn single_plot_column_is_coerced() {
        let n = load("PlotID,Species,DBH\n07,QR,1\nNorth\u{a0} Ridge,QR,1\n");
        let ids: Vec<_> = n.dataset.records().iter().map(|r| r.plot_id.clone()).collect();
        assert_eq!(ids, vec![Some("7".to_string()), Some("North Ridge".to_string())]);
    }

    #[test]
    fn missing_plot_column_warns_but_keeps_rows() {
        let n = load("Species,DBH\nQR,1\nTC,2\n");
        assert_eq!(n.dataset.len(), 2);
        assert!(n.report.warnings.contains(&SchemaWarning::PlotIdUnavailable));
    }

    #[test]
    fn tree_ids_synthesized_from_coordinates() {
        let n = load("X,Y,Species,DBH\n1.234,5.5,QR,1\n,5.5,QR,1\n");
        assert_eq!(n.dataset.records()[0].tree_id.as_deref(), Some("1.23_5.5"));
        assert_eq!(n.dataset.records()[1].tree_id, None);
        assert!(n.report.warnings.contains(&SchemaWarning::TreeIdSynthesized));
    }

    #[test]
    fn explicit_tree_id_column_is_used() {
        let n = load("StandardID,Species,DBH\n T-1 ,QR,1\n");
        assert_eq!(n.dataset.records()[0].tree_id.as_deref(), Some("T-1"));
    }

    #[test]
    fn unparseable_dbh_becomes_missing() {
        let n = load("Species,DBH\nQR,abc\nQR,12\n");
        assert_eq!(n.dataset.records()[0].dbh, None);
        assert!(n
            .report
            .warnings
            .contains(&SchemaWarning::UnparsedValues { field: "DBH".into(), count: 1 }));
    }

    #[test]
    fn duplicate_tree_years_are_reported() {
        let n = load("TreeID,Species,DBH,Year\na,QR,1,2010\na,QR,2,2010\nb,QR,1,2010\n");
        assert!(n.report.warnings.contains(&SchemaWarning::DuplicateMeasurements { count: 1 }));
        assert_eq!(n.dataset.len(), 3);
    }

    #[test]
    fn synthesize_tree_id_rounds() {
        assert_eq!(synthesize_tree_id(3.0, 12.256, 2), "3_12.26");
        assert_eq!(synthesize_tree_id(3.04, 1.0, 1), "3_1");
    }
}
