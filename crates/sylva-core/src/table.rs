//! Raw delimited input: a header row and string cells, before any schema work.

use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// Column-oriented view of an uploaded file. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    columns: Vec<Vec<Option<String>>>,
    n_rows: usize,
}

impl RawTable {
    /// Build from named columns. Shorter columns are padded with missing cells.
    pub fn from_columns<S: Into<String>>(cols: Vec<(S, Vec<Option<String>>)>) -> Self {
        let n_rows = cols.iter().map(|(_, c)| c.len()).max().unwrap_or(0);
        let mut headers = Vec::with_capacity(cols.len());
        let mut columns = Vec::with_capacity(cols.len());
        for (name, mut values) in cols {
            values.resize(n_rows, None);
            headers.push(name.into());
            columns.push(values);
        }
        Self { headers, columns, n_rows }
    }

    /// Read a header row followed by records. Ragged rows are tolerated:
    /// missing trailing cells are empty, surplus cells are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .enumerate()
            .map(|(i, h)| if i == 0 { h.trim_start_matches('\u{feff}').to_string() } else { h.to_string() })
            .collect();

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        let mut n_rows = 0usize;
        for record in rdr.records() {
            let record = record?;
            for (ci, col) in columns.iter_mut().enumerate() {
                let cell = record.get(ci).filter(|c| !c.trim().is_empty()).map(str::to_string);
                col.push(cell);
            }
            n_rows += 1;
        }

        tracing::debug!(rows = n_rows, columns = headers.len(), "read raw table");
        Ok(Self { headers, columns, n_rows })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Cells of the first column whose header is exactly `name`.
    pub fn column(&self, name: &str) -> Option<&[Option<String>]> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Copy with every header trimmed of surrounding whitespace.
    pub fn with_trimmed_headers(&self) -> Self {
        Self {
            headers: self.headers.iter().map(|h| h.trim().to_string()).collect(),
            columns: self.columns.clone(),
            n_rows: self.n_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headers_and_cells() {
        let csv = "Species,DBH\nQR,10.5\nTC,\n";
        let t = RawTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(t.headers(), &["Species".to_string(), "DBH".to_string()]);
        assert_eq!(t.n_rows(), 2);
        let dbh = t.column("DBH").unwrap();
        assert_eq!(dbh[0].as_deref(), Some("10.5"));
        assert_eq!(dbh[1], None);
    }

    #[test]
    fn tolerates_ragged_rows() {
        let csv = "A,B,C\n1,2\n1,2,3,4\n";
        let t = RawTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.column("C").unwrap()[0], None);
        assert_eq!(t.column("C").unwrap()[1].as_deref(), Some("3"));
    }

    #[test]
    fn strips_bom_from_first_header() {
        let csv = "\u{feff}Species,DBH\nQR,1\n";
        let t = RawTable::from_reader(csv.as_bytes()).unwrap();
        assert!(t.column("Species").is_some());
    }

    #[test]
    fn trimmed_headers_match() {
        let t = RawTable::from_columns(vec![(" DBH ", vec![Some("1".to_string())])]);
        assert!(t.column("DBH").is_none());
        assert!(t.with_trimmed_headers().column("DBH").is_some());
    }

    #[test]
    fn from_columns_pads_short_columns() {
        let t = RawTable::from_columns(vec![
            ("A", vec![Some("1".to_string()), Some("2".to_string())]),
            ("B", vec![Some("x".to_string())]),
        ]);
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.column("B").unwrap()[1], None);
    }
}
