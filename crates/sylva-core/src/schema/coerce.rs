//! Cell-level cleanup. Nothing here fails: bad input becomes `None`.

/// Collapse every whitespace run (including non-breaking spaces) to a single
/// ASCII space and trim the ends.
pub fn clean_text(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cleaned text, or `None` when nothing is left.
pub fn text_cell(cell: Option<&str>) -> Option<String> {
    cell.map(clean_text).filter(|s| !s.is_empty())
}

/// Parse a finite number, tolerating surrounding whitespace.
pub fn coerce_f64(s: &str) -> Option<f64> {
    clean_text(s).parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a whole-number year such as `"2015"`, `" 2015 "` or `"2015.0"`.
pub fn coerce_year(s: &str) -> Option<i32> {
    let v = coerce_f64(s)?;
    if v.fract() != 0.0 || !(1.0..=9999.0).contains(&v) {
        return None;
    }
    Some(v as i32)
}

/// Render a number the way a plot or subplot identifier reads: integral
/// values without a fractional part.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
