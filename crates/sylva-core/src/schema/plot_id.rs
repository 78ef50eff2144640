//! Plot identity: composite `{plot}-{subplot}` ids and their
//! `{plot} - {subplot}` display form.

use super::coerce::{clean_text, coerce_f64, format_number};

/// Numeric-looking parts read as numbers (`"01"` and `"1.0"` both become
/// `"1"`); anything else is kept as cleaned text.
fn canonical_part(s: &str) -> String {
    let cleaned = clean_text(s);
    match coerce_f64(&cleaned) {
        Some(v) => format_number(v),
        None => cleaned,
    }
}

/// Collapse the spaces around every hyphen: `"1 - 1"` → `"1-1"`.
pub fn collapse_hyphen_spaces(s: &str) -> String {
    clean_text(s).split('-').map(str::trim).collect::<Vec<_>>().join("-")
}

/// Canonical id for a single plot-like value or a user-supplied label.
pub fn canonical_plot_id(s: &str) -> String {
    let collapsed = collapse_hyphen_spaces(s);
    if collapsed.contains('-') {
        // Composite ids are canonicalized part by part; a leading '-' is a sign.
        if let Some(v) = coerce_f64(&collapsed) {
            return format_number(v);
        }
        return collapsed.split('-').map(canonical_part).collect::<Vec<_>>().join("-");
    }
    canonical_part(&collapsed)
}

/// Display form of an id: `"1-1"` → `"1 - 1"`.
pub fn display_plot_label(id: &str) -> String {
    collapse_hyphen_spaces(id).split('-').collect::<Vec<_>>().join(" - ")
}

/// Composite `(plot_id, display_label)` for a plot/subplot pair.
pub fn composite_plot_id(plot: &str, subplot: &str) -> Option<(String, String)> {
    let p = canonical_part(plot);
    let s = canonical_part(subplot);
    if p.is_empty() || s.is_empty() {
        return None;
    }
    Some((format!("{p}-{s}"), format!("{p} - {s}")))
}
