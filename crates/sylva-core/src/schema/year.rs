//! Year derivation from date strings.
//!
//! Day/month order is not assumed: dates are tried day-first, then
//! month-first, then year-first. Only the year is kept, so an ambiguous
//! `03/04/2015` resolves to 2015 either way.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%d/%m/%y",
    "%m/%d/%y",
    "%d-%m-%y",
    "%d-%b-%Y",
    "%d-%b-%y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

fn plausible(year: i32) -> Option<i32> {
    (1000..=9999).contains(&year).then_some(year)
}

/// Year component of a date cell, or `None` when no known format matches.
pub fn parse_date_year(s: &str) -> Option<i32> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return plausible(dt.year());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            if let Some(y) = plausible(dt.year()) {
                return Some(y);
            }
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            if let Some(y) = plausible(d.year()) {
                return Some(y);
            }
        }
    }

    // A bare four-digit year reads as January 1st of that year.
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        return s.parse().ok().and_then(plausible);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_first_and_month_first() {
        assert_eq!(parse_date_year("25/06/2015"), Some(2015));
        assert_eq!(parse_date_year("06/25/2015"), Some(2015));
        assert_eq!(parse_date_year("03/04/2012"), Some(2012));
    }

    #[test]
    fn iso_and_datetimes() {
        assert_eq!(parse_date_year("2010-07-01"), Some(2010));
        assert_eq!(parse_date_year("2010-07-01 13:45:00"), Some(2010));
        assert_eq!(parse_date_year("2010-07-01T13:45:00Z"), Some(2010));
    }

    #[test]
    fn two_digit_years_do_not_become_year_ten() {
        assert_eq!(parse_date_year("01/02/10"), Some(2010));
    }

    #[test]
    fn month_names_and_bare_years() {
        assert_eq!(parse_date_year("15 Jun 2018"), Some(2018));
        assert_eq!(parse_date_year("June 15, 2018"), Some(2018));
        assert_eq!(parse_date_year("2021"), Some(2021));
    }

    #[test]
    fn spreadsheet_exports() {
        assert_eq!(parse_date_year("25-Jun-2015"), Some(2015));
        assert_eq!(parse_date_year("25-Jun-15"), Some(2015));
        assert_eq!(parse_date_year("2015/06/25 08:30:00"), Some(2015));
    }

    #[test]
    fn garbage_is_missing_not_an_error() {
        assert_eq!(parse_date_year("not a date"), None);
        assert_eq!(parse_date_year("32/13/2015"), None);
        assert_eq!(parse_date_year(""), None);
    }
}
