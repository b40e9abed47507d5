//! Lenient sales-date parsing.
//!
//! Uploaded sheets come from a variety of tools, so we accept a small set of
//! common layouts. Slash dates are read month-first (`MM/DD/YYYY`).

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const DATE_FMTS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%B %d, %Y", "%b %d %Y"];
const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Parse a sales date; `None` if no supported layout matches.
pub fn parse_sales_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    // Year-month only (`2024-03`) is the first of that month.
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").ok()
}

/// Calendar month (1–12) of a sales date.
pub fn parse_month(s: &str) -> Option<u32> {
    parse_sales_date(s).map(|d| d.month())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_layouts() {
        assert_eq!(parse_month("2024-01-15"), Some(1));
        assert_eq!(parse_month("2024/02/15"), Some(2));
        assert_eq!(parse_month("03/04/2024"), Some(3));
        assert_eq!(parse_month("2024-04"), Some(4));
        assert_eq!(parse_month("2024-05-01T10:30:00"), Some(5));
        assert_eq!(parse_month("2024-06-01T10:30:00Z"), Some(6));
        assert_eq!(parse_month("July 4, 2024"), Some(7));
        assert_eq!(parse_month("Aug 9 2024"), Some(8));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_month("not-a-date"), None);
        assert_eq!(parse_month("2024-13-01"), None);
        assert_eq!(parse_month(""), None);
    }
}
