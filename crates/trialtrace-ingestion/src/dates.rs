//! Best-effort parsing of loosely structured date text.
//!
//! Accepted grammar, in the forms the registry actually emits:
//!   - ISO full date:   2021-05-01
//!   - ISO year-month:  2019-06        (first of month)
//!   - Month day, year: June 15, 2019 / Jun 15, 2019
//!   - Month year:      June 2019 / Jun 2019  (first of month)
//!
//! Anything else is left to the caller, which keeps the verbatim text so the
//! record stays inspectable when parsing is inconclusive.

use chrono::NaiveDate;

pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(t, "%Y-%m-%d") {
        return Some(d);
    }

    // Year-month: anchor to the first of the month
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{}-01", t), "%Y-%m-%d") {
        return Some(d);
    }

    for fmt in ["%B %d, %Y", "%b %d, %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d);
        }
    }

    // "June 2019" — anchor to the first of the month
    let parts: Vec<&str> = t.split_whitespace().collect();
    if parts.len() == 2 {
        let anchored = format!("{} 1, {}", parts[0], parts[1]);
        for fmt in ["%B %d, %Y", "%b %d, %Y"] {
            if let Ok(d) = NaiveDate::parse_from_str(&anchored, fmt) {
                return Some(d);
            }
        }
    }

    None
}
