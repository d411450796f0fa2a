//! Publication year extraction.
//!
//! `PubDate` carries either a structured `<Year>` or a free-text
//! `<MedlineDate>` such as `"1998 Dec-1999 Jan"` or `"2000 Spring"`. The year
//! is the first four characters of the first candidate that has them as
//! digits; `<Year>` takes precedence.

/// Picks the year from `<Year>` then `<MedlineDate>`; empty if neither
/// starts with four ASCII digits.
#[must_use]
pub fn extract_year(year: Option<&str>, medline_date: Option<&str>) -> String {
    [year, medline_date]
        .into_iter()
        .flatten()
        .find_map(leading_year)
        .unwrap_or_default()
}

fn leading_year(value: &str) -> Option<String> {
    let prefix: String = value.trim_start().chars().take(4).collect();
    (prefix.len() == 4 && prefix.chars().all(|c| c.is_ascii_digit())).then_some(prefix)
}
