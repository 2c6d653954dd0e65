//! Archive file naming for daily broadcast ephemerides.
//!
//! Files live at `<root>/<yyyy>/brdc/brdc<ddd>0.<yy>n.gz`, e.g.
//! `brdc0880.25n.gz` for day 88 of 2025. The trailing `0` of the day token
//! is the session number and never changes, `n` marks GPS navigation data.

use chrono::{Datelike, NaiveDate};

/// Ordinal day of the year, January 1st is day 1.
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

/// Four character day token: day of year padded to three digits plus `0`.
pub fn day_token(day_of_year: u32) -> String {
    format!("{day_of_year:03}0")
}

/// Year token: years since 2000, not padded.
pub fn year_token(year: i32) -> String {
    (year - 2000).to_string()
}

/// Compressed ephemeris file name for a date, e.g. `brdc0880.25n.gz`.
pub fn file_name(date: NaiveDate) -> String {
    format!(
        "brdc{}.{}n.gz",
        day_token(day_of_year(date)),
        year_token(date.year())
    )
}

/// Full download URL of the ephemeris file for `date` under `root`.
pub fn build_url(root: &str, date: NaiveDate) -> String {
    format!(
        "{}/{}/brdc/{}",
        root.trim_end_matches('/'),
        date.year(),
        file_name(date)
    )
}

/// Last path segment of a URL, `None` if the URL ends with a slash.
pub fn url_file_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => Some(name),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ARCHIVE_ROOT;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_day_of_year() {
        assert_eq!(day_of_year(date(2025, 1, 1)), 1);
        assert_eq!(day_of_year(date(2025, 3, 29)), 88);
        assert_eq!(day_of_year(date(2025, 12, 31)), 365);
        assert_eq!(day_of_year(date(2024, 12, 31)), 366);
    }

    #[test]
    fn test_day_token_padding() {
        assert_eq!(day_token(1), "0010");
        assert_eq!(day_token(9), "0090");
        assert_eq!(day_token(88), "0880");
        assert_eq!(day_token(99), "0990");
        assert_eq!(day_token(100), "1000");
        assert_eq!(day_token(366), "3660");
    }

    #[test]
    fn test_year_token() {
        assert_eq!(year_token(2025), "25");
        assert_eq!(year_token(2010), "10");
        assert_eq!(year_token(2000), "0");
    }

    #[test]
    fn test_build_url() {
        let url = build_url(ARCHIVE_ROOT, date(2025, 3, 29));
        assert_eq!(
            url,
            "https://cddis.nasa.gov/archive/gnss/data/daily/2025/brdc/brdc0880.25n.gz"
        );
    }

    #[test]
    fn test_build_url_trailing_slash_root() {
        let url = build_url("http://mirror.local/daily/", date(2024, 12, 31));
        assert_eq!(url, "http://mirror.local/daily/2024/brdc/brdc3660.24n.gz");
    }

    #[test]
    fn test_build_url_deterministic() {
        let d = date(2025, 7, 4);
        assert_eq!(build_url(ARCHIVE_ROOT, d), build_url(ARCHIVE_ROOT, d));
    }

    #[test]
    fn test_url_file_name() {
        let url = build_url(ARCHIVE_ROOT, date(2025, 1, 1));
        assert_eq!(url_file_name(&url), Some("brdc0010.25n.gz"));
        assert_eq!(url_file_name("https://host/a/b.gz?x=1"), Some("b.gz"));
        assert_eq!(url_file_name("https://host/dir/"), None);
        assert_eq!(url_file_name("no-slash"), None);
    }
}
