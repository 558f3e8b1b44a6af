//! Sheet date parsing and formatting.
//!
//! The sheet holds dates typed by hand, so several shapes turn up in the
//! same column. Every accepted shape normalizes to one canonical value
//! whose string form is `YYYY-MM` (month precision) or `YYYY-MM-DD`.
//!
//! Accepted shapes:
//! - `Month YYYY` (`January 2024`, `Sept 2023`)
//! - `Mon YY` (`Jan 24`, two-digit years are read as 20YY)
//! - `D Mon YYYY` (`5 Jan 2024`)
//! - `YYYY-MM` and `YYYY-MM-DD`
//!
//! Anything else is [`SheetDate::Unknown`]. Parsing never fails.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A date as recorded in the sheet, at month or day precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum SheetDate {
    /// Blank or unrecognised cell.
    #[default]
    Unknown,
    /// Month precision (`Jan 2024`).
    Month { year: i32, month: u32 },
    /// Day precision (`5 Jan 2024`).
    Day(NaiveDate),
}

impl SheetDate {
    /// Build a month-precision date. Returns `Unknown` for an invalid month.
    pub fn month(year: i32, month: u32) -> Self {
        if (1..=12).contains(&month) {
            SheetDate::Month { year, month }
        } else {
            SheetDate::Unknown
        }
    }

    /// Build a day-precision date. Returns `Unknown` for an invalid day.
    pub fn day(year: i32, month: u32, day: u32) -> Self {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(SheetDate::Day)
            .unwrap_or(SheetDate::Unknown)
    }

    /// Parse any accepted shape; unrecognised input yields `Unknown`.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return SheetDate::Unknown;
        }

        if let Some(date) = parse_iso(trimmed) {
            return date;
        }

        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        match tokens.as_slice() {
            [month, year] => match (month_number(month), parse_year(year)) {
                (Some(month), Some(year)) => SheetDate::month(year, month),
                _ => SheetDate::Unknown,
            },
            [day, month, year] => {
                match (day.parse::<u32>().ok(), month_number(month), parse_year(year)) {
                    (Some(day), Some(month), Some(year)) => SheetDate::day(year, month, day),
                    _ => SheetDate::Unknown,
                }
            }
            _ => SheetDate::Unknown,
        }
    }

    /// Whether the cell held a recognised date.
    pub fn is_known(&self) -> bool {
        !matches!(self, SheetDate::Unknown)
    }

    /// Canonical `YYYY-MM[-DD]` form, empty when unknown.
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// The form written back to the sheet: `D Mon YYYY` or `Mon YYYY`.
    pub fn to_sheet(&self) -> String {
        match self {
            SheetDate::Unknown => String::new(),
            SheetDate::Month { year, month } => {
                format!("{} {}", abbreviation(*month), year)
            }
            SheetDate::Day(date) => format!(
                "{} {} {}",
                date.day(),
                abbreviation(date.month()),
                date.year()
            ),
        }
    }
}

impl fmt::Display for SheetDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetDate::Unknown => Ok(()),
            SheetDate::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            SheetDate::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl From<NaiveDate> for SheetDate {
    fn from(date: NaiveDate) -> Self {
        SheetDate::Day(date)
    }
}

impl Serialize for SheetDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SheetDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SheetDate::parse(&raw))
    }
}

fn abbreviation(month: u32) -> &'static str {
    MONTH_ABBREVIATIONS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// Match a month token: a full name or any prefix of at least three letters.
fn month_number(token: &str) -> Option<u32> {
    let token = token.trim_end_matches('.').to_ascii_lowercase();
    if token.len() < 3 || !token.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|name| name.starts_with(&token))
        .map(|i| i as u32 + 1)
}

fn parse_year(token: &str) -> Option<i32> {
    if !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    match token.len() {
        2 => token.parse::<i32>().ok().map(|yy| 2000 + yy),
        4 => token.parse().ok(),
        _ => None,
    }
}

fn parse_iso(input: &str) -> Option<SheetDate> {
    fn digits(s: &str, len: usize) -> bool {
        s.len() == len && s.chars().all(|c| c.is_ascii_digit())
    }

    let parts: Vec<&str> = input.split('-').collect();

    match parts.as_slice() {
        [year, month] if digits(year, 4) && digits(month, 2) => {
            let date = SheetDate::month(year.parse().ok()?, month.parse().ok()?);
            date.is_known().then_some(date)
        }
        [year, month, day] if digits(year, 4) && digits(month, 2) && digits(day, 2) => {
            let date = SheetDate::day(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?);
            date.is_known().then_some(date)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepted_shapes() {
        assert_eq!(SheetDate::parse("January 2024").canonical(), "2024-01");
        assert_eq!(SheetDate::parse("Sept 2023").canonical(), "2023-09");
        assert_eq!(SheetDate::parse("Jan 24").canonical(), "2024-01");
        assert_eq!(SheetDate::parse("5 Jan 2024").canonical(), "2024-01-05");
        assert_eq!(SheetDate::parse("2024-03").canonical(), "2024-03");
        assert_eq!(SheetDate::parse("2024-03-17").canonical(), "2024-03-17");
        assert_eq!(SheetDate::parse("  mar 2021 ").canonical(), "2021-03");
    }

    #[test]
    fn unrecognised_shapes_are_unknown() {
        for input in [
            "",
            "   ",
            "soon",
            "13/01/2024",
            "Ja 2024",
            "2024",
            "2024-13",
            "2024-02-30",
            "31 Feb 2024",
            "Jan 202",
            "5 Jan 2024 extra",
        ] {
            assert_eq!(SheetDate::parse(input), SheetDate::Unknown, "{input:?}");
        }
    }

    #[test]
    fn format_for_sheet() {
        assert_eq!(SheetDate::parse("2024-01-05").to_sheet(), "5 Jan 2024");
        assert_eq!(SheetDate::parse("2023-09").to_sheet(), "Sep 2023");
        assert_eq!(SheetDate::Unknown.to_sheet(), "");
    }

    #[test]
    fn reformatting_is_idempotent() {
        for input in ["March 2022", "Oct 19", "28 Feb 2024", "2020-06", "2020-06-01"] {
            let first = SheetDate::parse(input);
            let second = SheetDate::parse(&first.to_sheet());
            assert_eq!(first, second, "{input:?}");
            assert_eq!(first.canonical(), second.canonical());
        }
    }

    #[test]
    fn serde_uses_canonical_form() {
        let date = SheetDate::day(2024, 1, 5);
        let json = serde_json::to_string(&date).unwrap();
        assert_eq!(json, r#""2024-01-05""#);

        let parsed: SheetDate = serde_json::from_str(r#""Jan 24""#).unwrap();
        assert_eq!(parsed, SheetDate::month(2024, 1));

        let unknown: SheetDate = serde_json::from_str(r#""""#).unwrap();
        assert_eq!(unknown, SheetDate::Unknown);
    }
}
