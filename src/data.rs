//! Value parsing rules shared by inference and serialization.
//!
//! Every type check performed while narrowing a field's candidacy flags, and
//! every conversion performed while rendering a SQL literal, goes through the
//! parsers in this module so that both passes agree on what "parses" means.

use std::{fmt, str::FromStr, sync::OnceLock};

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use clap::ValueEnum;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Output format for timestamps written into SQL literals.
pub const CANONICAL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// How ambiguous numeric dates such as `05/06/2024` are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum DateOrder {
    #[default]
    MonthFirst,
    DayFirst,
}

impl DateOrder {
    fn numeric_date_formats(self) -> &'static [&'static str] {
        match self {
            DateOrder::MonthFirst => &["%m/%d/%Y", "%m-%d-%Y"],
            DateOrder::DayFirst => &["%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"],
        }
    }

    fn numeric_datetime_formats(self) -> &'static [&'static str] {
        match self {
            DateOrder::MonthFirst => &[
                "%m/%d/%Y %I:%M:%S %p",
                "%m/%d/%Y %I:%M %p",
                "%m/%d/%Y %H:%M:%S",
                "%m/%d/%Y %H:%M",
                "%m-%d-%Y %H:%M:%S",
            ],
            DateOrder::DayFirst => &[
                "%d/%m/%Y %H:%M:%S",
                "%d/%m/%Y %H:%M",
                "%d/%m/%Y %I:%M:%S %p",
                "%d-%m-%Y %H:%M:%S",
                "%d.%m.%Y %H:%M:%S",
            ],
        }
    }
}

impl fmt::Display for DateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateOrder::MonthFirst => f.write_str("month-first"),
            DateOrder::DayFirst => f.write_str("day-first"),
        }
    }
}

impl FromStr for DateOrder {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "month-first" | "mdy" | "en-us" => Ok(DateOrder::MonthFirst),
            "day-first" | "dmy" | "en-gb" => Ok(DateOrder::DayFirst),
            other => Err(anyhow!(
                "Unknown date order '{other}' (expected month-first or day-first)"
            )),
        }
    }
}

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const NAMED_MONTH_FORMATS: &[&str] = &["%d %b %Y", "%b %d, %Y", "%B %d, %Y", "%d %B %Y"];

pub fn parse_integer(value: &str) -> Option<i32> {
    value.parse::<i32>().ok()
}

fn grouped_decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("grouped decimal pattern compiles")
    })
}

/// Parses a plain or comma-grouped decimal. Underscore digit separators are
/// rejected even though `Decimal::from_str` skips them.
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    if value.contains('_') {
        return None;
    }
    if let Ok(parsed) = Decimal::from_str(value) {
        return Some(parsed);
    }
    if grouped_decimal_pattern().is_match(value) {
        return Decimal::from_str(&value.replace(',', "")).ok();
    }
    None
}

pub fn parse_boolean(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parses a date or timestamp the way a US or European spreadsheet export
/// would write one. Date-only values resolve to midnight.
pub fn parse_datetime(value: &str, order: DateOrder) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    let datetime_formats = ISO_DATETIME_FORMATS
        .iter()
        .chain(order.numeric_datetime_formats());
    for fmt in datetime_formats {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(parsed);
        }
    }
    let date_formats = ISO_DATE_FORMATS
        .iter()
        .chain(order.numeric_date_formats())
        .chain(NAMED_MONTH_FORMATS);
    for fmt in date_formats {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, fmt) {
            return Some(parsed.and_time(NaiveTime::MIN));
        }
    }
    None
}

pub fn format_datetime(value: &NaiveDateTime) -> String {
    value.format(CANONICAL_DATETIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn integer_parsing_is_bounded_to_32_bits() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("-7"), Some(-7));
        assert_eq!(parse_integer("+7"), Some(7));
        assert_eq!(parse_integer("2147483647"), Some(i32::MAX));
        assert_eq!(parse_integer("2147483648"), None);
        assert_eq!(parse_integer("1.0"), None);
        assert_eq!(parse_integer("abc"), None);
    }

    #[test]
    fn decimal_parsing_accepts_grouping_separators() {
        assert_eq!(parse_decimal("12.50").unwrap().to_string(), "12.50");
        assert_eq!(parse_decimal("-3").unwrap().to_string(), "-3");
        assert_eq!(parse_decimal("1,234.5").unwrap().to_string(), "1234.5");
        assert_eq!(parse_decimal("12,345,678").unwrap().to_string(), "12345678");
        assert!(parse_decimal("1,23").is_none());
        assert!(parse_decimal("12.5.1").is_none());
        assert!(parse_decimal("$5").is_none());
        assert!(parse_decimal("1_000").is_none());
        assert!(parse_decimal("1_000.5").is_none());
    }

    #[test]
    fn boolean_parsing_only_accepts_true_and_false() {
        assert_eq!(parse_boolean("TRUE"), Some(true));
        assert_eq!(parse_boolean("False"), Some(false));
        assert_eq!(parse_boolean("yes"), None);
        assert_eq!(parse_boolean("1"), None);
    }

    #[test]
    fn datetime_parsing_supports_iso_and_named_months() {
        let expected = at(2024, 5, 6, 14, 30, 0);
        assert_eq!(
            parse_datetime("2024-05-06 14:30:00", DateOrder::MonthFirst),
            Some(expected)
        );
        assert_eq!(
            parse_datetime("2024-05-06T14:30", DateOrder::MonthFirst),
            Some(expected)
        );
        assert_eq!(
            parse_datetime("2024-05-06T14:30:00+02:00", DateOrder::MonthFirst),
            Some(expected)
        );
        assert_eq!(
            parse_datetime("May 6, 2024", DateOrder::MonthFirst),
            Some(at(2024, 5, 6, 0, 0, 0))
        );
        assert_eq!(
            parse_datetime("6 May 2024", DateOrder::DayFirst),
            Some(at(2024, 5, 6, 0, 0, 0))
        );
    }

    #[test]
    fn datetime_parsing_honours_date_order() {
        assert_eq!(
            parse_datetime("05/06/2024", DateOrder::MonthFirst),
            Some(at(2024, 5, 6, 0, 0, 0))
        );
        assert_eq!(
            parse_datetime("05/06/2024", DateOrder::DayFirst),
            Some(at(2024, 6, 5, 0, 0, 0))
        );
        assert_eq!(
            parse_datetime("1/5/2024 3:04:05 PM", DateOrder::MonthFirst),
            Some(at(2024, 1, 5, 15, 4, 5))
        );
        assert!(parse_datetime("13/25/2024", DateOrder::MonthFirst).is_none());
    }

    #[test]
    fn datetime_parsing_rejects_plain_numbers_and_words() {
        assert!(parse_datetime("2024", DateOrder::MonthFirst).is_none());
        assert!(parse_datetime("42", DateOrder::DayFirst).is_none());
        assert!(parse_datetime("true", DateOrder::MonthFirst).is_none());
    }

    #[test]
    fn canonical_format_only_prints_fraction_when_present() {
        assert_eq!(format_datetime(&at(2024, 1, 2, 3, 4, 5)), "2024-01-02 03:04:05");
        let fractional = parse_datetime("2024-01-02 03:04:05.250", DateOrder::MonthFirst).unwrap();
        assert_eq!(format_datetime(&fractional), "2024-01-02 03:04:05.250");
    }

    #[test]
    fn date_order_parses_from_config_tokens() {
        assert_eq!("dmy".parse::<DateOrder>().unwrap(), DateOrder::DayFirst);
        assert_eq!(
            "Month-First".parse::<DateOrder>().unwrap(),
            DateOrder::MonthFirst
        );
        assert!("ymd".parse::<DateOrder>().is_err());
    }
}
