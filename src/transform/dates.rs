//! Day-first date parser
//!
//! Reads ambiguous dates the way they are written in the source data:
//! `03/04/2021` is the 3rd of April.

use crate::etl::Transformer;
use crate::table::{ColumnType, Table, Value};
use chrono::NaiveDate;
use eyre::{Context, Result, eyre};
use regex::Regex;
use std::sync::LazyLock;

static YEAR_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})([/.\-])(\d{1,2})([/.\-])(\d{1,2})(?:[T ].*)?$").unwrap()
});

static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})([/.\-])(\d{1,2})([/.\-])(\d{4}|\d{2})(?:[T ].*)?$").unwrap()
});

const MONTH_NAME_FORMATS: &[&str] = &[
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
    "%b %d %Y",
    "%B %d, %Y",
];

/// Parse a date, reading `d/m/y` style input day first
///
/// Accepts `/`, `-` and `.` separators, two or four digit years, year-first
/// `YYYY-MM-DD` in any of those separators (with an optional time part,
/// which is discarded), and month names such as `3 Dec 2016`. Two digit
/// years 69-99 are 19xx, 00-68 are 20xx. When the day-first reading is not
/// a valid date but the month-first one is (`12/25/2016`), the month-first
/// reading is used and a warning is logged.
pub fn parse_day_first(input: &str) -> Result<NaiveDate> {
    let input = input.trim();

    if let Some(caps) = YEAR_FIRST.captures(input) {
        if caps[2] != caps[4] {
            eyre::bail!("Mixed separators in date '{}'", input);
        }
        let year = caps[1].parse::<i32>()?;
        return NaiveDate::from_ymd_opt(year, caps[3].parse()?, caps[5].parse()?)
            .ok_or_else(|| eyre!("Date '{}' is out of range", input));
    }

    if let Some(caps) = DAY_FIRST.captures(input) {
        if caps[2] != caps[4] {
            eyre::bail!("Mixed separators in date '{}'", input);
        }
        let year = caps[5].parse::<i32>()?;
        let year = match caps[5].len() {
            2 if year >= 69 => 1900 + year,
            2 => 2000 + year,
            _ => year,
        };
        let first = caps[1].parse::<u32>()?;
        let second = caps[3].parse::<u32>()?;

        if let Some(date) = NaiveDate::from_ymd_opt(year, second, first) {
            return Ok(date);
        }
        if let Some(date) = NaiveDate::from_ymd_opt(year, first, second) {
            log::warn!("Date '{}' is not valid day first, reading it month first", input);
            return Ok(date);
        }
        eyre::bail!("Date '{}' is out of range", input);
    }

    MONTH_NAME_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .ok_or_else(|| eyre!("Unrecognized date '{}'", input))
}

/// Transformer that parses a text column into dates, day first
///
/// Missing values stay missing; any other unparsable value is an error.
pub struct DayFirstDateParser {
    column: String,
}

impl DayFirstDateParser {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }
}

impl Default for DayFirstDateParser {
    fn default() -> Self {
        Self::new("date")
    }
}

impl Transformer for DayFirstDateParser {
    type Input = Table;
    type Output = Table;

    fn transform(&self, mut input: Self::Input) -> Result<Self::Output> {
        let column = self.column.as_str();
        input.map_column(column, ColumnType::Date, |row, value| match value {
            v if v.is_missing() => Ok(Value::Null),
            Value::Date(d) => Ok(Value::Date(*d)),
            Value::Text(s) => parse_day_first(s)
                .map(Value::Date)
                .with_context(|| format!("Row {}: cannot parse '{}' as a date", row, column)),
            other => Err(eyre!(
                "Row {}: '{}' holds {:?}, not a date",
                row,
                column,
                other
            )),
        })?;
        Ok(input)
    }
}
