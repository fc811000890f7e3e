//! Normalization of Spanish long-form dates.
//!
//! The source site prints dates like `lunes 13 de febrero de 2025`. The
//! [`DateNormalizer`] turns that into `2025-02-13`:
//!
//! 1. Lower-case the text and drop the first whitespace-separated token
//!    (the day-of-week name)
//! 2. Substitute every month name with its two-digit number
//! 3. Parse `day de month de year` and reformat as `YYYY-MM-DD`
//!
//! Anything that fails to parse is logged and becomes `None`.

use crate::error::DateParseError;
use chrono::NaiveDate;
use tracing::warn;

/// Spanish month names and their two-digit numbers.
pub const SPANISH_MONTHS: [(&str, &str); 12] = [
    ("enero", "01"),
    ("febrero", "02"),
    ("marzo", "03"),
    ("abril", "04"),
    ("mayo", "05"),
    ("junio", "06"),
    ("julio", "07"),
    ("agosto", "08"),
    ("septiembre", "09"),
    ("octubre", "10"),
    ("noviembre", "11"),
    ("diciembre", "12"),
];

const PARSE_FORMAT: &str = "%d de %m de %Y";
const OUTPUT_FORMAT: &str = "%Y-%m-%d";

/// Converts raw `<time>` text into ISO-8601 calendar dates.
///
/// Pure and deterministic: the month table is a read-only constant and
/// nothing is cached between calls.
#[derive(Debug, Clone, Copy)]
pub struct DateNormalizer {
    months: &'static [(&'static str, &'static str)],
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::spanish()
    }
}

impl DateNormalizer {
    /// Normalizer for the Spanish month names used on the source site.
    pub const fn spanish() -> Self {
        DateNormalizer {
            months: &SPANISH_MONTHS,
        }
    }

    /// Normalize raw date text, logging and discarding anything unparseable.
    pub fn normalize(&self, raw: Option<&str>) -> Option<String> {
        let raw = raw?;
        match self.parse(raw) {
            Ok(date) => Some(date.format(OUTPUT_FORMAT).to_string()),
            Err(e) => {
                warn!(input = %raw, error = %e, "Date parsing failed");
                None
            }
        }
    }

    /// Parse `<dow> <day> de <month-name> de <year>` into a calendar date.
    pub fn parse(&self, raw: &str) -> Result<NaiveDate, DateParseError> {
        let lowered = raw.to_lowercase();
        if lowered.trim().is_empty() {
            return Err(DateParseError::Empty);
        }

        let mut text = lowered.split_whitespace().skip(1).collect::<Vec<_>>().join(" ");
        for (name, number) in self.months {
            text = text.replace(name, number);
        }

        NaiveDate::parse_from_str(&text, PARSE_FORMAT)
            .map_err(|source| DateParseError::Malformed { input: text, source })
    }
}
