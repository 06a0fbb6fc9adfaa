//! Date label normalization and the rolling date window.
//!
//! Search result cards carry free-form labels such as `"Updated on 3 Jan 2024"`,
//! `"Last update 5 hours ago"` or `"Wednesday"`. [`normalize_relative_to`] turns
//! those into a calendar date; [`is_within_window`] decides whether that date is
//! recent enough to keep.
//!
//! # Marker Words
//!
//! Everything up to and including the first marker word is discarded. Markers
//! are tried in a fixed order (`on`, `updated`, `update`), case-insensitively
//! and as whole words, so `"Monday"` is never split on its inner `"on"`.
//!
//! # Accepted Forms
//!
//! | Form | Example |
//! |------|---------|
//! | RFC 3339 timestamp | `2024-01-03T10:15:00Z` |
//! | Day month year | `3 Jan 2024`, `3rd January 2024 - 10:15 GMT` |
//! | Month day year | `Jan 3, 2024` |
//! | Day month (current year) | `3 Jan` |
//! | Numeric | `2024-01-03`, `2024/01/03`, `01/03/2024` (month first) |
//! | Weekday | `Wednesday` (most recent, on or before today) |
//! | Relative | `today`, `yesterday`, `5 hours ago`, `a week ago` |

use crate::error::DateParseError;
use chrono::{DateTime, Datelike, Duration, Local, Months, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// Marker words in priority order.
const MARKERS: [&str; 3] = ["on", "updated", "update"];

static MARKER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    MARKERS
        .iter()
        .map(|m| Regex::new(&format!(r"(?i)\b{m}\b")).unwrap())
        .collect()
});

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})(?:st|nd|rd|th)\b").unwrap());

static RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d+|an?|one)\s+(seconds?|secs?|minutes?|mins?|hours?|hrs?|days?|weeks?|months?|years?)\s+ago$",
    )
    .unwrap()
});

/// Earliest year a four-digit `%Y` match is trusted for. `%Y` accepts any
/// digit count, so `24` would otherwise read as the year 24.
const MIN_YEAR: i32 = 1000;

/// Formats tried against the whole cleaned label, longest forms first.
const TEXT_FORMATS: [&str; 3] = ["%d %B %Y", "%B %d %Y", "%Y %B %d"];

/// Numeric formats; US month-first ordering wins over day-first.
const NUMERIC_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
];

/// Normalize a date label against the local calendar date.
///
/// See [`normalize_relative_to`].
pub fn normalize(label: &str) -> Result<Option<NaiveDate>, DateParseError> {
    normalize_relative_to(label, Local::now().date_naive())
}

/// Normalize a free-form date label into a calendar date.
///
/// Relative phrasing and bare weekday names are resolved against `today`.
///
/// # Returns
///
/// - `Ok(None)` for an empty or whitespace-only label
/// - `Ok(Some(date))` when the text after the marker word parses
/// - `Err(DateParseError)` otherwise
pub fn normalize_relative_to(
    label: &str,
    today: NaiveDate,
) -> Result<Option<NaiveDate>, DateParseError> {
    if label.trim().is_empty() {
        return Ok(None);
    }

    let remainder = strip_marker(label).trim();
    let parsed = parse_date_text(remainder, today);
    trace!(%label, %remainder, ?parsed, "Normalized date label");

    parsed.map(Some).ok_or_else(|| DateParseError {
        input: label.to_string(),
    })
}

/// `true` iff `date` is on or after `cutoff`.
pub fn is_within_window(date: NaiveDate, cutoff: NaiveDate) -> bool {
    date >= cutoff
}

/// `today` minus `months_back` calendar months, clamped to the end of a
/// shorter month (31 March minus one month is 29 February in a leap year).
pub fn cutoff_date(today: NaiveDate, months_back: u32) -> NaiveDate {
    today
        .checked_sub_months(Months::new(months_back))
        .unwrap_or(NaiveDate::MIN)
}

/// Drop everything up to and including the first marker word.
fn strip_marker(label: &str) -> &str {
    for pattern in MARKER_PATTERNS.iter() {
        if let Some(found) = pattern.find(label) {
            return &label[found.end()..];
        }
    }
    label
}

fn parse_date_text(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.date_naive());
    }

    let cleaned = clean(text);
    match cleaned.as_str() {
        "today" | "now" | "just now" => return Some(today),
        "yesterday" => return today.checked_sub_signed(Duration::days(1)),
        _ => {}
    }

    if let Some(date) = parse_relative(&cleaned, today) {
        return Some(date);
    }

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if let Some(first) = tokens.first() {
        if let Ok(weekday) = first.parse::<Weekday>() {
            if tokens.len() == 1 {
                return Some(most_recent_weekday(weekday, today));
            }
            tokens.remove(0);
        }
    }

    parse_absolute(&tokens.join(" "), today)
}

/// Two-digit years, tried only after every four-digit form fails.
const SHORT_YEAR_FORMATS: [&str; 3] = ["%d %B %y", "%B %d %y", "%m/%d/%y"];

/// Lowercase, strip ordinals and commas, collapse whitespace.
fn clean(text: &str) -> String {
    let lowered = text.to_lowercase().replace(',', " ");
    let without_ordinals = ORDINAL_SUFFIX.replace_all(&lowered, "$1");
    without_ordinals
        .split_whitespace()
        // chrono knows `sep` but not `sept`, and no abbreviation dots.
        .map(|token| {
            let bare = token.trim_end_matches('.');
            match bare {
                "sept" => "sep",
                _ if !bare.is_empty() && bare.chars().all(char::is_alphabetic) => bare,
                _ => token,
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
        .trim_end_matches('.')
        .to_string()
}

fn parse_relative(cleaned: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = RELATIVE.captures(cleaned)?;
    let amount: u32 = match &caps[1] {
        "a" | "an" | "one" => 1,
        digits => digits.parse().ok()?,
    };
    let unit = caps[2].trim_end_matches('s');

    let seconds_per_unit: i64 = match unit {
        "second" | "sec" => 1,
        "minute" | "min" => 60,
        "hour" | "hr" => 3_600,
        "day" => 86_400,
        "week" => 7 * 86_400,
        "month" => return today.checked_sub_months(Months::new(amount)),
        "year" => return today.checked_sub_months(Months::new(amount.checked_mul(12)?)),
        _ => return None,
    };

    let days = i64::from(amount) * seconds_per_unit / 86_400;
    today.checked_sub_signed(Duration::days(days))
}

fn parse_absolute(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    for format in TEXT_FORMATS.iter().chain(NUMERIC_FORMATS.iter()) {
        if let Ok((date, rest)) = NaiveDate::parse_and_remainder(text, format) {
            if date.year() >= MIN_YEAR && is_trailing_noise(rest) {
                return Some(date);
            }
        }
    }

    for format in SHORT_YEAR_FORMATS {
        if let Ok((date, rest)) = NaiveDate::parse_and_remainder(text, format) {
            if is_trailing_noise(rest) {
                return Some(date);
            }
        }
    }

    // Day and month without a year belong to the current year.
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.len() == 2 {
        let with_year = format!("{} {}", tokens.join(" "), today.year());
        for format in ["%d %B %Y", "%B %d %Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(&with_year, format) {
                return Some(date);
            }
        }
    }

    None
}

/// Time-of-day or zone text after a date (`" - 10:15 gmt"`, `"t10:15:00"`).
fn is_trailing_noise(rest: &str) -> bool {
    match rest.chars().next() {
        None => true,
        Some('t') => rest[1..].starts_with(|c: char| c.is_ascii_digit()),
        Some(c) => !c.is_alphanumeric(),
    }
}

fn most_recent_weekday(weekday: Weekday, today: NaiveDate) -> NaiveDate {
    let back = (today.weekday().num_days_from_monday() + 7 - weekday.num_days_from_monday()) % 7;
    today - Duration::days(i64::from(back))
}
