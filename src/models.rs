//! Data models for a single scraping run.
//!
//! - [`SearchSession`]: the search phrase and the rolling date window
//! - [`ArticleRecord`]: one extracted search result, with derived fields
//! - [`ImageRef`]: where a card's image comes from and what to call it locally

use crate::dates::{cutoff_date, is_within_window};
use crate::error::ExtractError;
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Directory (inside the image archive) that downloaded images live under.
pub const IMAGE_DIR: &str = "images";

static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$[\d,]+(?:\.\d+)?|\b\d+\s*(?i:dollars?)\b|\b\d+\s*(?i:usd)\b").unwrap()
});

/// Parameters for one scraping run.
///
/// The cutoff is computed once from `today`, so every card in a run is judged
/// against the same boundary even if the run crosses midnight.
#[derive(Debug, Clone)]
pub struct SearchSession {
    search_phrase: String,
    months_back: u32,
    today: NaiveDate,
    cutoff: NaiveDate,
}

impl SearchSession {
    pub fn new(search_phrase: impl Into<String>, months_back: u32) -> Self {
        Self::with_today(search_phrase, months_back, Local::now().date_naive())
    }

    /// Build a session against a fixed reference date.
    pub fn with_today(search_phrase: impl Into<String>, months_back: u32, today: NaiveDate) -> Self {
        Self {
            search_phrase: search_phrase.into(),
            months_back,
            today,
            cutoff: cutoff_date(today, months_back),
        }
    }

    pub fn search_phrase(&self) -> &str {
        &self.search_phrase
    }

    pub fn months_back(&self) -> u32 {
        self.months_back
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn cutoff(&self) -> NaiveDate {
        self.cutoff
    }

    /// Whether a publication date falls inside this session's window.
    pub fn includes(&self, date: NaiveDate) -> bool {
        is_within_window(date, self.cutoff)
    }
}

/// An image to download for a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Absolute URL of the image.
    pub source: String,
    /// File name inside [`IMAGE_DIR`].
    pub file_name: String,
}

impl ImageRef {
    /// Path of the image relative to the archive root, e.g. `images/003-gaza.jpg`.
    pub fn local_path(&self) -> String {
        format!("{}/{}", IMAGE_DIR, self.file_name)
    }
}

/// One extracted news item.
///
/// `contains_amount` and `search_term_count` are computed in [`ArticleRecord::new`]
/// from the title and description and cannot be set any other way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    title: String,
    description: String,
    published_at: Option<NaiveDate>,
    image: Option<ImageRef>,
    contains_amount: bool,
    search_term_count: usize,
}

impl ArticleRecord {
    /// Build a record and derive its computed fields.
    ///
    /// # Errors
    ///
    /// [`ExtractError::MissingTitle`] if `title` is blank.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        published_at: Option<NaiveDate>,
        image: Option<ImageRef>,
        search_phrase: &str,
    ) -> Result<Self, ExtractError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(ExtractError::MissingTitle);
        }
        let description = description.into().trim().to_string();

        let text = searchable_text(&title, &description);
        Ok(Self {
            contains_amount: contains_amount(&text),
            search_term_count: count_search_term(search_phrase, &text),
            title,
            description,
            published_at,
            image,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn published_at(&self) -> Option<NaiveDate> {
        self.published_at
    }

    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }

    /// Local image path, or an empty string when the card had no image.
    pub fn image_ref(&self) -> String {
        self.image.as_ref().map(ImageRef::local_path).unwrap_or_default()
    }

    pub fn contains_amount(&self) -> bool {
        self.contains_amount
    }

    pub fn search_term_count(&self) -> usize {
        self.search_term_count
    }
}

/// Description then title, separated so that a match can never straddle both.
fn searchable_text(title: &str, description: &str) -> String {
    format!("{description}\n{title}")
}

/// `true` if `text` mentions a monetary amount such as `$1,200.50`, `50 dollars`
/// or `50 USD`.
pub fn contains_amount(text: &str) -> bool {
    AMOUNT_PATTERN.is_match(text)
}

/// Case-sensitive, non-overlapping occurrences of `phrase` in `text`.
///
/// An empty phrase occurs zero times.
pub fn count_search_term(phrase: &str, text: &str) -> usize {
    if phrase.is_empty() {
        return 0;
    }
    text.matches(phrase).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_contains_amount() {
        assert!(contains_amount("Aid package worth $1,200 approved"));
        assert!(contains_amount("costs $3.50 a loaf"));
        assert!(contains_amount("fined 50 dollars"));
        assert!(contains_amount("fined 1 Dollar"));
        assert!(contains_amount("a 50 USD fee"));
        assert!(contains_amount("a 50usd fee"));
        assert!(!contains_amount("no money here"));
        assert!(!contains_amount("50 euros"));
        assert!(!contains_amount("USD 50"));
    }

    #[test]
    fn test_search_term_count_is_case_sensitive() {
        assert_eq!(count_search_term("israel war iran", "Israel Israel war"), 0);
        assert_eq!(count_search_term("Israel", "Israel Israel war"), 2);
        assert_eq!(count_search_term("israel", "Israel Israel war"), 0);
    }

    #[test]
    fn test_search_term_count_is_non_overlapping() {
        assert_eq!(count_search_term("aa", "aaaa"), 2);
        assert_eq!(count_search_term("aa", "aaa"), 1);
        assert_eq!(count_search_term("", "anything"), 0);
    }

    #[test]
    fn test_record_derives_fields_from_title_and_description() {
        let record = ArticleRecord::new(
            "US elections: turnout hits record",
            "Campaigns spent $2,000,000 on US elections ads",
            Some(ymd(2024, 1, 3)),
            None,
            "US elections",
        )
        .unwrap();

        assert!(record.contains_amount());
        assert_eq!(record.search_term_count(), 2);
        assert_eq!(record.published_at(), Some(ymd(2024, 1, 3)));
        assert_eq!(record.image_ref(), "");
    }

    #[test]
    fn test_phrase_does_not_straddle_fields() {
        let record = ArticleRecord::new("war", "Israel", None, None, "Israelwar").unwrap();
        assert_eq!(record.search_term_count(), 0);
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let err = ArticleRecord::new("   ", "desc", None, None, "x").unwrap_err();
        assert!(matches!(err, ExtractError::MissingTitle));
    }

    #[test]
    fn test_image_ref_path() {
        let image = ImageRef {
            source: "https://example.com/a.jpg".to_string(),
            file_name: "000-gaza-strip.jpg".to_string(),
        };
        let record = ArticleRecord::new("Title", "", None, Some(image), "x").unwrap();
        assert_eq!(record.image_ref(), "images/000-gaza-strip.jpg");
    }

    #[test]
    fn test_session_cutoff_and_window() {
        let session = SearchSession::with_today("US elections", 1, ymd(2024, 3, 15));
        assert_eq!(session.cutoff(), ymd(2024, 2, 15));
        assert!(session.includes(ymd(2024, 2, 15)));
        assert!(!session.includes(ymd(2024, 2, 14)));
        assert_eq!(session.search_phrase(), "US elections");
        assert_eq!(session.months_back(), 1);
    }
}
