//! Turn one rendered search result card into an [`ArticleRecord`].

use crate::browser::Page;
use crate::config::Locators;
use crate::dates::normalize_relative_to;
use crate::error::{DriverError, ExtractError};
use crate::models::{ArticleRecord, ImageRef, SearchSession};
use crate::utils::{slugify, truncate_for_log};
use chrono::NaiveDate;
use tracing::{debug, instrument, warn};
use url::Url;

/// Longest alt-text slug used in an image file name.
const MAX_SLUG_LEN: usize = 60;

/// Reads title, description, date and image from a card.
///
/// Only the title is required. A missing date element, or a date label that
/// cannot be parsed, leaves `published_at` empty and the record is kept.
#[derive(Debug, Clone, Copy)]
pub struct ArticleExtractor<'a> {
    locators: &'a Locators,
    site: &'a Url,
}

impl<'a> ArticleExtractor<'a> {
    pub fn new(locators: &'a Locators, site: &'a Url) -> Self {
        Self { locators, site }
    }

    /// Extract card number `index` (zero-based, in page order).
    ///
    /// # Errors
    ///
    /// - [`ExtractError::MissingTitle`] if the card has no non-blank title
    /// - [`ExtractError::Driver`] if the page stops answering queries
    #[instrument(level = "debug", skip(self, page, card, session))]
    pub async fn extract<P: Page>(
        &self,
        page: &mut P,
        card: &P::Node,
        index: usize,
        session: &SearchSession,
    ) -> Result<ArticleRecord, ExtractError> {
        let title = match page.find_within(card, &self.locators.title).await? {
            Some(node) => page.text(&node).await?,
            None => return Err(ExtractError::MissingTitle),
        };
        let description = self.read_description(page, card, session.today()).await?;
        let published_at = self.read_date(page, card, session.today()).await?;
        let image = self.read_image(page, card, index).await?;

        ArticleRecord::new(title, description, published_at, image, session.search_phrase())
    }

    async fn read_description<P: Page>(
        &self,
        page: &mut P,
        card: &P::Node,
        today: NaiveDate,
    ) -> Result<String, DriverError> {
        let Some(node) = page.find_within(card, &self.locators.description).await? else {
            return Ok(String::new());
        };
        if !page.is_displayed(&node).await? {
            return Ok(String::new());
        }
        let text = page.text(&node).await?;
        Ok(strip_excerpt_prefix(&text, today).to_string())
    }

    async fn read_date<P: Page>(
        &self,
        page: &mut P,
        card: &P::Node,
        today: NaiveDate,
    ) -> Result<Option<NaiveDate>, DriverError> {
        let Some(node) = page.find_within(card, &self.locators.date).await? else {
            debug!("Card has no date element; keeping it undated");
            return Ok(None);
        };

        // Screen-reader-only text can render empty; fall back to the DOM text.
        let mut label = page.text(&node).await?;
        if label.is_empty() {
            label = page.attr(&node, "textContent").await?.unwrap_or_default();
        }

        match normalize_relative_to(&label, today) {
            Ok(date) => Ok(date),
            Err(e) => {
                warn!(error = %e, label = %truncate_for_log(&label, 80), "Unreadable date label; keeping card undated");
                Ok(None)
            }
        }
    }

    async fn read_image<P: Page>(
        &self,
        page: &mut P,
        card: &P::Node,
        index: usize,
    ) -> Result<Option<ImageRef>, DriverError> {
        let Some(node) = page.find_within(card, &self.locators.image).await? else {
            return Ok(None);
        };

        let mut src = page.attr(&node, "src").await?.unwrap_or_default();
        if src.is_empty() || src.starts_with("data:") {
            src = page.attr(&node, "data-src").await?.unwrap_or_default();
        }
        if src.is_empty() || src.starts_with("data:") {
            return Ok(None);
        }

        let source = match self.site.join(&src) {
            Ok(url) => url.to_string(),
            Err(e) => {
                warn!(%src, error = %e, "Unusable image source");
                return Ok(None);
            }
        };
        let alt = page.attr(&node, "alt").await?.unwrap_or_default();

        Ok(Some(ImageRef {
            source,
            file_name: image_file_name(&alt, index),
        }))
    }
}

/// `NNN-<alt slug>.jpg`, or `image_N.jpg` when the alt text yields no slug.
pub fn image_file_name(alt: &str, index: usize) -> String {
    let slug = slugify(alt, MAX_SLUG_LEN);
    if slug.is_empty() {
        format!("image_{index}.jpg")
    } else {
        format!("{index:03}-{slug}.jpg")
    }
}

/// Excerpts open with their age, e.g. `"3 days ago ... Israeli strikes..."`.
/// Drop that prefix when the text before the first `...` reads as a date.
fn strip_excerpt_prefix(text: &str, today: NaiveDate) -> &str {
    if let Some((prefix, rest)) = text.split_once("...") {
        if matches!(normalize_relative_to(prefix, today), Ok(Some(_))) {
            return rest.trim();
        }
    }
    text.trim()
}
