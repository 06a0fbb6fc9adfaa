//! Al Jazeera search scraping.
//!
//! A run has two layers:
//!
//! 1. **Pagination** ([`pagination`]): search, sort by date, keep revealing
//!    more results while they are recent enough
//! 2. **Extraction** ([`extractor`]): read each card into an
//!    [`crate::models::ArticleRecord`]
//!
//! Both work against any [`crate::browser::Page`], so the same code runs on a
//! live browser or on saved HTML.
//!
//! # Failure Handling
//!
//! | Failure | Effect |
//! |---------|--------|
//! | Search control or results area missing | Run aborts |
//! | Card without a title | Card skipped, warning logged |
//! | Unreadable date label | Card kept, undated |
//! | Reveal-more control missing | Pagination ends normally |

pub mod extractor;
pub mod pagination;

#[cfg(test)]
pub(crate) mod fixtures;
