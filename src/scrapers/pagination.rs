//! Search, reveal-more pagination and per-card extraction.
//!
//! [`PaginationController`] is a small state machine:
//!
//! ```text
//! Searching ──► Extracting ──► Paginating ──► Extracting ──► ... ──► Done
//!                   │
//!                   └──► StoppedByDateBoundary
//! ```
//!
//! - **Searching** opens the site, runs the query and sorts by date. A control
//!   that never shows up here aborts the run.
//! - **Extracting** processes the cards revealed since the last pass, in
//!   batches. Results are newest first, so the first card dated before the
//!   cutoff ends the run: nothing after it can be in the window.
//! - **Paginating** clicks the reveal-more control, at most `max_reveals`
//!   times. A missing control ends pagination normally.

use crate::browser::Page;
use crate::config::Config;
use crate::error::{DriverError, ScrapeError};
use crate::models::{ArticleRecord, SearchSession};
use crate::scrapers::extractor::ArticleExtractor;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";
const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Searching,
    Extracting,
    Paginating,
    Done,
    StoppedByDateBoundary,
}

/// Why pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A card older than the cutoff was reached.
    DateBoundary,
    /// The reveal-more control was absent or could not be clicked.
    RevealControlExhausted,
    /// `max_reveals` clicks were spent.
    RevealLimit,
}

/// Everything collected by one run.
#[derive(Debug)]
pub struct Harvest {
    /// Records in page order.
    pub records: Vec<ArticleRecord>,
    pub stop_reason: StopReason,
    pub reveals: usize,
    /// Cards that failed extraction.
    pub skipped: usize,
    /// Cards looked at, including skipped ones and the boundary card.
    pub cards_seen: usize,
}

pub struct PaginationController<'a, P: Page> {
    page: &'a mut P,
    config: &'a Config,
    session: &'a SearchSession,
    site: &'a Url,
    extractor: ArticleExtractor<'a>,
    phase: Phase,
    /// Cards already handled; the next pass starts here.
    cursor: usize,
    reveals: usize,
    skipped: usize,
    records: Vec<ArticleRecord>,
    stop_reason: Option<StopReason>,
}

impl<'a, P: Page> PaginationController<'a, P> {
    pub fn new(page: &'a mut P, config: &'a Config, session: &'a SearchSession, site: &'a Url) -> Self {
        Self {
            page,
            config,
            session,
            site,
            extractor: ArticleExtractor::new(&config.locators, site),
            phase: Phase::Searching,
            cursor: 0,
            reveals: 0,
            skipped: 0,
            records: Vec::new(),
            stop_reason: None,
        }
    }

    /// Drive the page until pagination ends and return what was collected.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::FatalUi`] if a search control or the results area never
    /// becomes visible; [`ScrapeError::Driver`] if the page stops responding
    /// outside a single card.
    #[instrument(level = "info", skip_all, fields(phrase = %self.session.search_phrase(), cutoff = %self.session.cutoff()))]
    pub async fn run(mut self) -> Result<Harvest, ScrapeError> {
        loop {
            debug!(phase = ?self.phase, cursor = self.cursor, reveals = self.reveals, "Pagination step");
            self.phase = match self.phase {
                Phase::Searching => {
                    self.search().await?;
                    Phase::Extracting
                }
                Phase::Extracting => self.extract_new_cards().await?,
                Phase::Paginating => self.reveal_more().await?,
                Phase::Done | Phase::StoppedByDateBoundary => break,
            };
        }

        let stop_reason = self.stop_reason.unwrap_or(StopReason::RevealControlExhausted);
        info!(
            records = self.records.len(),
            skipped = self.skipped,
            reveals = self.reveals,
            ?stop_reason,
            "Pagination finished"
        );
        Ok(Harvest {
            records: self.records,
            stop_reason,
            reveals: self.reveals,
            skipped: self.skipped,
            cards_seen: self.cursor,
        })
    }

    async fn search(&mut self) -> Result<(), ScrapeError> {
        let config = self.config;
        let locators = &config.locators;
        info!(site = %self.site, "Opening site");
        self.page.goto(self.site.as_str()).await?;

        info!("Searching news with search input");
        self.require_visible(&locators.search_trigger).await?;
        self.page.click(&locators.search_trigger).await?;
        self.require_visible(&locators.search_input).await?;
        self.page
            .input_text(&locators.search_input, self.session.search_phrase())
            .await?;
        self.require_visible(&locators.search_button).await?;
        self.page.click(&locators.search_button).await?;

        self.accept_cookies().await;

        info!("Sorting news by date");
        self.require_visible(&locators.sort).await?;
        self.page.select_by_value(&locators.sort, "date").await?;
        self.require_visible(&locators.results).await?;
        Ok(())
    }

    /// The consent banner only appears for some visitors.
    async fn accept_cookies(&mut self) {
        let locator = &self.config.locators.cookies_accept;
        let timeout = self.config.timeouts.cookies();
        match self.page.wait_until_visible(locator, timeout).await {
            Ok(()) => match self.page.click(locator).await {
                Ok(()) => debug!("Accepted cookie banner"),
                Err(e) => warn!(error = %e, "Cookie banner could not be dismissed"),
            },
            Err(_) => debug!("No cookie banner"),
        }
    }

    async fn require_visible(&mut self, locator: &str) -> Result<(), ScrapeError> {
        self.page
            .wait_until_visible(locator, self.config.timeouts.search())
            .await
            .map_err(|source| ScrapeError::FatalUi {
                locator: locator.to_string(),
                source,
            })
    }

    async fn extract_new_cards(&mut self) -> Result<Phase, ScrapeError> {
        let cards = self.page.find_all(&self.config.locators.card).await?;
        if self.cursor >= cards.len() {
            debug!(total = cards.len(), "No newly revealed cards");
            return Ok(Phase::Paginating);
        }
        info!(
            new = cards.len() - self.cursor,
            total = cards.len(),
            "Extracting revealed cards"
        );

        let batch_size = self.config.batch_size.max(1);
        for batch_start in (self.cursor..cards.len()).step_by(batch_size) {
            let batch_end = (batch_start + batch_size).min(cards.len());
            for index in batch_start..batch_end {
                self.cursor = index + 1;
                let extracted = self
                    .extractor
                    .extract(&mut *self.page, &cards[index], index, self.session)
                    .await;
                match extracted {
                    Ok(record) => {
                        if let Some(date) = record.published_at() {
                            if !self.session.includes(date) {
                                info!(
                                    index,
                                    %date,
                                    cutoff = %self.session.cutoff(),
                                    "Reached articles older than the window"
                                );
                                self.stop_reason = Some(StopReason::DateBoundary);
                                return Ok(Phase::StoppedByDateBoundary);
                            }
                        }
                        debug!(index, title = %record.title(), "Extracted card");
                        self.records.push(record);
                    }
                    Err(e) => {
                        warn!(index, error = %e, "Skipping card");
                        self.skipped += 1;
                    }
                }
            }
            debug!(batch_start, batch_end, "Batch processed");
        }
        Ok(Phase::Paginating)
    }

    async fn reveal_more(&mut self) -> Result<Phase, ScrapeError> {
        if self.reveals >= self.config.max_reveals {
            info!(reveals = self.reveals, "Reveal limit reached");
            self.stop_reason = Some(StopReason::RevealLimit);
            return Ok(Phase::Done);
        }

        let locator = &self.config.locators.show_more;
        if let Err(e) = self.page.execute_script(SCROLL_TO_BOTTOM).await {
            warn!(error = %e, "Scroll script failed");
        }
        let revealed = match self.page.wait_until_visible(locator, self.config.timeouts.reveal()).await {
            Ok(()) => self.page.click(locator).await,
            Err(e) => Err(e),
        };
        if let Err(e) = revealed {
            info!(error = %e, "Could not find the show more button");
            self.stop_reason = Some(StopReason::RevealControlExhausted);
            return Ok(Phase::Done);
        }

        self.reveals += 1;
        self.wait_for_more_cards().await?;
        Ok(Phase::Extracting)
    }

    /// Give freshly requested cards a chance to render. Giving up is fine: the
    /// next pass simply finds nothing new.
    async fn wait_for_more_cards(&mut self) -> Result<(), DriverError> {
        let deadline = Instant::now() + self.config.timeouts.reveal();
        loop {
            let total = self.page.find_all(&self.config.locators.card).await?.len();
            if total > self.cursor || Instant::now() >= deadline {
                debug!(total, cursor = self.cursor, "Cards after reveal");
                return Ok(());
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::snapshot::SnapshotPage;
    use crate::scrapers::fixtures::{CardSpec, page_without_search, results_page};
    use chrono::{Duration as ChronoDuration, Months, NaiveDate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn session() -> SearchSession {
        SearchSession::with_today("US elections", 1, today())
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.timeouts.search_secs = 0;
        config.timeouts.cookies_secs = 0;
        config.timeouts.reveal_secs = 0;
        config
    }

    fn titled(n: usize) -> Vec<CardSpec> {
        (0..n)
            .map(|i| CardSpec::new(&format!("Story {i}")).dated(today() - ChronoDuration::days(i as i64)))
            .collect()
    }

    async fn run(pages: Vec<String>, config: &Config) -> (Result<Harvest, ScrapeError>, SnapshotPage) {
        let site = config.site().unwrap();
        let session = session();
        let mut page = SnapshotPage::new(pages, &config.locators.show_more);
        let result = PaginationController::new(&mut page, config, &session, &site).run().await;
        (result, page)
    }

    #[tokio::test]
    async fn test_stops_at_date_boundary() {
        let cards = vec![
            CardSpec::new("Today").dated(today()),
            CardSpec::new("Ten days ago").dated(today() - ChronoDuration::days(10)),
            CardSpec::new("Two months ago").dated(today() - Months::new(2)),
        ];
        let config = config();
        let (result, page) = run(vec![results_page(&cards, true)], &config).await;
        let harvest = result.unwrap();

        assert_eq!(harvest.records.len(), 2);
        assert_eq!(harvest.records[0].title(), "Today");
        assert_eq!(harvest.records[1].title(), "Ten days ago");
        assert_eq!(harvest.stop_reason, StopReason::DateBoundary);
        assert_eq!(harvest.reveals, 0);
        assert_eq!(page.reveal_clicks(), 0);
    }

    #[tokio::test]
    async fn test_runs_search_and_sort() {
        let config = config();
        let (result, page) = run(vec![results_page(&titled(1), false)], &config).await;
        result.unwrap();

        assert_eq!(page.visited(), ["https://www.aljazeera.com/".to_string()]);
        assert_eq!(page.typed(&config.locators.search_input), Some("US elections"));
        assert_eq!(page.selected(&config.locators.sort), Some("date"));
    }

    #[tokio::test]
    async fn test_cutoff_day_is_included() {
        let cards = vec![
            CardSpec::new("On the cutoff").dated(session().cutoff()),
            CardSpec::new("Day before").dated(session().cutoff() - ChronoDuration::days(1)),
        ];
        let config = config();
        let (result, _) = run(vec![results_page(&cards, false)], &config).await;
        let harvest = result.unwrap();
        assert_eq!(harvest.records.len(), 1);
        assert_eq!(harvest.records[0].title(), "On the cutoff");
    }

    #[tokio::test]
    async fn test_two_digit_year_does_not_end_pagination() {
        let cards = vec![
            CardSpec::new("First").dated(today()),
            CardSpec::new("Short year").date_label("Published On 10 Mar 24"),
            CardSpec::new("Third").dated(today()),
        ];
        let config = config();
        let (result, _) = run(vec![results_page(&cards, false)], &config).await;
        let harvest = result.unwrap();

        assert_eq!(harvest.records.len(), 3);
        assert_eq!(
            harvest.records[1].published_at(),
            NaiveDate::from_ymd_opt(2024, 3, 10)
        );
        assert_eq!(harvest.stop_reason, StopReason::RevealControlExhausted);
    }

    #[tokio::test]
    async fn test_undated_card_is_kept() {
        let cards = vec![
            CardSpec::new("Dated").dated(today()),
            CardSpec::new("Undated"),
            CardSpec::new("Garbled").date_label("soonish"),
        ];
        let config = config();
        let (result, _) = run(vec![results_page(&cards, false)], &config).await;
        let harvest = result.unwrap();

        assert_eq!(harvest.records.len(), 3);
        assert_eq!(harvest.records[1].published_at(), None);
        assert_eq!(harvest.records[2].published_at(), None);
        assert_eq!(harvest.stop_reason, StopReason::RevealControlExhausted);
    }

    #[tokio::test]
    async fn test_reveals_until_control_disappears() {
        let first: Vec<CardSpec> = titled(10);
        let second: Vec<CardSpec> = (10..13)
            .map(|i| CardSpec::new(&format!("Story {i}")).dated(today()))
            .collect();
        let config = config();
        let pages = vec![results_page(&first, true), results_page(&second, false)];
        let (result, page) = run(pages, &config).await;
        let harvest = result.unwrap();

        assert_eq!(harvest.records.len(), 13);
        let titles: Vec<&str> = harvest.records.iter().map(|r| r.title()).collect();
        assert_eq!(titles[0], "Story 0");
        assert_eq!(titles[12], "Story 12");
        assert_eq!(harvest.reveals, 1);
        assert_eq!(page.reveal_clicks(), 1);
        assert_eq!(harvest.stop_reason, StopReason::RevealControlExhausted);
        assert!(page.scripts().iter().all(|s| s == SCROLL_TO_BOTTOM));
    }

    #[tokio::test]
    async fn test_boundary_on_revealed_page() {
        let second = vec![
            CardSpec::new("Old").dated(today() - Months::new(3)),
            CardSpec::new("Older").dated(today() - Months::new(4)),
        ];
        let config = config();
        let pages = vec![
            results_page(&titled(10), true),
            results_page(&second, true),
            results_page(&titled(2), false),
        ];
        let (result, page) = run(pages, &config).await;
        let harvest = result.unwrap();

        assert_eq!(harvest.records.len(), 10);
        assert_eq!(harvest.reveals, 1);
        assert_eq!(harvest.cards_seen, 11);
        assert_eq!(page.reveal_clicks(), 1);
        assert_eq!(harvest.stop_reason, StopReason::DateBoundary);
    }

    #[tokio::test]
    async fn test_reveal_attempts_are_bounded() {
        // The control stays visible but never loads anything.
        let config = config();
        let (result, page) = run(vec![results_page(&titled(2), true)], &config).await;
        let harvest = result.unwrap();

        assert_eq!(harvest.records.len(), 2);
        assert_eq!(harvest.reveals, 10);
        assert_eq!(page.reveal_clicks(), 10);
        assert_eq!(harvest.stop_reason, StopReason::RevealLimit);
    }

    #[tokio::test]
    async fn test_small_batches_cover_every_card() {
        let mut config = config();
        config.batch_size = 3;
        let (result, _) = run(vec![results_page(&titled(7), false)], &config).await;
        let harvest = result.unwrap();
        assert_eq!(harvest.records.len(), 7);
        assert_eq!(harvest.cards_seen, 7);
    }

    #[tokio::test]
    async fn test_card_failures_are_skipped() {
        let cards = vec![
            CardSpec::new("First").dated(today()),
            CardSpec::untitled().dated(today()),
            CardSpec::new("Third").dated(today()),
        ];
        let config = config();
        let (result, _) = run(vec![results_page(&cards, false)], &config).await;
        let harvest = result.unwrap();

        assert_eq!(harvest.records.len(), 2);
        assert_eq!(harvest.skipped, 1);
        assert_eq!(harvest.records[1].title(), "Third");
    }

    #[tokio::test]
    async fn test_missing_search_controls_are_fatal() {
        let config = config();
        let (result, _) = run(vec![page_without_search()], &config).await;
        match result {
            Err(ScrapeError::FatalUi { locator, source }) => {
                assert_eq!(locator, config.locators.search_trigger);
                assert!(matches!(source, DriverError::Timeout { .. }));
            }
            other => panic!("expected FatalUi, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_results() {
        let config = config();
        let (result, _) = run(vec![results_page(&[], false)], &config).await;
        let harvest = result.unwrap();
        assert!(harvest.records.is_empty());
        assert_eq!(harvest.stop_reason, StopReason::RevealControlExhausted);
    }
}
