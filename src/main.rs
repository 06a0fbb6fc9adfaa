//! # Al Jazeera News Scraper
//!
//! Searches Al Jazeera for a phrase, collects every result published within a
//! rolling window of whole months, and writes a spreadsheet report plus a tar
//! archive of the article images.
//!
//! ## Features
//!
//! - Drives a real browser through any WebDriver server (chromedriver,
//!   geckodriver), headless by default
//! - Can instead replay saved result pages, with no browser or network needed
//!   for the scrape itself
//! - Normalizes the site's date labels ("Published On 12 Apr 2024",
//!   "3 days ago", "Last update 2 hours ago") to calendar dates
//! - Flags money amounts and counts search-phrase occurrences per article
//! - Takes its inputs from flags, environment variables or a work item file
//!
//! ## Usage
//!
//! ```sh
//! aljazeera_news_scraper --search-phrase "israel war iran" --months 2 -o ./output
//! ```
//!
//! ## Architecture
//!
//! 1. **Search**: open the site, run the query, sort by date
//! 2. **Extract**: read each result card into an article record, stopping at
//!    the first card older than the cutoff
//! 3. **Paginate**: click "show more" and extract the new cards, up to a bound
//! 4. **Report**: download the images, then write the spreadsheet and the
//!    image archive

use clap::Parser;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

mod browser;
mod cli;
mod config;
mod dates;
mod error;
mod logging;
mod models;
mod outputs;
mod scrapers;
mod utils;
mod workitem;

use browser::Page;
use browser::snapshot::SnapshotPage;
use browser::webdriver::WebDriverPage;
use cli::Cli;
use config::Config;
use models::SearchSession;
use outputs::archive::HttpImageFetcher;
use outputs::{ReportAssembler, ReportSummary};
use scrapers::pagination::{Harvest, PaginationController};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }

    // Flushes the log file on drop.
    let _guard = logging::init_logging(&config.log_dir())?;

    let start_time = Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "news scraper starting up");
    debug!(?args, "Parsed CLI arguments");

    match run(&args, &config).await {
        Ok(summary) => {
            let elapsed = start_time.elapsed();
            info!(
                ?elapsed,
                secs = elapsed.as_secs(),
                rows = summary.rows,
                images = summary.images_downloaded,
                report = %summary.report_path.display(),
                archive = %summary.archive_path.display(),
                "Execution complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, elapsed = ?start_time.elapsed(), "Run failed");
            Err(e)
        }
    }
}

#[instrument(level = "info", skip_all)]
async fn run(args: &Cli, config: &Config) -> Result<ReportSummary, Box<dyn Error>> {
    let input = workitem::resolve_input(args)?;
    let session = SearchSession::new(input.search_phrase, input.months);
    info!(
        phrase = %session.search_phrase(),
        months = session.months_back(),
        today = %session.today(),
        cutoff = %session.cutoff(),
        "Search session ready"
    );

    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let harvest = if args.snapshot.is_empty() {
        let page = WebDriverPage::connect(&args.webdriver_url, !args.headful).await?;
        scrape(page, config, &session).await?
    } else {
        info!(pages = args.snapshot.len(), "Replaying saved result pages");
        let page = SnapshotPage::from_files(&args.snapshot, &config.locators.show_more)?;
        scrape(page, config, &session).await?
    };

    info!(
        records = harvest.records.len(),
        cards_seen = harvest.cards_seen,
        skipped = harvest.skipped,
        reveals = harvest.reveals,
        stop_reason = ?harvest.stop_reason,
        "Harvest complete"
    );

    let assembler = ReportAssembler::from_config(HttpImageFetcher::new()?, config);
    Ok(assembler.assemble(&harvest.records).await?)
}

/// Run the search and pagination on `page`, then close it whatever the outcome.
async fn scrape<P: Page>(mut page: P, config: &Config, session: &SearchSession) -> Result<Harvest, Box<dyn Error>> {
    let site = config.site()?;
    let harvest = PaginationController::new(&mut page, config, session, &site).run().await;
    if let Err(e) = page.close().await {
        warn!(error = %e, "Failed to close the browser session");
    }
    Ok(harvest?)
}
