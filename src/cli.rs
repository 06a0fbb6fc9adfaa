//! Command-line interface definitions.
//!
//! Every option has a default, so the tool runs with no flags at all. Most
//! options can also come from environment variables.

use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_SEARCH_PHRASE: &str = "US elections";
pub const DEFAULT_MONTHS: u32 = 1;

/// Search Al Jazeera and report recent articles as a spreadsheet plus an
/// image archive.
///
/// # Examples
///
/// ```sh
/// # Live run against a local chromedriver
/// aljazeera_news_scraper --search-phrase "israel war iran" --months 2
///
/// # Inputs from an orchestrator's work item
/// RPA_INPUT_WORKITEM_PATH=work-items/input.json aljazeera_news_scraper
///
/// # Offline run over saved result pages
/// aljazeera_news_scraper --snapshot page1.html page2.html
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Phrase to search for
    #[arg(short, long, env = "SEARCH_PHRASE", default_value = DEFAULT_SEARCH_PHRASE)]
    pub search_phrase: String,

    /// Months of history to keep; 0 keeps only today's articles
    #[arg(short, long, env = "MONTHS", default_value_t = DEFAULT_MONTHS)]
    pub months: u32,

    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Work item JSON supplying `search_phrase` and `months`; overrides the flags above
    #[arg(long, env = "RPA_INPUT_WORKITEM_PATH")]
    pub work_item: Option<PathBuf>,

    /// WebDriver server to drive the browser through
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://localhost:4444")]
    pub webdriver_url: String,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headful: bool,

    /// Output directory for the report, archive and logs (overrides the config file)
    #[arg(short, long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Saved result pages to scrape instead of a live browser; each reveal-more
    /// click shows the next page
    #[arg(long, num_args = 1..)]
    pub snapshot: Vec<PathBuf>,
}
