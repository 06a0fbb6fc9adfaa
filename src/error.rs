//! Error types for each stage of a scraping run.
//!
//! Card-level failures ([`ExtractError`]) are caught by the pagination loop and
//! never escalate. Page-level failures ([`ScrapeError`]) terminate the run.

use std::time::Duration;
use thiserror::Error;

/// Failures reported by a [`crate::browser::Page`] backend.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("timed out after {timeout:?} waiting for `{locator}` to become visible")]
    Timeout { locator: String, timeout: Duration },

    #[error("no element matches `{0}`")]
    NoSuchElement(String),

    #[error("invalid locator `{0}`")]
    InvalidLocator(String),

    #[error("webdriver command failed: {0}")]
    Command(String),

    #[error("could not start a webdriver session: {0}")]
    Session(String),
}

impl From<fantoccini::error::CmdError> for DriverError {
    fn from(err: fantoccini::error::CmdError) -> Self {
        DriverError::Command(err.to_string())
    }
}

impl From<fantoccini::error::NewSessionError> for DriverError {
    fn from(err: fantoccini::error::NewSessionError) -> Self {
        DriverError::Session(err.to_string())
    }
}

/// A date label whose trailing text could not be read as a calendar date.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("could not parse `{input}` as a date")]
pub struct DateParseError {
    pub input: String,
}

/// Failure to turn a single card into an [`crate::models::ArticleRecord`].
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("card has no title")]
    MissingTitle,

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Run-level failures of the search and pagination phases.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("required element `{locator}` never became visible")]
    FatalUi {
        locator: String,
        #[source]
        source: DriverError,
    },

    #[error(transparent)]
    Driver(#[from] DriverError),
}

/// Failures while writing the spreadsheet, downloading images or archiving them.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to write spreadsheet: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to read spreadsheet: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("image download failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed report: {0}")]
    Malformed(String),
}

/// Failures while loading configuration or work-item input.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid work item: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid site url: {0}")]
    Url(#[from] url::ParseError),
}
