//! Report generation: the spreadsheet and the image archive.
//!
//! # Submodules
//!
//! - [`xlsx`]: writes (and reads back) the spreadsheet report
//! - [`archive`]: downloads images and bundles them into a tar file
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── news.xlsx
//! ├── images.tar      # images/<file>.jpg entries
//! └── logs/
//! ```
//!
//! Images are downloaded first, into a temporary directory next to the
//! archive, so the report only names images that made it into the archive.
//! The directory is removed once the archive is written, or when assembly
//! fails.

pub mod archive;
pub mod xlsx;

use crate::config::Config;
use crate::error::ReportError;
use crate::models::ArticleRecord;
use archive::{ImageFetcher, archive_dir, download_images};
use std::path::{Path, PathBuf};
use xlsx::ReportRow;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub rows: usize,
    pub images_downloaded: usize,
    pub images_failed: usize,
    pub report_path: PathBuf,
    pub archive_path: PathBuf,
}

/// Writes the spreadsheet and the image archive for a finished run.
pub struct ReportAssembler<F> {
    fetcher: F,
    report_path: PathBuf,
    archive_path: PathBuf,
}

impl<F: ImageFetcher> ReportAssembler<F> {
    pub fn new(fetcher: F, report_path: impl Into<PathBuf>, archive_path: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            report_path: report_path.into(),
            archive_path: archive_path.into(),
        }
    }

    pub fn from_config(fetcher: F, config: &Config) -> Self {
        Self::new(fetcher, config.report_path(), config.archive_path())
    }

    /// Download every record's image, write the report, then archive the
    /// images.
    ///
    /// # Errors
    ///
    /// Fails if the spreadsheet, the staging directory or the archive cannot be
    /// written. Individual image downloads never fail the assembly.
    #[instrument(level = "info", skip_all, fields(records = records.len()))]
    pub async fn assemble(&self, records: &[ArticleRecord]) -> Result<ReportSummary, ReportError> {
        ensure_parent(&self.report_path)?;
        let archive_parent = ensure_parent(&self.archive_path)?;

        let staging = tempfile::Builder::new()
            .prefix("images-")
            .tempdir_in(&archive_parent)?;
        let stats = download_images(
            &self.fetcher,
            records.iter().filter_map(ArticleRecord::image),
            staging.path(),
        )
        .await;

        let rows: Vec<ReportRow> = records
            .iter()
            .map(|record| ReportRow::with_saved_image(record, &stats.saved))
            .collect();
        xlsx::write_report(&rows, &self.report_path)?;
        archive_dir(staging.path(), &self.archive_path)?;
        staging.close()?;

        let summary = ReportSummary {
            rows: records.len(),
            images_downloaded: stats.downloaded,
            images_failed: stats.failed,
            report_path: self.report_path.clone(),
            archive_path: self.archive_path.clone(),
        };
        info!(?summary, "Report assembled");
        Ok(summary)
    }
}

/// Create the parent directory of `path` and return it.
fn ensure_parent(path: &Path) -> Result<PathBuf, ReportError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;
    Ok(parent)
}
