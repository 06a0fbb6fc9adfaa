//! Image download and tar archiving.

use crate::error::ReportError;
use crate::models::{IMAGE_DIR, ImageRef};
use reqwest::Client;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Source of image bytes.
pub trait ImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ReportError>;
}

/// Downloads images over HTTP.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self, ReportError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ReportError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DownloadStats {
    pub downloaded: usize,
    pub failed: usize,
    /// File names that were written to disk.
    pub saved: HashSet<String>,
}

/// Download each image into `dir`, one at a time. Failures are logged and
/// counted, never fatal.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn download_images<'r, F, I>(fetcher: &F, images: I, dir: &Path) -> DownloadStats
where
    F: ImageFetcher,
    I: IntoIterator<Item = &'r ImageRef>,
{
    let mut stats = DownloadStats::default();
    for image in images {
        let target = dir.join(&image.file_name);
        let saved = match fetcher.fetch(&image.source).await {
            Ok(bytes) => fs::write(&target, bytes).await.map_err(ReportError::from),
            Err(e) => Err(e),
        };
        match saved {
            Ok(()) => {
                debug!(url = %image.source, file = %image.file_name, "Saved image");
                stats.downloaded += 1;
                stats.saved.insert(image.file_name.clone());
            }
            Err(e) => {
                warn!(url = %image.source, error = %e, "Image download failed; skipping");
                stats.failed += 1;
            }
        }
    }
    info!(downloaded = stats.downloaded, failed = stats.failed, "Image downloads finished");
    stats
}

/// Bundle the files in `dir` into a tar archive at `archive_path`, under
/// [`IMAGE_DIR`].
#[instrument(level = "info", skip_all, fields(archive = %archive_path.display()))]
pub fn archive_dir(dir: &Path, archive_path: &Path) -> Result<(), ReportError> {
    let file = File::create(archive_path)?;
    let mut builder = tar::Builder::new(file);
    builder.append_dir_all(IMAGE_DIR, dir)?;
    builder.finish()?;
    info!("Image archive written");
    Ok(())
}
