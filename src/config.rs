//! Run configuration: site URL, locators, output paths and limits.
//!
//! Every field has a default matching the live Al Jazeera site, so the tool
//! runs without any config file. A YAML file passed with `--config` overrides
//! only the keys it names:
//!
//! ```yaml
//! max_reveals: 5
//! timeouts:
//!   search_secs: 20
//! locators:
//!   show_more: "button.show-more-button"
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Page locators, as CSS selectors.
///
/// Card-relative locators (`title`, `description`, `date`, `image`) are looked
/// up inside each card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Locators {
    pub search_trigger: String,
    pub search_input: String,
    pub search_button: String,
    pub cookies_accept: String,
    pub sort: String,
    pub results: String,
    pub card: String,
    pub show_more: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub image: String,
}

impl Default for Locators {
    fn default() -> Self {
        Self {
            search_trigger: ".site-header__search-trigger .no-styles-button".to_string(),
            search_input: ".search-bar__input".to_string(),
            search_button: ".search-bar__button".to_string(),
            cookies_accept: "#onetrust-accept-btn-handler".to_string(),
            sort: "#search-sort-option".to_string(),
            results: ".search-result__list".to_string(),
            card: ".u-clickable-card".to_string(),
            show_more: "button.show-more-button".to_string(),
            title: ".u-clickable-card__link span".to_string(),
            description: ".gc__body-wrap .gc__excerpt p".to_string(),
            date: ".gc__date__date .screen-reader-text".to_string(),
            image: ".gc__image-wrap img".to_string(),
        }
    }
}

/// Wait limits, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Search controls and the results area. Exceeding it aborts the run.
    pub search_secs: u64,
    /// Optional cookie banner.
    pub cookies_secs: u64,
    /// Reveal-more control. Exceeding it ends pagination.
    pub reveal_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            search_secs: 10,
            cookies_secs: 5,
            reveal_secs: 5,
        }
    }
}

impl Timeouts {
    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search_secs)
    }

    pub fn cookies(&self) -> Duration {
        Duration::from_secs(self.cookies_secs)
    }

    pub fn reveal(&self) -> Duration {
        Duration::from_secs(self.reveal_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site_url: String,
    pub output_dir: PathBuf,
    pub report_file: String,
    pub archive_file: String,
    /// Defaults to `<output_dir>/logs`.
    pub log_dir: Option<PathBuf>,
    /// Upper bound on reveal-more clicks per run.
    pub max_reveals: usize,
    /// Cards extracted per batch; matches the site's reveal increment.
    pub batch_size: usize,
    pub timeouts: Timeouts,
    pub locators: Locators,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_url: "https://www.aljazeera.com/".to_string(),
            output_dir: PathBuf::from("output"),
            report_file: "news.xlsx".to_string(),
            archive_file: "images.tar".to_string(),
            log_dir: None,
            max_reveals: 10,
            batch_size: 10,
            timeouts: Timeouts::default(),
            locators: Locators::default(),
        }
    }
}

impl Config {
    /// Load a YAML config file; missing keys take their defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw)?;
        info!("Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(raw)?;
        config.site()?;
        Ok(config)
    }

    pub fn site(&self) -> Result<Url, ConfigError> {
        Ok(Url::parse(&self.site_url)?)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.output_dir.join(&self.archive_file)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.max_reveals, 10);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.report_path(), PathBuf::from("output/news.xlsx"));
        assert_eq!(config.archive_path(), PathBuf::from("output/images.tar"));
        assert_eq!(config.log_dir(), PathBuf::from("output/logs"));
        assert_eq!(config.site().unwrap().host_str(), Some("www.aljazeera.com"));
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let yaml = r#"
max_reveals: 3
output_dir: /tmp/news
timeouts:
  search_secs: 30
locators:
  show_more: "button.more"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.max_reveals, 3);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.timeouts.search(), Duration::from_secs(30));
        assert_eq!(config.timeouts.reveal(), Duration::from_secs(5));
        assert_eq!(config.locators.show_more, "button.more");
        assert_eq!(config.locators.card, Locators::default().card);
        assert_eq!(config.report_path(), PathBuf::from("/tmp/news/news.xlsx"));
    }

    #[test]
    fn test_log_dir_follows_output_dir() {
        let config = Config::from_yaml("output_dir: /srv/news\n").unwrap();
        assert_eq!(config.log_dir(), PathBuf::from("/srv/news/logs"));

        let config = Config::from_yaml("output_dir: /srv/news\nlog_dir: /var/log/news\n").unwrap();
        assert_eq!(config.log_dir(), PathBuf::from("/var/log/news"));
    }

    #[test]
    fn test_bad_site_url_is_rejected() {
        assert!(matches!(
            Config::from_yaml("site_url: not a url"),
            Err(ConfigError::Url(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "batch_size: 20\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().batch_size, 20);
        assert!(matches!(
            Config::load(dir.path().join("missing.yaml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
