//! WebDriver backend built on `fantoccini`.
//!
//! Requires a running WebDriver server (`chromedriver --port=4444` or
//! `geckodriver`). Visibility waits poll every [`POLL_INTERVAL`] until the
//! deadline.

use super::{Page, collapse_whitespace};
use crate::error::DriverError;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{Map, Value, json};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, info, instrument};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A live browser session.
pub struct WebDriverPage {
    client: Client,
}

impl WebDriverPage {
    /// Start a browser session on the WebDriver server at `webdriver_url`.
    #[instrument(level = "info")]
    pub async fn connect(webdriver_url: &str, headless: bool) -> Result<Self, DriverError> {
        let client = ClientBuilder::native()
            .capabilities(capabilities(headless))
            .connect(webdriver_url)
            .await?;
        client.set_window_size(1920, 1080).await?;
        info!(headless, "Browser session started");
        Ok(Self { client })
    }
}

fn capabilities(headless: bool) -> Map<String, Value> {
    let mut caps = Map::new();
    if headless {
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({ "args": ["--headless=new", "--disable-gpu", "--no-sandbox"] }),
        );
        caps.insert(
            "moz:firefoxOptions".to_string(),
            json!({ "args": ["-headless"] }),
        );
    }
    caps
}

/// XPath for strings starting with `/` or `(`, CSS otherwise.
fn to_locator(locator: &str) -> Locator<'_> {
    if locator.starts_with('/') || locator.starts_with('(') {
        Locator::XPath(locator)
    } else {
        Locator::Css(locator)
    }
}

impl Page for WebDriverPage {
    type Node = Element;

    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.client.goto(url).await?;
        debug!(%url, "Navigated");
        Ok(())
    }

    async fn find_all(&mut self, locator: &str) -> Result<Vec<Element>, DriverError> {
        Ok(self.client.find_all(to_locator(locator)).await?)
    }

    async fn find_within(
        &mut self,
        node: &Element,
        locator: &str,
    ) -> Result<Option<Element>, DriverError> {
        Ok(node.find_all(to_locator(locator)).await?.into_iter().next())
    }

    async fn text(&mut self, node: &Element) -> Result<String, DriverError> {
        Ok(collapse_whitespace(&node.text().await?))
    }

    async fn attr(&mut self, node: &Element, name: &str) -> Result<Option<String>, DriverError> {
        Ok(node.attr(name).await?)
    }

    async fn is_displayed(&mut self, node: &Element) -> Result<bool, DriverError> {
        Ok(node.is_displayed().await?)
    }

    async fn click(&mut self, locator: &str) -> Result<(), DriverError> {
        let element = self.client.find(to_locator(locator)).await?;
        element.click().await?;
        Ok(())
    }

    async fn input_text(&mut self, locator: &str, text: &str) -> Result<(), DriverError> {
        let element = self.client.find(to_locator(locator)).await?;
        element.clear().await?;
        element.send_keys(text).await?;
        Ok(())
    }

    async fn select_by_value(&mut self, locator: &str, value: &str) -> Result<(), DriverError> {
        let element = self.client.find(to_locator(locator)).await?;
        element.select_by_value(value).await?;
        Ok(())
    }

    async fn wait_until_visible(&mut self, locator: &str, timeout: Duration) -> Result<(), DriverError> {
        let deadline = Instant::now() + timeout;
        loop {
            for element in self.client.find_all(to_locator(locator)).await? {
                // Elements can go stale between lookup and the visibility check.
                if element.is_displayed().await.unwrap_or(false) {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                return Err(DriverError::Timeout {
                    locator: locator.to_string(),
                    timeout,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn execute_script(&mut self, script: &str) -> Result<(), DriverError> {
        self.client.execute(script, Vec::new()).await?;
        Ok(())
    }

    async fn close(self) -> Result<(), DriverError> {
        self.client.close().await?;
        info!("Browser session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_kind() {
        assert!(matches!(to_locator("//button[@id='x']"), Locator::XPath(_)));
        assert!(matches!(to_locator("(//a)[1]"), Locator::XPath(_)));
        assert!(matches!(to_locator("button.show-more-button"), Locator::Css(_)));
    }

    #[test]
    fn test_headless_capabilities() {
        let caps = capabilities(true);
        assert!(caps.contains_key("goog:chromeOptions"));
        assert!(capabilities(false).is_empty());
    }
}
