//! Offline backend over saved HTML pages, parsed with `scraper`.
//!
//! A snapshot is a sequence of pages. The first page is shown initially; each
//! click on the reveal-more control appends the next page, the way the live
//! site appends another batch of cards. The reveal-more control only counts
//! when it is on the most recently revealed page, so a final page without one
//! ends pagination. Other single-control queries search the newest page first;
//! [`Page::find_all`] walks all revealed pages in order.
//!
//! Nothing ever changes on its own, so [`Page::wait_until_visible`] answers
//! immediately. An element counts as hidden when it or an ancestor carries the
//! `hidden` attribute or an inline `display: none`.

use super::{Page, collapse_whitespace};
use crate::error::DriverError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// A card or control inside a snapshot, carried as its outer HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotNode {
    html: String,
}

impl SnapshotNode {
    fn fragment(&self) -> Html {
        Html::parse_fragment(&self.html)
    }
}

/// Saved search result pages standing in for a live browser.
pub struct SnapshotPage {
    pages: Vec<Html>,
    revealed: usize,
    reveal_locator: String,
    visited: Vec<String>,
    typed: HashMap<String, String>,
    selected: HashMap<String, String>,
    scripts: Vec<String>,
    reveal_clicks: usize,
}

impl SnapshotPage {
    /// Build a snapshot from page sources. Clicking `reveal_locator` reveals
    /// the next page.
    pub fn new<I, S>(pages: I, reveal_locator: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pages: Vec<Html> = pages
            .into_iter()
            .map(|source| Html::parse_document(source.as_ref()))
            .collect();
        Self {
            revealed: pages.len().min(1),
            pages,
            reveal_locator: reveal_locator.into(),
            visited: Vec::new(),
            typed: HashMap::new(),
            selected: HashMap::new(),
            scripts: Vec::new(),
            reveal_clicks: 0,
        }
    }

    /// Load page sources from files, in order.
    pub fn from_files<P: AsRef<Path>>(
        paths: &[P],
        reveal_locator: impl Into<String>,
    ) -> std::io::Result<Self> {
        let sources = paths
            .iter()
            .map(std::fs::read_to_string)
            .collect::<std::io::Result<Vec<_>>>()?;
        Ok(Self::new(sources, reveal_locator))
    }

    /// URLs passed to [`Page::goto`].
    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    /// Last text typed into `locator`.
    pub fn typed(&self, locator: &str) -> Option<&str> {
        self.typed.get(locator).map(String::as_str)
    }

    /// Last option value chosen in `locator`.
    pub fn selected(&self, locator: &str) -> Option<&str> {
        self.selected.get(locator).map(String::as_str)
    }

    /// Scripts passed to [`Page::execute_script`].
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Number of clicks on the reveal-more control, effective or not.
    pub fn reveal_clicks(&self) -> usize {
        self.reveal_clicks
    }

    fn revealed_pages(&self) -> &[Html] {
        &self.pages[..self.revealed]
    }

    /// Pages a control lookup may search.
    fn control_pages(&self, locator: &str) -> &[Html] {
        let pages = self.revealed_pages();
        if locator == self.reveal_locator && !pages.is_empty() {
            &pages[pages.len() - 1..]
        } else {
            pages
        }
    }

    /// First element matching `selector`, newest page first.
    fn find_control(&self, locator: &str, selector: &Selector) -> Option<ElementRef<'_>> {
        self.control_pages(locator)
            .iter()
            .rev()
            .find_map(|page| page.select(selector).next())
    }
}

fn parse_selector(locator: &str) -> Result<Selector, DriverError> {
    if locator.starts_with('/') || locator.starts_with('(') {
        return Err(DriverError::InvalidLocator(locator.to_string()));
    }
    Selector::parse(locator).map_err(|_| DriverError::InvalidLocator(locator.to_string()))
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    let value = element.value();
    value.attr("hidden").is_some()
        || value
            .attr("style")
            .map(|style| style.replace(' ', "").to_lowercase().contains("display:none"))
            .unwrap_or(false)
}

fn is_visible(element: ElementRef<'_>) -> bool {
    std::iter::once(element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .all(|e| !is_hidden(e))
}

/// The element a fragment was parsed from.
fn top_element(fragment: &Html) -> Option<ElementRef<'_>> {
    fragment.root_element().children().find_map(ElementRef::wrap)
}

impl Page for SnapshotPage {
    type Node = SnapshotNode;

    async fn goto(&mut self, url: &str) -> Result<(), DriverError> {
        self.visited.push(url.to_string());
        Ok(())
    }

    async fn find_all(&mut self, locator: &str) -> Result<Vec<SnapshotNode>, DriverError> {
        let selector = parse_selector(locator)?;
        Ok(self
            .revealed_pages()
            .iter()
            .flat_map(|page| page.select(&selector))
            .map(|element| SnapshotNode {
                html: element.html(),
            })
            .collect())
    }

    async fn find_within(
        &mut self,
        node: &SnapshotNode,
        locator: &str,
    ) -> Result<Option<SnapshotNode>, DriverError> {
        let selector = parse_selector(locator)?;
        let fragment = node.fragment();
        let found = fragment.select(&selector).next().map(|element| SnapshotNode {
            html: element.html(),
        });
        Ok(found)
    }

    async fn text(&mut self, node: &SnapshotNode) -> Result<String, DriverError> {
        let fragment = node.fragment();
        let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
        Ok(collapse_whitespace(&text))
    }

    async fn attr(&mut self, node: &SnapshotNode, name: &str) -> Result<Option<String>, DriverError> {
        let fragment = node.fragment();
        Ok(top_element(&fragment)
            .and_then(|element| element.value().attr(name))
            .map(str::to_string))
    }

    async fn is_displayed(&mut self, node: &SnapshotNode) -> Result<bool, DriverError> {
        let fragment = node.fragment();
        Ok(top_element(&fragment).map(|e| !is_hidden(e)).unwrap_or(false))
    }

    async fn click(&mut self, locator: &str) -> Result<(), DriverError> {
        let selector = parse_selector(locator)?;
        let visible = self
            .find_control(locator, &selector)
            .map(is_visible)
            .ok_or_else(|| DriverError::NoSuchElement(locator.to_string()))?;
        if !visible {
            return Err(DriverError::Command(format!("`{locator}` is not interactable")));
        }

        if locator == self.reveal_locator {
            self.reveal_clicks += 1;
            if self.revealed < self.pages.len() {
                self.revealed += 1;
            }
            debug!(revealed = self.revealed, total = self.pages.len(), "Snapshot reveal");
        }
        Ok(())
    }

    async fn input_text(&mut self, locator: &str, text: &str) -> Result<(), DriverError> {
        let selector = parse_selector(locator)?;
        if self.find_control(locator, &selector).is_none() {
            return Err(DriverError::NoSuchElement(locator.to_string()));
        }
        self.typed.insert(locator.to_string(), text.to_string());
        Ok(())
    }

    async fn select_by_value(&mut self, locator: &str, value: &str) -> Result<(), DriverError> {
        let selector = parse_selector(locator)?;
        let option = parse_selector("option")?;
        let select = self
            .find_control(locator, &selector)
            .ok_or_else(|| DriverError::NoSuchElement(locator.to_string()))?;
        let has_option = select
            .select(&option)
            .any(|o| o.value().attr("value") == Some(value));
        if !has_option {
            return Err(DriverError::NoSuchElement(format!(
                "{locator} option[value={value}]"
            )));
        }
        self.selected.insert(locator.to_string(), value.to_string());
        Ok(())
    }

    async fn wait_until_visible(&mut self, locator: &str, timeout: Duration) -> Result<(), DriverError> {
        let selector = parse_selector(locator)?;
        let visible = self
            .control_pages(locator)
            .iter()
            .flat_map(|page| page.select(&selector))
            .any(is_visible);
        if visible {
            Ok(())
        } else {
            Err(DriverError::Timeout {
                locator: locator.to_string(),
                timeout,
            })
        }
    }

    async fn execute_script(&mut self, script: &str) -> Result<(), DriverError> {
        self.scripts.push(script.to_string());
        Ok(())
    }

    async fn close(self) -> Result<(), DriverError> {
        Ok(())
    }
}
