//! Page automation backends.
//!
//! The scraper only ever talks to a [`Page`]: a rendered document it can query
//! with locator strings and poke with clicks and keystrokes. Two backends exist:
//!
//! | Backend | Module | Use |
//! |---------|--------|-----|
//! | WebDriver | [`webdriver`] | Live runs against a real browser via `fantoccini` |
//! | HTML snapshot | [`snapshot`] | Saved pages parsed with `scraper`; offline runs and tests |
//!
//! # Locators
//!
//! Locators are CSS selectors. Strings starting with `/` or `(` are treated as
//! XPath by the WebDriver backend; the snapshot backend rejects them.

pub mod snapshot;
pub mod webdriver;

use crate::error::DriverError;
use std::fmt::Debug;
use std::time::Duration;

/// A rendered document driven by the scraper.
///
/// Every call is awaited in sequence; implementations never need to be shared
/// across tasks.
pub trait Page {
    /// Handle to one element in the document.
    type Node: Clone + Debug;

    /// Navigate to `url`.
    async fn goto(&mut self, url: &str) -> Result<(), DriverError>;

    /// All elements matching `locator`, in document order.
    async fn find_all(&mut self, locator: &str) -> Result<Vec<Self::Node>, DriverError>;

    /// First descendant of `node` matching `locator`, if any.
    async fn find_within(
        &mut self,
        node: &Self::Node,
        locator: &str,
    ) -> Result<Option<Self::Node>, DriverError>;

    /// Rendered text of `node`, whitespace-collapsed.
    async fn text(&mut self, node: &Self::Node) -> Result<String, DriverError>;

    /// Value of attribute `name` on `node`.
    async fn attr(&mut self, node: &Self::Node, name: &str) -> Result<Option<String>, DriverError>;

    /// Whether `node` is displayed.
    async fn is_displayed(&mut self, node: &Self::Node) -> Result<bool, DriverError>;

    /// Click the first element matching `locator`.
    async fn click(&mut self, locator: &str) -> Result<(), DriverError>;

    /// Replace the value of the input matching `locator` with `text`.
    async fn input_text(&mut self, locator: &str, text: &str) -> Result<(), DriverError>;

    /// Choose the `<option>` with `value` in the `<select>` matching `locator`.
    async fn select_by_value(&mut self, locator: &str, value: &str) -> Result<(), DriverError>;

    /// Wait until an element matching `locator` is displayed.
    ///
    /// # Errors
    ///
    /// [`DriverError::Timeout`] if nothing matching is visible after `timeout`.
    async fn wait_until_visible(&mut self, locator: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Run a script in the page for its side effects.
    async fn execute_script(&mut self, script: &str) -> Result<(), DriverError>;

    /// End the session.
    async fn close(self) -> Result<(), DriverError>
    where
        Self: Sized;
}

/// Collapse runs of whitespace into single spaces and trim.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Gaza \n\t ceasefire  "), "Gaza ceasefire");
        assert_eq!(collapse_whitespace(""), "");
    }
}
