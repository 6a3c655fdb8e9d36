use crate::error::Result;
use std::time::Duration;

/// How long `goto` waits once the page has loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// After the load event, poll until no new resources arrive for a quiet
    /// period, bounded by what is left of the navigation timeout. A network
    /// that never settles is not an error (search and listing pages).
    NetworkIdle,
    /// Return once the navigation's load event fires, which the Chromium
    /// engine already waits for (profile pages)
    DomContentLoaded,
}

/// Page-level operations the scraper needs from a browser.
///
/// Selector queries return `Ok(None)`/empty when nothing matches; `Err` is
/// reserved for faults such as an invalid selector or a detached node.
#[async_trait::async_trait]
pub trait PageActions: Send + Sync {
    /// Navigate to a URL, failing with `NavigationTimeout` past `timeout`
    async fn goto(&self, url: &str, wait: WaitUntil, timeout: Duration) -> Result<()>;

    /// Inner text of the first element matching `selector`
    async fn query_text(&self, selector: &str) -> Result<Option<String>>;

    /// Inner text of every element matching `selector`, in document order
    async fn query_all_text(&self, selector: &str) -> Result<Vec<String>>;

    /// Value of attribute `name` on every matching element that carries it
    async fn query_all_attr(&self, selector: &str, name: &str) -> Result<Vec<String>>;

    /// Whether any element matches `selector`
    async fn exists(&self, selector: &str) -> Result<bool>;

    /// Serialized markup of the current document
    async fn content(&self) -> Result<String>;

    /// Scroll to the bottom of the document to trigger lazy loading
    async fn scroll_to_end(&self) -> Result<()>;
}
