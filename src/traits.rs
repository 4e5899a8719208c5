//! Traits and interfaces for backend-agnostic page loading

use async_trait::async_trait;

use crate::error::CrawlError;

/// A single navigable page owned by the crawler for the whole run
#[async_trait]
pub trait BrowserPage: Send {
    /// Navigate to `url` and wait for the document to load and the network
    /// to go quiet.
    ///
    /// # Returns
    /// * `Err(CrawlError::NavigationTimeout)` - The page loaded but never went idle
    /// * `Err(CrawlError::Navigation)` - The URL could not be reached at all
    async fn navigate(&mut self, url: &str) -> Result<(), CrawlError>;

    /// Check whether the current document contains an element matching `css`
    async fn has_selector(&mut self, css: &str) -> Result<bool, CrawlError>;

    /// Serialize the current document to HTML
    async fn content(&mut self) -> Result<String, CrawlError>;

    /// The URL of the current document after redirects, when known
    async fn current_url(&mut self) -> Result<Option<String>, CrawlError> {
        Ok(None)
    }
}

/// A browser process (or equivalent) that hands out pages
#[async_trait]
pub trait BrowserSession: Send {
    type Page: BrowserPage;

    /// Open a fresh page
    async fn new_page(&mut self) -> Result<Self::Page, CrawlError>;

    /// Release the session; called exactly once at the end of a run
    async fn close(&mut self) -> Result<(), CrawlError>;
}
