//! Error taxonomy for the crawler.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("page {url} did not become ready before the navigation timeout")]
    NavigationTimeout { url: String },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("invalid selector \"{selector}\": {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("browser session error: {0}")]
    Browser(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid value for {key}: {reason}")]
    Config { key: String, reason: String },
}

impl CrawlError {
    /// Errors that only affect the category being crawled.
    ///
    /// The crawler turns these into an empty result for that category and
    /// moves on; everything else ends the run.
    #[must_use]
    pub fn is_category_local(&self) -> bool {
        matches!(
            self,
            Self::NavigationTimeout { .. } | Self::Navigation { .. }
        )
    }
}
