use tracing::{error, info, warn};

use crate::error::CrawlError;
use crate::extractor::CategoryExtractor;
use crate::models::{CatalogSnapshot, CategoryConfig};
use crate::traits::BrowserSession;

/// Drives one crawl run over a single browser session and page.
///
/// Categories are loaded one after the other on the same page; navigation
/// resets page state, so no per-category browser is needed.
pub struct Crawler<S: BrowserSession> {
    session: S,
    extractor: CategoryExtractor,
}

impl<S: BrowserSession> Crawler<S> {
    pub fn new(session: S, extractor: CategoryExtractor) -> Self {
        Self { session, extractor }
    }

    /// Crawl `configs` in order and return the combined snapshot.
    ///
    /// The session is closed on every exit path. Category-local failures
    /// become empty results; any other error ends the run.
    pub async fn run(mut self, configs: &[CategoryConfig]) -> Result<CatalogSnapshot, CrawlError> {
        let outcome = self.crawl_categories(configs).await;

        if let Err(e) = self.session.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        outcome
    }

    async fn crawl_categories(
        &mut self,
        configs: &[CategoryConfig],
    ) -> Result<CatalogSnapshot, CrawlError> {
        let mut page = self.session.new_page().await?;
        let mut per_category = Vec::with_capacity(configs.len());

        for config in configs {
            info!("Scraping {}...", config.display_name);

            let records = match self.extractor.extract(&mut page, config).await {
                Ok(records) => records,
                Err(e) if e.is_category_local() => {
                    warn!("Skipping {}: {}", config.display_name, e);
                    Vec::new()
                }
                Err(e) => {
                    error!("Aborting crawl at {}: {}", config.display_name, e);
                    return Err(e);
                }
            };

            if records.is_empty() {
                warn!("Found 0 products in {}", config.display_name);
            } else {
                info!("Found {} products in {}", records.len(), config.display_name);
            }

            per_category.push(records);
        }

        let snapshot = CatalogSnapshot::concat(per_category);
        info!(
            "Crawl finished: {} products across {} categories",
            snapshot.len(),
            configs.len()
        );
        Ok(snapshot)
    }
}
