use anyhow::{Context, Result};
use tracing::{error, info};

use catalog_crawler::browser::ChromeSession;
use catalog_crawler::browser::http::HttpSession;
use catalog_crawler::config::{self, Backend, CrawlSettings};
use catalog_crawler::selectors::ExtractionRules;
use catalog_crawler::traits::BrowserSession;
use catalog_crawler::{CatalogSnapshot, CategoryConfig, CategoryExtractor, Crawler, catalog};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let settings = CrawlSettings::from_env().context("invalid crawler configuration")?;
    let categories = config::default_categories();

    info!(
        "Starting catalog crawl of {} categories ({:?} backend)",
        categories.len(),
        settings.backend
    );

    let extractor = CategoryExtractor::new(
        ExtractionRules::cafecoton()?,
        settings.readiness,
        settings.default_cap,
    );

    let snapshot = match settings.backend {
        Backend::Chrome => {
            let session = ChromeSession::launch(
                settings.headless,
                settings.readiness.navigation_timeout,
            )
            .await
            .context("failed to launch Chromium")?;
            crawl(session, extractor, &categories).await?
        }
        Backend::Http => {
            let session = HttpSession::new(settings.readiness.navigation_timeout)?;
            crawl(session, extractor, &categories).await?
        }
    };

    if let Err(e) = catalog::write(&snapshot, &settings.output) {
        error!("Could not save catalog: {}", e);
        return Err(e.into());
    }

    info!("Scraping complete! Data saved to {}", settings.output.display());
    Ok(())
}

async fn crawl<S: BrowserSession>(
    session: S,
    extractor: CategoryExtractor,
    categories: &[CategoryConfig],
) -> Result<CatalogSnapshot> {
    Crawler::new(session, extractor)
        .run(categories)
        .await
        .context("crawl aborted")
}
