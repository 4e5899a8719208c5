#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use catalog_crawler::config::Readiness;
use catalog_crawler::selectors::ExtractionRules;
use catalog_crawler::traits::{BrowserPage, BrowserSession};
use catalog_crawler::{CategoryConfig, CategoryExtractor, CrawlError};

pub const ORIGIN: &str = "https://shop.test";

/// How the fake browser behaves for a URL
#[derive(Clone)]
pub enum Response {
    /// Loads and goes idle with this document
    Html(String),
    /// Renders this document but the network never settles
    Busy(String),
    /// Navigation hangs forever and nothing renders
    Stall,
    /// The browser dies
    Crash,
}

#[derive(Clone, Default)]
pub struct FakeBrowser {
    responses: Arc<HashMap<String, Response>>,
    pub closed: Arc<AtomicBool>,
    pub visited: Arc<Mutex<Vec<String>>>,
}

impl FakeBrowser {
    pub fn new(responses: Vec<(String, Response)>) -> Self {
        Self {
            responses: Arc::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

#[async_trait]
impl BrowserSession for FakeBrowser {
    type Page = FakePage;

    async fn new_page(&mut self) -> Result<FakePage, CrawlError> {
        Ok(FakePage {
            browser: self.clone(),
            document: None,
            url: None,
        })
    }

    async fn close(&mut self) -> Result<(), CrawlError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakePage {
    browser: FakeBrowser,
    document: Option<String>,
    url: Option<String>,
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn navigate(&mut self, url: &str) -> Result<(), CrawlError> {
        self.browser.visited.lock().unwrap().push(url.to_string());
        self.document = None;
        self.url = Some(url.to_string());

        match self.browser.responses.get(url).cloned() {
            Some(Response::Html(html)) => {
                self.document = Some(html);
                Ok(())
            }
            Some(Response::Busy(html)) => {
                self.document = Some(html);
                Err(CrawlError::NavigationTimeout {
                    url: url.to_string(),
                })
            }
            Some(Response::Stall) => {
                std::future::pending::<()>().await;
                Ok(())
            }
            Some(Response::Crash) => Err(CrawlError::Browser("target crashed".to_string())),
            None => Err(CrawlError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            }),
        }
    }

    async fn has_selector(&mut self, css: &str) -> Result<bool, CrawlError> {
        let Some(html) = &self.document else {
            return Ok(false);
        };
        let selector = scraper::Selector::parse(css).unwrap();
        Ok(scraper::Html::parse_document(html)
            .select(&selector)
            .next()
            .is_some())
    }

    async fn content(&mut self) -> Result<String, CrawlError> {
        Ok(self.document.clone().unwrap_or_default())
    }

    async fn current_url(&mut self) -> Result<Option<String>, CrawlError> {
        Ok(self.url.clone())
    }
}

pub fn fast_readiness() -> Readiness {
    Readiness {
        navigation_timeout: Duration::from_millis(100),
        ready_timeout: Duration::from_millis(100),
        poll_interval: Duration::from_millis(10),
        settle_delay: Duration::ZERO,
    }
}

pub fn extractor() -> CategoryExtractor {
    CategoryExtractor::new(ExtractionRules::cafecoton().unwrap(), fast_readiness(), 7)
}

pub fn category(tag: &str) -> CategoryConfig {
    CategoryConfig::new(tag.to_uppercase(), url(tag), tag)
}

pub fn url(tag: &str) -> String {
    format!("{ORIGIN}/fr/{tag}")
}

/// A well-formed `.product-item` card
pub fn card(name: &str, slug: &str) -> String {
    format!(
        r#"<div class="product-item">
             <div class="product-thumbnail"><a href="/fr/{slug}"><picture><img src="/media/{slug}.jpg"></picture></a></div>
             <div class="text"><a href="/fr/{slug}"><span class="title trunc">{name}</span></a></div>
             <div class="price-area"><span>450 DH</span></div>
           </div>"#
    )
}

pub fn page(cards: &[String]) -> String {
    format!(
        "<html><body><div class=\"products\">{}</div></body></html>",
        cards.concat()
    )
}
