//! Plain HTTP backend for server-rendered listing pages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::warn;

use crate::error::CrawlError;
use crate::traits::{BrowserPage, BrowserSession};

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

pub struct HttpSession {
    client: Client,
}

impl HttpSession {
    pub fn new(navigation_timeout: Duration) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(navigation_timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl BrowserSession for HttpSession {
    type Page = HttpPage;

    async fn new_page(&mut self) -> Result<HttpPage, CrawlError> {
        Ok(HttpPage {
            client: self.client.clone(),
            html: String::new(),
            url: None,
        })
    }

    async fn close(&mut self) -> Result<(), CrawlError> {
        Ok(())
    }
}

/// The last fetched document, queried like a loaded tab
pub struct HttpPage {
    client: Client,
    html: String,
    url: Option<String>,
}

#[async_trait]
impl BrowserPage for HttpPage {
    async fn navigate(&mut self, url: &str) -> Result<(), CrawlError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            // Keep the body, as a browser would render the error page
            warn!("{} answered {}", url, status);
        }

        self.url = Some(response.url().to_string());
        self.html = response.text().await.map_err(|e| body_error(url, &e))?;

        Ok(())
    }

    async fn has_selector(&mut self, css: &str) -> Result<bool, CrawlError> {
        contains_selector(&self.html, css)
    }

    async fn content(&mut self) -> Result<String, CrawlError> {
        Ok(self.html.clone())
    }

    async fn current_url(&mut self) -> Result<Option<String>, CrawlError> {
        Ok(self.url.clone())
    }
}

fn contains_selector(html: &str, css: &str) -> Result<bool, CrawlError> {
    let selector = Selector::parse(css).map_err(|e| CrawlError::InvalidSelector {
        selector: css.to_string(),
        reason: format!("{e:?}"),
    })?;

    Ok(Html::parse_document(html).select(&selector).next().is_some())
}

fn request_error(url: &str, err: reqwest::Error) -> CrawlError {
    if err.is_timeout() {
        CrawlError::NavigationTimeout {
            url: url.to_string(),
        }
    } else if err.is_connect() || err.is_request() || err.is_redirect() {
        CrawlError::Navigation {
            url: url.to_string(),
            reason: err.to_string(),
        }
    } else {
        CrawlError::Http(err)
    }
}

/// A body that breaks off or fails to decode only spoils this page.
fn body_error(url: &str, err: &reqwest::Error) -> CrawlError {
    if err.is_timeout() {
        CrawlError::NavigationTimeout {
            url: url.to_string(),
        }
    } else {
        CrawlError::Navigation {
            url: url.to_string(),
            reason: format!("could not read body: {err}"),
        }
    }
}
