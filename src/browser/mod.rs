//! Page-loading backends.
//!
//! [`ChromeSession`] drives a local Chromium over the DevTools protocol and is
//! the default, since listing grids are often rendered by page scripts.
//! [`http::HttpSession`] fetches raw HTML for sites that render server-side.

pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Handler, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::CrawlError;
use crate::traits::{BrowserPage, BrowserSession};

/// Quiet period with no new resource loads that counts as network idle
const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

/// A launched Chromium process plus its CDP event loop
pub struct ChromeSession {
    browser: Browser,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

impl ChromeSession {
    /// Launch Chromium.
    ///
    /// # Arguments
    /// * `headless` - Run without a visible window
    /// * `navigation_timeout` - Upper bound for a single CDP request, navigation included
    pub async fn launch(headless: bool, navigation_timeout: Duration) -> Result<Self, CrawlError> {
        let mut builder = BrowserConfig::builder().request_timeout(navigation_timeout);
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(CrawlError::Browser)?;

        let (browser, handler) = Browser::launch(config).await.map_err(browser_error)?;
        let handler = spawn_handler_task(handler);

        info!("Launched Chromium (headless: {})", headless);

        Ok(Self {
            browser,
            handler,
            navigation_timeout,
        })
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    type Page = ChromePage;

    async fn new_page(&mut self) -> Result<ChromePage, CrawlError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(browser_error)?;

        Ok(ChromePage {
            page,
            idle_timeout: self.navigation_timeout,
            target: "about:blank".to_string(),
        })
    }

    async fn close(&mut self) -> Result<(), CrawlError> {
        let closed = self.browser.close().await.map_err(browser_error);
        if let Err(e) = self.browser.wait().await {
            warn!("Chromium did not exit cleanly: {}", e);
        }
        self.handler.abort();
        info!("Closed Chromium");
        closed.map(|_| ())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// The single tab the crawler navigates from category to category
pub struct ChromePage {
    page: Page,
    idle_timeout: Duration,
    /// Last navigation target, for attributing in-page script failures
    target: String,
}

#[async_trait]
impl BrowserPage for ChromePage {
    async fn navigate(&mut self, url: &str) -> Result<(), CrawlError> {
        self.target = url.to_string();
        self.page
            .goto(url)
            .await
            .map_err(|e| page_error(url, e))?;

        let idle = self
            .page
            .evaluate(network_idle_script(self.idle_timeout))
            .await
            .map_err(|e| page_error(url, e))?
            .into_value::<bool>()
            .map_err(|e| script_result_error(url, &e))?;

        if idle {
            Ok(())
        } else {
            Err(CrawlError::NavigationTimeout {
                url: url.to_string(),
            })
        }
    }

    async fn has_selector(&mut self, css: &str) -> Result<bool, CrawlError> {
        let script = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(css)?
        );

        self.page
            .evaluate(script)
            .await
            .map_err(|e| page_error(&self.target, e))?
            .into_value::<bool>()
            .map_err(|e| script_result_error(&self.target, &e))
    }

    async fn content(&mut self) -> Result<String, CrawlError> {
        self.page.content().await.map_err(browser_error)
    }

    async fn current_url(&mut self) -> Result<Option<String>, CrawlError> {
        self.page.url().await.map_err(browser_error)
    }
}

fn spawn_handler_task(mut handler: Handler) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                warn!("Chromium handler event error: {}", e);
            }
        }
    })
}

fn browser_error(err: CdpError) -> CrawlError {
    CrawlError::Browser(err.to_string())
}

/// Failures of a page-level call (navigation or an in-page script).
///
/// Chrome reporting an error for the page, such as `net::ERR_*` or a script
/// context destroyed by a client-side redirect, concerns only that URL. A
/// broken connection or handler is a session failure.
fn page_error(url: &str, err: CdpError) -> CrawlError {
    match err {
        CdpError::Timeout => CrawlError::NavigationTimeout {
            url: url.to_string(),
        },
        CdpError::ChromeMessage(_) | CdpError::JavascriptException(_) => {
            CrawlError::Navigation {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
        other => browser_error(other),
    }
}

fn script_result_error(url: &str, err: &serde_json::Error) -> CrawlError {
    CrawlError::Navigation {
        url: url.to_string(),
        reason: format!("unexpected script result: {err}"),
    }
}

/// In-page heuristic: the document is complete and the number of loaded
/// resources has not changed for [`NETWORK_IDLE_WINDOW`].
fn network_idle_script(timeout: Duration) -> String {
    let timeout_ms = timeout.as_millis();
    let idle_ms = NETWORK_IDLE_WINDOW.as_millis();

    format!(
        r"(async () => {{
            const start = Date.now();
            const interval = 100;
            let last = -1;
            let stable = 0;
            while (Date.now() - start < {timeout_ms}) {{
                let count = last;
                try {{ count = performance.getEntriesByType('resource').length; }} catch (_) {{}}
                if (document.readyState === 'complete' && count === last) {{
                    stable += interval;
                    if (stable >= {idle_ms}) return true;
                }} else {{
                    stable = 0;
                }}
                last = count;
                await new Promise(r => setTimeout(r, interval));
            }}
            return false;
        }})()"
    )
}
