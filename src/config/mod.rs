//! Run configuration: the static category list and environment-driven settings.
//!
//! ## Environment Configuration
//!
//! | Variable                     | Default                   |
//! |------------------------------|---------------------------|
//! | `CATALOG_OUTPUT`             | `cafecoton-products.json` |
//! | `CATALOG_BACKEND`            | `chrome` (or `http`)      |
//! | `CATALOG_HEADLESS`           | `true`                    |
//! | `CATALOG_NAV_TIMEOUT_SECS`   | `30`                      |
//! | `CATALOG_READY_TIMEOUT_SECS` | `10`                      |
//! | `CATALOG_POLL_MS`            | `250`                     |
//! | `CATALOG_SETTLE_MS`          | `0`                       |
//! | `CATALOG_DEFAULT_CAP`        | `7`                       |
//!
//! A `.env` file in the working directory is honoured by the binary.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CrawlError;
use crate::models::CategoryConfig;

/// Origin of the catalog site crawled by default
pub const SITE_ORIGIN: &str = "https://www.cafecoton.com";

/// The categories crawled on every run, in output order.
pub fn default_categories() -> Vec<CategoryConfig> {
    vec![
        CategoryConfig::new(
            "Chemises",
            format!("{SITE_ORIGIN}/fr/chemises-homme"),
            "chemise",
        ),
        CategoryConfig::new(
            "Pantalons",
            format!("{SITE_ORIGIN}/fr/pantalons-outlet"),
            "pantalon",
        ),
        CategoryConfig::new("Cravates", format!("{SITE_ORIGIN}/fr/cravates"), "cravate"),
        CategoryConfig::new(
            "Accessoires",
            format!("{SITE_ORIGIN}/fr/accessoires"),
            "accessoire",
        ),
    ]
}

/// How pages are loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Headless Chromium over CDP; runs page scripts
    Chrome,
    /// Plain HTTP GET; for server-rendered listings
    Http,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" | "chromium" | "browser" => Ok(Self::Chrome),
            "http" => Ok(Self::Http),
            other => Err(format!("unknown backend \"{other}\" (expected chrome or http)")),
        }
    }
}

/// Bounds on how long a category page may take to become queryable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    /// Upper bound on navigation plus network idle
    pub navigation_timeout: Duration,
    /// Upper bound on waiting for a card container to appear
    pub ready_timeout: Duration,
    /// Delay between container presence checks
    pub poll_interval: Duration,
    /// Extra pause after readiness for lazily rendered content
    pub settle_delay: Duration,
}

impl Default for Readiness {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            ready_timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(250),
            settle_delay: Duration::ZERO,
        }
    }
}

/// Settings for one crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    pub output: PathBuf,
    pub backend: Backend,
    pub headless: bool,
    pub readiness: Readiness,
    /// Result cap for categories that do not set their own
    pub default_cap: usize,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            output: PathBuf::from("cafecoton-products.json"),
            backend: Backend::Chrome,
            headless: true,
            readiness: Readiness::default(),
            default_cap: 7,
        }
    }
}

impl CrawlSettings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, CrawlError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CrawlError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let readiness = Readiness {
            navigation_timeout: parse_or(&lookup, "CATALOG_NAV_TIMEOUT_SECS")?
                .map_or(defaults.readiness.navigation_timeout, Duration::from_secs),
            ready_timeout: parse_or(&lookup, "CATALOG_READY_TIMEOUT_SECS")?
                .map_or(defaults.readiness.ready_timeout, Duration::from_secs),
            poll_interval: parse_or(&lookup, "CATALOG_POLL_MS")?
                .map_or(defaults.readiness.poll_interval, Duration::from_millis),
            settle_delay: parse_or(&lookup, "CATALOG_SETTLE_MS")?
                .map_or(defaults.readiness.settle_delay, Duration::from_millis),
        };

        if readiness.poll_interval.is_zero() {
            return Err(CrawlError::Config {
                key: "CATALOG_POLL_MS".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            output: lookup("CATALOG_OUTPUT")
                .filter(|v| !v.trim().is_empty())
                .map_or(defaults.output, PathBuf::from),
            backend: parse_or(&lookup, "CATALOG_BACKEND")?.unwrap_or(defaults.backend),
            headless: parse_or(&lookup, "CATALOG_HEADLESS")?.unwrap_or(defaults.headless),
            readiness,
            default_cap: parse_or(&lookup, "CATALOG_DEFAULT_CAP")?.unwrap_or(defaults.default_cap),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str) -> Result<Option<T>, CrawlError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| CrawlError::Config {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}
