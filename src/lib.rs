//! Headless-browser crawler that snapshots a vendor's category listings into
//! a JSON product catalog.

pub mod browser;
pub mod catalog;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extractor;
pub mod models;
pub mod noise;
pub mod selectors;
pub mod traits;

pub use crawler::Crawler;
pub use error::CrawlError;
pub use extractor::CategoryExtractor;
pub use models::{CatalogSnapshot, CategoryConfig, ProductRecord};
