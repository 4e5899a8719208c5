//! Data models for category configuration and scraped catalog records

use serde::{Deserialize, Serialize};

/// One category listing page to crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryConfig {
    /// Human-readable name used in progress logs
    pub display_name: String,
    /// Listing page URL
    pub target_url: String,
    /// Tag written into every record found on this page
    pub category_tag: String,
    /// Maximum number of valid records to keep; falls back to the crawl default
    pub result_cap: Option<usize>,
}

impl CategoryConfig {
    pub fn new(
        display_name: impl Into<String>,
        target_url: impl Into<String>,
        category_tag: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            target_url: target_url.into(),
            category_tag: category_tag.into(),
            result_cap: None,
        }
    }

    #[must_use]
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.result_cap = Some(cap);
        self
    }
}

/// A product listing scraped from a category page.
///
/// Field order here is the key order of the JSON catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    #[serde(rename = "image")]
    pub image_url: String,
    #[serde(rename = "price")]
    pub price_text: String,
    #[serde(rename = "category")]
    pub category_tag: String,
    #[serde(rename = "link")]
    pub source_url: String,
}

/// The full output of one crawl: categories in configured order, cards in
/// discovery order within each category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogSnapshot {
    records: Vec<ProductRecord>,
}

impl CatalogSnapshot {
    /// Concatenates per-category results without reordering them.
    pub fn concat<I>(categories: I) -> Self
    where
        I: IntoIterator<Item = Vec<ProductRecord>>,
    {
        Self {
            records: categories.into_iter().flatten().collect(),
        }
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<ProductRecord> {
        self.records
    }
}

impl From<Vec<ProductRecord>> for CatalogSnapshot {
    fn from(records: Vec<ProductRecord>) -> Self {
        Self { records }
    }
}
