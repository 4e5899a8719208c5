//! Declarative selector rules and the fallback resolver that evaluates them.
//!
//! Listing pages carry no stable semantic markup, so every field is described
//! by an ordered list of candidate selectors, generic first. The resolver walks
//! the list and keeps the first candidate that produces non-empty text.

use scraper::{ElementRef, Html, Selector};

use crate::error::CrawlError;

/// What to read from a matched element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extract {
    /// Text content with whitespace runs collapsed
    Text,
    /// Value of the named attribute
    Attr(&'static str),
}

/// A CSS query paired with the value it reads
#[derive(Debug, Clone)]
pub struct SelectorRule {
    css: String,
    selector: Selector,
    extract: Extract,
}

impl SelectorRule {
    pub fn new(css: &str, extract: Extract) -> Result<Self, CrawlError> {
        let selector = Selector::parse(css).map_err(|e| CrawlError::InvalidSelector {
            selector: css.to_string(),
            reason: format!("{e:?}"),
        })?;

        Ok(Self {
            css: css.to_string(),
            selector,
            extract,
        })
    }

    pub fn text(css: &str) -> Result<Self, CrawlError> {
        Self::new(css, Extract::Text)
    }

    pub fn attr(css: &str, attr: &'static str) -> Result<Self, CrawlError> {
        Self::new(css, Extract::Attr(attr))
    }

    /// The selector source, as handed to the browser for presence checks
    pub fn css(&self) -> &str {
        &self.css
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Reads this rule's value from the first matching descendant of `root`.
    fn read(&self, root: ElementRef<'_>) -> Option<String> {
        let element = root.select(&self.selector).next()?;
        let value = match self.extract {
            Extract::Text => collapse_whitespace(&element.text().collect::<String>()),
            Extract::Attr(name) => element.value().attr(name)?.trim().to_string(),
        };

        (!value.is_empty()).then_some(value)
    }
}

/// Text as a reader sees it: every Unicode whitespace run, NBSP included,
/// becomes one ASCII space.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the first non-empty value produced by `rules`, in priority order.
pub fn resolve(root: ElementRef<'_>, rules: &[SelectorRule]) -> Option<String> {
    resolve_where(root, rules, |_| true)
}

/// Like [`resolve`], but skips values rejected by `accept` and keeps trying
/// the remaining candidates.
pub fn resolve_where<F>(root: ElementRef<'_>, rules: &[SelectorRule], accept: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    rules
        .iter()
        .filter_map(|rule| rule.read(root))
        .find(|value| accept(value.as_str()))
}

/// Finds product cards using the first container rule that matches anything.
///
/// The adopted rule applies to the whole page; later rules are never mixed
/// in, so a card cannot be picked up twice by overlapping containers.
pub fn discover_cards<'a>(
    document: &'a Html,
    containers: &'a [SelectorRule],
) -> Option<(&'a SelectorRule, Vec<ElementRef<'a>>)> {
    containers.iter().find_map(|rule| {
        let cards: Vec<_> = document.select(rule.selector()).collect();
        (!cards.is_empty()).then_some((rule, cards))
    })
}

/// Selector lists for every field of a product card
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    pub cards: Vec<SelectorRule>,
    pub name: Vec<SelectorRule>,
    pub image: Vec<SelectorRule>,
    pub price: Vec<SelectorRule>,
    pub link: Vec<SelectorRule>,
}

impl ExtractionRules {
    /// Rules tuned for the cafecoton.com listing markup, covering both the
    /// legacy `.product-item` grid and the newer generic card layouts.
    pub fn cafecoton() -> Result<Self, CrawlError> {
        Ok(Self {
            cards: text_rules(&[
                ".product-item",
                ".item",
                ".product",
                ".product-list-item",
                "[data-product]",
                ".product-card",
                ".product-container",
            ])?,
            name: text_rules(&[
                "h2",
                "h3",
                "h4",
                ".product-name",
                ".product-title",
                ".name",
                ".title",
                "a[href*=\"/fr/\"]",
                ".product-item-link",
            ])?,
            image: vec![
                SelectorRule::attr(".product-thumbnail picture img", "src")?,
                SelectorRule::attr("img[data-src]", "data-src")?,
                SelectorRule::attr("img", "src")?,
            ],
            price: text_rules(&[
                ".price-area span",
                ".price",
                ".product-price",
                ".price-box",
                ".special-price",
                ".current-price",
            ])?,
            link: vec![
                SelectorRule::attr(".text a", "href")?,
                SelectorRule::attr("a[href*=\"/fr/\"]", "href")?,
                SelectorRule::attr("a.product-item-link", "href")?,
                SelectorRule::attr("a[href]", "href")?,
            ],
        })
    }
}

fn text_rules(list: &[&str]) -> Result<Vec<SelectorRule>, CrawlError> {
    list.iter().map(|css| SelectorRule::text(css)).collect()
}
