use std::collections::HashSet;

use reqwest::Url;
use scraper::{ElementRef, Html};
use tracing::{debug, info, warn};

use crate::config::Readiness;
use crate::error::CrawlError;
use crate::models::{CategoryConfig, ProductRecord};
use crate::noise::is_promotional_noise;
use crate::selectors::{ExtractionRules, SelectorRule, discover_cards, resolve, resolve_where};
use crate::traits::BrowserPage;

/// Turns one category listing page into validated product records
#[derive(Debug, Clone)]
pub struct CategoryExtractor {
    rules: ExtractionRules,
    readiness: Readiness,
    default_cap: usize,
}

impl CategoryExtractor {
    pub fn new(rules: ExtractionRules, readiness: Readiness, default_cap: usize) -> Self {
        Self {
            rules,
            readiness,
            default_cap,
        }
    }

    pub fn rules(&self) -> &ExtractionRules {
        &self.rules
    }

    /// Load the category page on `page` and extract up to the category's cap.
    ///
    /// An empty vector is a normal outcome. A page that never becomes ready
    /// returns `CrawlError::NavigationTimeout`.
    pub async fn extract<P>(
        &self,
        page: &mut P,
        config: &CategoryConfig,
    ) -> Result<Vec<ProductRecord>, CrawlError>
    where
        P: BrowserPage + ?Sized,
    {
        let cap = config.result_cap.unwrap_or(self.default_cap);
        if cap == 0 {
            info!("Result cap is 0 for {}, skipping", config.display_name);
            return Ok(Vec::new());
        }

        let target = Url::parse(&config.target_url).map_err(|e| CrawlError::Navigation {
            url: config.target_url.clone(),
            reason: format!("invalid URL: {e}"),
        })?;

        self.wait_until_ready(page, &config.target_url).await?;

        if !self.readiness.settle_delay.is_zero() {
            tokio::time::sleep(self.readiness.settle_delay).await;
        }

        let html = page.content().await?;

        // Relative links resolve against the site the browser ended up on
        let landed = page
            .current_url()
            .await?
            .and_then(|u| Url::parse(&u).ok())
            .unwrap_or(target);
        let origin = site_origin(&landed);

        Ok(self.extract_from_html(&html, &origin, config, cap))
    }

    /// Extract records from an already loaded document.
    ///
    /// Cards are visited in document order until `cap` valid records have
    /// been built; rejected and duplicate cards do not count toward the cap.
    pub fn extract_from_html(
        &self,
        html: &str,
        origin: &Url,
        config: &CategoryConfig,
        cap: usize,
    ) -> Vec<ProductRecord> {
        let document = Html::parse_document(html);

        let Some((container, cards)) = discover_cards(&document, &self.rules.cards) else {
            warn!(
                "No product cards matched any container selector on {}",
                config.target_url
            );
            return Vec::new();
        };

        debug!(
            "Using container {} ({} cards) for {}",
            container.css(),
            cards.len(),
            config.display_name
        );

        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut rejected = 0usize;

        for card in cards {
            if records.len() >= cap {
                break;
            }

            let Some(record) = self.build_record(card, origin, &config.category_tag) else {
                rejected += 1;
                continue;
            };

            if !seen.insert(dedup_key(&record.source_url)) {
                debug!("Skipping duplicate listing {}", record.source_url);
                continue;
            }

            records.push(record);
        }

        if rejected > 0 {
            debug!(
                "Rejected {} incomplete or promotional cards on {}",
                rejected, config.display_name
            );
        }

        records
    }

    fn build_record(
        &self,
        card: ElementRef<'_>,
        origin: &Url,
        category_tag: &str,
    ) -> Option<ProductRecord> {
        let name = resolve_where(card, &self.rules.name, |text| !is_promotional_noise(text))?;
        let image_url = resolve_url(card, &self.rules.image, origin)?;
        let price_text = resolve(card, &self.rules.price)?;
        let source_url = resolve_url(card, &self.rules.link, origin)?;

        Some(ProductRecord {
            name,
            image_url,
            price_text,
            category_tag: category_tag.to_string(),
            source_url,
        })
    }

    /// Navigate and wait until the page is safe to query.
    ///
    /// The page is ready once the network went idle or a card container is
    /// present. Neither within the timeouts means `NavigationTimeout`. An idle
    /// page is queried as is; a missing container then just means no cards.
    async fn wait_until_ready<P>(&self, page: &mut P, url: &str) -> Result<(), CrawlError>
    where
        P: BrowserPage + ?Sized,
    {
        let network_idle =
            match tokio::time::timeout(self.readiness.navigation_timeout, page.navigate(url)).await
            {
                Ok(Ok(())) => true,
                Ok(Err(CrawlError::NavigationTimeout { .. })) | Err(_) => {
                    debug!("Network never went idle on {}", url);
                    false
                }
                Ok(Err(e)) => return Err(e),
            };

        if network_idle {
            return Ok(());
        }

        let cards_present =
            match tokio::time::timeout(self.readiness.ready_timeout, self.poll_for_cards(page))
                .await
            {
                Ok(found) => found?,
                Err(_) => false,
            };

        if cards_present {
            Ok(())
        } else {
            Err(CrawlError::NavigationTimeout {
                url: url.to_string(),
            })
        }
    }

    /// Resolves only once a container selector is present, or on error.
    async fn poll_for_cards<P>(&self, page: &mut P) -> Result<bool, CrawlError>
    where
        P: BrowserPage + ?Sized,
    {
        loop {
            for rule in &self.rules.cards {
                if page.has_selector(rule.css()).await? {
                    return Ok(true);
                }
            }
            tokio::time::sleep(self.readiness.poll_interval).await;
        }
    }
}

/// Scheme and host of `url`, as a base for joining root-relative paths.
fn site_origin(url: &Url) -> Url {
    Url::parse(&url.origin().ascii_serialization()).unwrap_or_else(|_| url.clone())
}

/// Resolve `raw` against `origin`, keeping only http(s) results.
fn absolutize(origin: &Url, raw: &str) -> Option<String> {
    if raw.starts_with('#') {
        return None;
    }

    let url = origin.join(raw).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

/// First candidate URL that resolves to an absolute http(s) address.
fn resolve_url(card: ElementRef<'_>, rules: &[SelectorRule], origin: &Url) -> Option<String> {
    resolve_where(card, rules, |raw| absolutize(origin, raw).is_some())
        .and_then(|raw| absolutize(origin, &raw))
}

/// Listing identity within a page; query strings and fragments are ignored.
fn dedup_key(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> CategoryExtractor {
        CategoryExtractor::new(
            ExtractionRules::cafecoton().unwrap(),
            Readiness::default(),
            7,
        )
    }

    fn origin() -> Url {
        Url::parse("https://www.cafecoton.com").unwrap()
    }

    fn config() -> CategoryConfig {
        CategoryConfig::new(
            "Chemises",
            "https://www.cafecoton.com/fr/chemises-homme",
            "chemise",
        )
    }

    fn card(name: &str, href: &str) -> String {
        format!(
            r#"<div class="product-item">
                 <a href="{href}"><img src="/media/{name}.jpg"></a>
                 <h3>{name}</h3>
                 <span class="price">450 DH</span>
               </div>"#
        )
    }

    #[test]
    fn mixed_cards_yield_only_the_valid_one() {
        let html = r#"
            <div class="product-item">
              <a href="/fr/chemise-classique"><img src="https://cdn.cafecoton.com/c1.jpg"></a>
              <h3>Chemise Classique</h3>
              <span class="price">450 DH</span>
            </div>
            <div class="product-item">
              <a href="/fr/outlet"><img src="https://cdn.cafecoton.com/promo.jpg"></a>
              <h3>Jusqu'à -50% OUTLET</h3>
              <span class="price">250 DH</span>
            </div>
            <div class="product-item">
              <a href="/fr/chemise-oxford"></a>
              <h3>Chemise Oxford</h3>
              <span class="price">520 DH</span>
            </div>"#;

        let records = extractor().extract_from_html(html, &origin(), &config(), 3);

        assert_eq!(
            records,
            vec![ProductRecord {
                name: "Chemise Classique".to_string(),
                image_url: "https://cdn.cafecoton.com/c1.jpg".to_string(),
                price_text: "450 DH".to_string(),
                category_tag: "chemise".to_string(),
                source_url: "https://www.cafecoton.com/fr/chemise-classique".to_string(),
            }]
        );
    }

    #[test]
    fn cap_bounds_output_but_not_rejections() {
        let html = [
            r#"<div class="product-item"><h3>Sans image</h3><span class="price">1 DH</span><a href="/fr/x">x</a></div>"#.to_string(),
            card("A", "/fr/a"),
            card("B", "/fr/b"),
            card("C", "/fr/c"),
        ]
        .concat();

        let records = extractor().extract_from_html(&html, &origin(), &config(), 2);
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
    }

    #[test]
    fn noisy_heading_falls_back_to_next_name_candidate() {
        let html = r#"
            <div class="product-item">
              <h2>-30%</h2>
              <span class="product-name">Cravate en soie</span>
              <a href="/fr/cravate-soie"><img src="/img/cravate.jpg"></a>
              <div class="price">300 DH</div>
            </div>"#;

        let records = extractor().extract_from_html(html, &origin(), &config(), 5);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Cravate en soie");
        assert_eq!(records[0].image_url, "https://www.cafecoton.com/img/cravate.jpg");
    }

    #[test]
    fn duplicate_links_are_emitted_once() {
        let html = [
            card("A", "/fr/a?utm=1"),
            card("A", "/fr/a?utm=2"),
            card("B", "/fr/b"),
        ]
        .concat();

        let records = extractor().extract_from_html(&html, &origin(), &config(), 7);
        let links: Vec<_> = records.iter().map(|r| r.source_url.as_str()).collect();
        assert_eq!(
            links,
            [
                "https://www.cafecoton.com/fr/a?utm=1",
                "https://www.cafecoton.com/fr/b"
            ]
        );
    }

    #[test]
    fn fragment_variants_of_a_link_are_one_listing() {
        let html = [
            card("A", "/fr/a"),
            card("A", "/fr/a#avis"),
            card("B", "/fr/b"),
        ]
        .concat();

        let records = extractor().extract_from_html(&html, &origin(), &config(), 7);
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(
            dedup_key("https://www.cafecoton.com/fr/a?utm=1#avis"),
            "https://www.cafecoton.com/fr/a"
        );
    }

    #[test]
    fn placeholder_image_and_hash_link_fall_back_to_later_candidates() {
        let html = r##"
            <div class="product-item">
              <div class="product-thumbnail"><a href="/fr/lazy"><picture>
                <img src="data:image/gif;base64,R0lGODlhAQABAAAAACw=" data-src="/media/lazy.jpg">
              </picture></a></div>
              <div class="text"><a href="/fr/lazy"><span class="title trunc">Chemise Lin</span></a></div>
              <div class="price-area"><span>390 DH</span></div>
            </div>
            <div class="product-item">
              <div class="product-thumbnail"><a href="/fr/hash"><picture><img src="/media/hash.jpg"></picture></a></div>
              <div class="text"><a href="#"><span class="title trunc">Chemise Popeline</span></a></div>
              <div class="price-area"><span>410 DH</span></div>
            </div>"##;

        let records = extractor().extract_from_html(html, &origin(), &config(), 7);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].image_url, "https://www.cafecoton.com/media/lazy.jpg");
        assert_eq!(records[0].source_url, "https://www.cafecoton.com/fr/lazy");
        assert_eq!(records[1].image_url, "https://www.cafecoton.com/media/hash.jpg");
        assert_eq!(records[1].source_url, "https://www.cafecoton.com/fr/hash");
    }

    #[test]
    fn page_without_cards_is_empty() {
        let records =
            extractor().extract_from_html("<p>Bientôt</p>", &origin(), &config(), 7);
        assert!(records.is_empty());
    }

    #[test]
    fn absolutize_resolves_against_origin() {
        let base = origin();
        assert_eq!(
            absolutize(&base, "/fr/chemise-1").as_deref(),
            Some("https://www.cafecoton.com/fr/chemise-1")
        );
        assert_eq!(
            absolutize(&base, "//cdn.cafecoton.com/a.jpg").as_deref(),
            Some("https://cdn.cafecoton.com/a.jpg")
        );
        assert_eq!(
            absolutize(&base, "https://other.example/p").as_deref(),
            Some("https://other.example/p")
        );
        assert_eq!(absolutize(&base, "#"), None);
        assert_eq!(absolutize(&base, "javascript:void(0)"), None);
        assert_eq!(absolutize(&base, "data:image/gif;base64,R0lGOD"), None);
    }

    #[test]
    fn site_origin_drops_path_and_query() {
        let url = Url::parse("https://www.cafecoton.com/fr/cravates?page=1").unwrap();
        assert_eq!(site_origin(&url).as_str(), "https://www.cafecoton.com/");
    }
}
