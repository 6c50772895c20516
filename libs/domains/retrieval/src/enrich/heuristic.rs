use async_trait::async_trait;
use regex::Regex;
use sha2::{Digest, Sha256};

use super::EnrichmentProvider;
use crate::error::RetrievalResult;
use crate::models::{EnrichedItem, SOURCE_ONLINE};

const BRAND_PATTERN: &str = r"(?i)(zara|h&m|hm|mango|uniqlo|gap|bershka|nike|adidas|levi)";

const MIN_PRICE: f64 = 15.0;
const MAX_PRICE: f64 = 120.0;

/// Deterministic enrichment stand-in for development.
///
/// Derives price, source, brand, and url from the item path alone, so the
/// same candidate always enriches identically. Fields already present on an
/// item are never overwritten. Swap in a pricing-API-backed provider for
/// production.
pub struct HeuristicEnricher {
    base_url: String,
    brand_pattern: Regex,
}

impl HeuristicEnricher {
    pub fn new() -> Self {
        Self {
            base_url: "https://shop.example/item".to_string(),
            brand_pattern: Regex::new(BRAND_PATTERN).expect("brand pattern is valid"),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn guess_brand(&self, path: &str) -> Option<String> {
        self.brand_pattern
            .find(path)
            .map(|m| m.as_str().to_uppercase())
    }
}

impl Default for HeuristicEnricher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EnrichmentProvider for HeuristicEnricher {
    async fn enrich(&self, items: Vec<EnrichedItem>) -> RetrievalResult<Vec<EnrichedItem>> {
        Ok(items
            .into_iter()
            .map(|mut item| {
                let digest = Sha256::digest(item.filepath.as_bytes());

                if item.price.is_none() {
                    item.price = Some(deterministic_price(&digest));
                }
                if item.source.is_none() {
                    let source = if digest[4] % 2 == 0 { SOURCE_ONLINE } else { "store" };
                    item.source = Some(source.to_string());
                }
                if item.brand.is_none() {
                    item.brand = self.guess_brand(&item.filepath);
                }
                if item.url.is_none() {
                    item.url = Some(format!("{}?q={}", self.base_url, hex_prefix(&digest, 5)));
                }

                item
            })
            .collect())
    }
}

/// Price in [MIN_PRICE, MAX_PRICE] derived from the digest, 2 decimal places
fn deterministic_price(digest: &[u8]) -> f64 {
    let raw = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    let unit = raw as f64 / u32::MAX as f64;
    let price = MIN_PRICE + unit * (MAX_PRICE - MIN_PRICE);
    (price * 100.0).round() / 100.0
}

fn hex_prefix(digest: &[u8], bytes: usize) -> String {
    digest[..bytes]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemMetadata, RetrievalCandidate};

    fn item(filepath: &str) -> EnrichedItem {
        EnrichedItem::from(RetrievalCandidate {
            id: filepath.to_string(),
            filepath: filepath.to_string(),
            similarity: 0.5,
            metadata: ItemMetadata::default(),
        })
    }

    #[tokio::test]
    async fn preserves_length_and_order() {
        let enricher = HeuristicEnricher::new();
        let batch = vec![item("a.jpg"), item("b.jpg"), item("c.jpg")];

        let enriched = enricher.enrich(batch).await.unwrap();
        let ids: Vec<&str> = enriched.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[tokio::test]
    async fn fills_price_in_range_deterministically() {
        let enricher = HeuristicEnricher::new();

        let first = enricher.enrich(vec![item("a.jpg")]).await.unwrap();
        let second = enricher.enrich(vec![item("a.jpg")]).await.unwrap();

        let price = first[0].price.unwrap();
        assert_eq!(first[0].price, second[0].price);
        assert!((15.0..=120.0).contains(&price));
    }

    #[tokio::test]
    async fn does_not_overwrite_existing_fields() {
        let enricher = HeuristicEnricher::new();
        let mut seeded = item("a.jpg");
        seeded.price = Some(9.99);
        seeded.source = Some("store".to_string());
        seeded.brand = Some("ACME".to_string());

        let enriched = enricher.enrich(vec![seeded]).await.unwrap();
        assert_eq!(enriched[0].price, Some(9.99));
        assert_eq!(enriched[0].source.as_deref(), Some("store"));
        assert_eq!(enriched[0].brand.as_deref(), Some("ACME"));
    }

    #[tokio::test]
    async fn guesses_brand_from_path() {
        let enricher = HeuristicEnricher::new();
        let enriched = enricher
            .enrich(vec![item("data/zara/coat_01.jpg")])
            .await
            .unwrap();
        assert_eq!(enriched[0].brand.as_deref(), Some("ZARA"));

        let enriched = enricher.enrich(vec![item("data/coat_01.jpg")]).await.unwrap();
        assert!(enriched[0].brand.is_none());
    }

    #[tokio::test]
    async fn synthesizes_a_url() {
        let enricher = HeuristicEnricher::new().with_base_url("https://x.test/i".to_string());
        let enriched = enricher.enrich(vec![item("a.jpg")]).await.unwrap();
        assert!(enriched[0].url.as_deref().unwrap().starts_with("https://x.test/i?q="));
    }
}
