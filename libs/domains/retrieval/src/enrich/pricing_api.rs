use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EnrichmentProvider;
use crate::error::{RetrievalError, RetrievalResult};
use crate::models::EnrichedItem;

/// Pricing/availability API configuration
#[derive(Debug, Clone)]
pub struct PricingApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl PricingApiConfig {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn from_env() -> RetrievalResult<Self> {
        let base_url = std::env::var("PRICING_API_URL")
            .map_err(|_| RetrievalError::Config("PRICING_API_URL not set".to_string()))?;

        let mut config = Self::new(base_url);
        config.api_key = std::env::var("PRICING_API_KEY").ok();
        Ok(config)
    }
}

/// Enrichment provider backed by a remote pricing/availability API.
///
/// Sends the whole candidate batch in one call; the API contract mirrors
/// [`EnrichmentProvider`]: same items, same order, commerce fields filled in.
pub struct PricingApiEnricher {
    client: Client,
    config: PricingApiConfig,
}

impl PricingApiEnricher {
    pub fn new(config: PricingApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> RetrievalResult<Self> {
        Ok(Self::new(PricingApiConfig::from_env()?))
    }
}

#[derive(Debug, Serialize)]
struct EnrichBatchRequest<'a> {
    items: &'a [EnrichedItem],
}

#[derive(Debug, Deserialize)]
struct EnrichBatchResponse {
    items: Vec<EnrichedItem>,
}

#[async_trait]
impl EnrichmentProvider for PricingApiEnricher {
    async fn enrich(&self, items: Vec<EnrichedItem>) -> RetrievalResult<Vec<EnrichedItem>> {
        if items.is_empty() {
            return Ok(items);
        }

        let mut builder = self
            .client
            .post(format!("{}/enrich", self.config.base_url))
            .json(&EnrichBatchRequest { items: &items });
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(RetrievalError::BackendUnavailable(format!(
                "pricing API error ({}): {}",
                status, detail
            )));
        }

        let body: EnrichBatchResponse = response.json().await?;
        if body.items.len() != items.len() {
            return Err(RetrievalError::Internal(format!(
                "pricing API changed batch size: sent {}, received {}",
                items.len(),
                body.items.len()
            )));
        }

        Ok(body.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config =
            PricingApiConfig::new("https://pricing.test".to_string()).with_api_key("k".to_string());
        assert_eq!(config.base_url, "https://pricing.test");
        assert_eq!(config.api_key.as_deref(), Some("k"));
    }
}
