use async_trait::async_trait;

use crate::error::RetrievalResult;
use crate::models::EnrichedItem;

/// Trait for commerce enrichment providers.
///
/// A provider receives a batch of partially-populated items and fills in the
/// commerce fields it owns (price, currency, source, url), leaving everything
/// else untouched. The output must contain the same items in the same order;
/// the orchestrator treats enrichment as a pure batch transform and rejects
/// providers that drop or reorder items.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    async fn enrich(&self, items: Vec<EnrichedItem>) -> RetrievalResult<Vec<EnrichedItem>>;
}
