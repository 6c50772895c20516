use async_trait::async_trait;

use crate::error::RetrievalResult;
use crate::models::ItemMetadata;

/// Trait for catalog providers.
///
/// A catalog enumerates indexable item ids and serves their commerce
/// metadata. Sampling must be deterministic for a fixed catalog state so the
/// index build is reproducible.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Sample up to `limit` item ids in a stable order
    async fn sample_paths(&self, limit: usize) -> RetrievalResult<Vec<String>>;

    /// Metadata for an item id.
    ///
    /// Fails with `NotFound` for ids the catalog does not recognize; callers
    /// on the retrieval hot path recover from that locally instead of
    /// aborting the request.
    async fn get_metadata(&self, id: &str) -> RetrievalResult<ItemMetadata>;
}
