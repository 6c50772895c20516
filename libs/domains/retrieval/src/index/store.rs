use async_trait::async_trait;

use crate::error::RetrievalResult;
use crate::models::ScoredPayload;

/// Trait for similarity-index backends.
///
/// An index stores (vector, payload) pairs and answers k-nearest-neighbor
/// queries under cosine similarity. Backends may approximate for very large
/// stores but must keep the observable contract: deterministic top-k by the
/// same metric, ties broken by insertion order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Create backing storage if it does not exist yet.
    ///
    /// Administrative flows only; the retrieval hot path never calls this.
    async fn ensure_schema(&self) -> RetrievalResult<()>;

    /// Drop backing storage, discarding all stored vectors.
    async fn drop_schema(&self) -> RetrievalResult<()>;

    /// Append (vector, payload) pairs.
    ///
    /// Fails with `ArityMismatch` when the two sequences differ in length and
    /// with `DimensionMismatch` when any vector's dimensionality differs from
    /// what the index already holds. Either way nothing is inserted; partial
    /// insertion would leave the index silently incomplete.
    async fn index(
        &self,
        vectors: Vec<Vec<f32>>,
        payloads: Vec<serde_json::Value>,
    ) -> RetrievalResult<()>;

    /// The `min(k, stored)` nearest stored vectors by descending similarity.
    ///
    /// An empty index yields an empty result, not an error.
    async fn query(&self, vector: &[f32], k: usize) -> RetrievalResult<Vec<ScoredPayload>>;

    /// Number of stored vectors
    async fn count(&self) -> RetrievalResult<usize>;
}
