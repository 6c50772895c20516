use async_trait::async_trait;

use crate::error::RetrievalResult;

/// Trait for image embedding providers.
///
/// Implementations map an image reference to a fixed-length vector. A given
/// provider instance must be deterministic: the same reference always yields
/// the same vector, and index-time and query-time calls must share the same
/// norm convention (implementations normalize to unit length internally).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageEmbedder: Send + Sync {
    /// Fixed output dimensionality of this provider instance
    fn dimension(&self) -> usize;

    /// Embed an image reference into a unit-length vector.
    ///
    /// Fails with `UnreadableInput` when the reference cannot be resolved or
    /// decoded.
    async fn embed_image(&self, image_ref: &str) -> RetrievalResult<Vec<f32>>;
}
