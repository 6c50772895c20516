use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{ImageEmbedder, l2_normalize};
use crate::error::RetrievalResult;

/// Deterministic embedder for development and tests.
///
/// Derives a unit vector from the image reference itself by expanding
/// SHA-256 digests in counter mode, so the same reference always embeds to
/// the same vector on every platform and toolchain. Swap in a real
/// model-backed provider for production.
pub struct HashedEmbedder {
    dim: usize,
}

impl HashedEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for HashedEmbedder {
    fn default() -> Self {
        Self::new(128)
    }
}

#[async_trait]
impl ImageEmbedder for HashedEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn embed_image(&self, image_ref: &str) -> RetrievalResult<Vec<f32>> {
        Ok(deterministic_vector(image_ref, self.dim))
    }
}

/// Expand a text key into `dim` floats in [-1, 1], unit-normalized.
fn deterministic_vector(key: &str, dim: usize) -> Vec<f32> {
    let mut values = Vec::with_capacity(dim);
    let mut counter: u32 = 0;

    while values.len() < dim {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update(counter.to_be_bytes());
        let digest = hasher.finalize();

        for chunk in digest.chunks_exact(4) {
            if values.len() == dim {
                break;
            }
            let raw = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let unit = raw as f64 / u32::MAX as f64;
            values.push((unit * 2.0 - 1.0) as f32);
        }
        counter += 1;
    }

    l2_normalize(&mut values);
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embedding_is_deterministic() {
        let embedder = HashedEmbedder::new(128);
        let a = embedder.embed_image("SYNTH/img_0001.jpg").await.unwrap();
        let b = embedder.embed_image("SYNTH/img_0001.jpg").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn different_refs_embed_differently() {
        let embedder = HashedEmbedder::new(64);
        let a = embedder.embed_image("a.jpg").await.unwrap();
        let b = embedder.embed_image("b.jpg").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn embedding_has_requested_dimension_and_unit_norm() {
        let embedder = HashedEmbedder::new(100);
        let v = embedder.embed_image("x.jpg").await.unwrap();
        assert_eq!(v.len(), 100);
        assert_eq!(embedder.dimension(), 100);

        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {}", norm);
    }
}
