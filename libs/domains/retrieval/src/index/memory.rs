use std::sync::RwLock;

use async_trait::async_trait;

use super::VectorIndex;
use crate::error::{RetrievalError, RetrievalResult};
use crate::models::ScoredPayload;

/// In-memory reference implementation of [`VectorIndex`].
///
/// Stores vectors and payloads in insertion order and answers queries with a
/// brute-force cosine scan. Mutation is serialized against concurrent reads
/// through a read-write lock; no method holds the lock across an await point.
#[derive(Default)]
pub struct InMemoryIndex {
    inner: RwLock<Store>,
}

#[derive(Default)]
struct Store {
    dimension: Option<usize>,
    entries: Vec<(Vec<f32>, serde_json::Value)>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn ensure_schema(&self) -> RetrievalResult<()> {
        Ok(())
    }

    async fn drop_schema(&self) -> RetrievalResult<()> {
        let mut store = self.inner.write().map_err(lock_poisoned)?;
        store.entries.clear();
        store.dimension = None;
        Ok(())
    }

    async fn index(
        &self,
        vectors: Vec<Vec<f32>>,
        payloads: Vec<serde_json::Value>,
    ) -> RetrievalResult<()> {
        if vectors.len() != payloads.len() {
            return Err(RetrievalError::ArityMismatch {
                vectors: vectors.len(),
                payloads: payloads.len(),
            });
        }

        let mut store = self.inner.write().map_err(lock_poisoned)?;

        // Validate every vector before touching the store: a batch either
        // lands completely or not at all.
        let expected = store
            .dimension
            .or_else(|| vectors.first().map(|v| v.len()));
        if let Some(expected) = expected {
            for vector in &vectors {
                if vector.len() != expected {
                    return Err(RetrievalError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
            }
            store.dimension = Some(expected);
        }

        store.entries.extend(vectors.into_iter().zip(payloads));
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> RetrievalResult<Vec<ScoredPayload>> {
        let store = self.inner.read().map_err(lock_poisoned)?;

        if store.entries.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(expected) = store.dimension {
            if vector.len() != expected {
                return Err(RetrievalError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }

        let mut scored: Vec<(usize, f32)> = store
            .entries
            .iter()
            .enumerate()
            .map(|(i, (stored, _))| (i, cosine_similarity(vector, stored)))
            .collect();

        // Stable sort keeps insertion order for tied scores
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredPayload::new(score, store.entries[i].1.clone()))
            .collect())
    }

    async fn count(&self) -> RetrievalResult<usize> {
        let store = self.inner.read().map_err(lock_poisoned)?;
        Ok(store.entries.len())
    }
}

fn lock_poisoned<T>(_: std::sync::PoisonError<T>) -> RetrievalError {
    RetrievalError::Internal("index lock poisoned".to_string())
}

/// Cosine similarity between two equal-length vectors.
///
/// A zero-norm vector is treated as norm 1, clamping the pathological case to
/// a defined score instead of dividing by zero.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = non_zero_norm(a);
    let norm_b = non_zero_norm(b);
    dot / (norm_a * norm_b)
}

fn non_zero_norm(v: &[f32]) -> f32 {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 { 1.0 } else { norm }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(id: &str) -> serde_json::Value {
        json!({ "filepath": id })
    }

    #[tokio::test]
    async fn empty_index_returns_no_hits() {
        let index = InMemoryIndex::new();
        let hits = index.query(&[1.0, 0.0], 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn exact_match_ranks_first() {
        let index = InMemoryIndex::new();
        index
            .index(
                vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.9, 0.1]],
                vec![payload("A"), payload("B"), payload("C")],
            )
            .await
            .unwrap();

        let hits = index.query(&[1.0, 0.0], 3).await.unwrap();
        let order: Vec<&str> = hits.iter().filter_map(|h| h.filepath()).collect();
        assert_eq!(order, vec!["A", "C", "B"]);

        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert!((hits[1].score - 0.9938).abs() < 1e-3);
        assert!(hits[2].score.abs() < 1e-6);
    }

    #[tokio::test]
    async fn arity_mismatch_inserts_nothing() {
        let index = InMemoryIndex::new();
        let err = index
            .index(vec![vec![1.0, 0.0]], vec![payload("A"), payload("B")])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RetrievalError::ArityMismatch { vectors: 1, payloads: 2 }
        ));
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn dimension_mismatch_on_insert_inserts_nothing() {
        let index = InMemoryIndex::new();
        index
            .index(vec![vec![1.0, 0.0]], vec![payload("A")])
            .await
            .unwrap();

        let err = index
            .index(
                vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]],
                vec![payload("B"), payload("C")],
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch { expected: 2, actual: 3 }
        ));
        assert_eq!(index.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn dimension_mismatch_on_query_is_surfaced() {
        let index = InMemoryIndex::new();
        index
            .index(vec![vec![1.0, 0.0]], vec![payload("A")])
            .await
            .unwrap();

        let err = index.query(&[1.0, 0.0, 0.0], 1).await.unwrap_err();
        assert!(matches!(err, RetrievalError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let index = InMemoryIndex::new();
        index
            .index(
                vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![1.0, 0.0]],
                vec![payload("first"), payload("second"), payload("third")],
            )
            .await
            .unwrap();

        let hits = index.query(&[1.0, 0.0], 3).await.unwrap();
        let order: Vec<&str> = hits.iter().filter_map(|h| h.filepath()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn query_returns_at_most_k() {
        let index = InMemoryIndex::new();
        index
            .index(
                vec![vec![1.0, 0.0], vec![0.5, 0.5]],
                vec![payload("A"), payload("B")],
            )
            .await
            .unwrap();

        assert_eq!(index.query(&[1.0, 0.0], 1).await.unwrap().len(), 1);
        assert_eq!(index.query(&[1.0, 0.0], 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn drop_schema_clears_the_store() {
        let index = InMemoryIndex::new();
        index
            .index(vec![vec![1.0, 0.0]], vec![payload("A")])
            .await
            .unwrap();
        index.drop_schema().await.unwrap();

        assert_eq!(index.count().await.unwrap(), 0);
        // A different dimensionality is fine after the reset
        index
            .index(vec![vec![1.0, 0.0, 0.0]], vec![payload("B")])
            .await
            .unwrap();
    }

    #[test]
    fn cosine_bounds_for_unit_vectors() {
        let a = [1.0, 0.0];
        let b = [-1.0, 0.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);

        let c = [0.6, 0.8];
        let sim = cosine_similarity(&a, &c);
        assert!((-1.0..=1.0).contains(&sim));
    }

    #[test]
    fn zero_vector_scores_zero_not_nan() {
        let zero = [0.0, 0.0];
        let v = [1.0, 0.0];
        let sim = cosine_similarity(&zero, &v);
        assert_eq!(sim, 0.0);
        assert!(!sim.is_nan());
    }
}
