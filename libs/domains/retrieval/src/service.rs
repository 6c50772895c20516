use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::catalog::CatalogProvider;
use crate::embedding::ImageEmbedder;
use crate::enrich::EnrichmentProvider;
use crate::error::{RetrievalError, RetrievalResult};
use crate::index::VectorIndex;
use crate::models::{
    EnrichedItem, ItemMetadata, RetrievalCandidate, RetrievalOptions, RetrievalResponse,
};
use crate::ranking;

/// Default number of catalog items sampled into the lazily-built index
const DEFAULT_INDEX_LIMIT: usize = 200;

/// Retrieval orchestrator.
///
/// Composes the embedding, catalog, similarity-index and enrichment
/// contracts into the retrieve pipeline: lazy index build, query embedding,
/// candidate retrieval, metadata merge, batch enrichment, ranking, and
/// truncation.
///
/// Options are passed per call rather than held as mutable state, and the
/// one-shot lazy build is guarded by a mutex, so concurrent callers cannot
/// race on configuration or trigger a second build.
pub struct RetrievalService<I: VectorIndex> {
    index: I,
    embedder: Arc<dyn ImageEmbedder>,
    catalog: Arc<dyn CatalogProvider>,
    enricher: Arc<dyn EnrichmentProvider>,
    indexed: Mutex<bool>,
    default_index_limit: usize,
}

impl<I: VectorIndex> RetrievalService<I> {
    pub fn new(
        index: I,
        embedder: Arc<dyn ImageEmbedder>,
        catalog: Arc<dyn CatalogProvider>,
        enricher: Arc<dyn EnrichmentProvider>,
    ) -> Self {
        Self {
            index,
            embedder,
            catalog,
            enricher,
            indexed: Mutex::new(false),
            default_index_limit: DEFAULT_INDEX_LIMIT,
        }
    }

    pub fn with_default_index_limit(mut self, limit: usize) -> Self {
        self.default_index_limit = limit;
        self
    }

    /// Retrieve the `top_k` catalog items most similar to the query image,
    /// enriched with commerce metadata and ranked.
    pub async fn retrieve(
        &self,
        query_image: &str,
        options: &RetrievalOptions,
    ) -> RetrievalResult<RetrievalResponse> {
        if options.top_k == 0 {
            return Err(RetrievalError::Validation(
                "top_k must be at least 1".to_string(),
            ));
        }

        self.ensure_indexed().await?;

        let query_vector = self.embedder.embed_image(query_image).await?;
        if query_vector.len() != self.embedder.dimension() {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.embedder.dimension(),
                actual: query_vector.len(),
            });
        }

        let candidates = self
            .retrieve_candidates(&query_vector, options.top_k)
            .await?;

        let items: Vec<EnrichedItem> = candidates.into_iter().map(EnrichedItem::from).collect();
        let batch_size = items.len();

        let mut enriched = self.enricher.enrich(items).await?;
        if enriched.len() != batch_size {
            return Err(RetrievalError::Internal(format!(
                "enrichment provider changed batch size: sent {}, received {}",
                batch_size,
                enriched.len()
            )));
        }

        ranking::rank(&mut enriched, options);
        enriched.truncate(options.top_k);

        Ok(RetrievalResponse {
            query_image: query_image.to_string(),
            results: enriched,
        })
    }

    /// Force the index-build step to run again.
    ///
    /// Rebuild payloads carry full catalog metadata so an external backend
    /// can serve degraded results without a catalog lookup. Without
    /// `rebuild_schema` the build appends into the existing store; pass
    /// `rebuild_schema: true` to drop and recreate it first.
    pub async fn rebuild_index(&self, limit: usize, rebuild_schema: bool) -> RetrievalResult<usize> {
        let mut indexed = self.indexed.lock().await;

        if rebuild_schema {
            if let Err(err) = self.index.drop_schema().await {
                warn!("dropping index schema failed (may not exist yet): {}", err);
            }
            *indexed = false;
        }
        self.index.ensure_schema().await?;

        let count = self.build_index(limit, true).await?;
        *indexed = true;
        info!(count, "similarity index rebuilt");
        Ok(count)
    }

    /// One-shot lazy build guarded by the `indexed` mutex: a concurrent first
    /// caller waits for the in-flight build and observes it complete, never
    /// triggers a second one. A failed build leaves the flag unset so the
    /// next call retries.
    async fn ensure_indexed(&self) -> RetrievalResult<()> {
        let mut indexed = self.indexed.lock().await;
        if *indexed {
            return Ok(());
        }

        let count = self.build_index(self.default_index_limit, false).await?;
        *indexed = true;
        info!(count, "similarity index built lazily");
        Ok(())
    }

    /// Sample the catalog, embed every item, and hand the whole batch to the
    /// index in one call. Any embedding failure aborts the build: a partially
    /// populated index silently treated as complete is worse than a clearly
    /// failed one.
    async fn build_index(&self, limit: usize, with_metadata: bool) -> RetrievalResult<usize> {
        let paths = self.catalog.sample_paths(limit).await?;

        let mut vectors = Vec::with_capacity(paths.len());
        let mut payloads = Vec::with_capacity(paths.len());
        for path in &paths {
            vectors.push(self.embedder.embed_image(path).await?);
            payloads.push(self.build_payload(path, with_metadata).await?);
        }

        let count = vectors.len();
        self.index.index(vectors, payloads).await?;
        Ok(count)
    }

    async fn build_payload(
        &self,
        path: &str,
        with_metadata: bool,
    ) -> RetrievalResult<serde_json::Value> {
        if !with_metadata {
            return Ok(json!({ "filepath": path }));
        }

        let metadata = match self.catalog.get_metadata(path).await {
            Ok(metadata) => metadata,
            Err(RetrievalError::NotFound(_)) => ItemMetadata::default(),
            Err(err) => return Err(err),
        };

        let mut payload = serde_json::to_value(&metadata)?;
        if let Some(map) = payload.as_object_mut() {
            map.insert("filepath".to_string(), json!(path));
        }
        Ok(payload)
    }

    /// Query the index and merge catalog metadata into each hit.
    ///
    /// A `NotFound` on an individual candidate degrades that candidate to the
    /// fields its index payload already carried; it never aborts the request.
    async fn retrieve_candidates(
        &self,
        query_vector: &[f32],
        k: usize,
    ) -> RetrievalResult<Vec<RetrievalCandidate>> {
        let hits = self.index.query(query_vector, k).await?;

        let mut candidates = Vec::with_capacity(hits.len());
        for hit in hits {
            let Some(filepath) = hit.filepath().map(str::to_string) else {
                warn!("index hit without a filepath payload, skipping");
                continue;
            };

            let metadata = match self.catalog.get_metadata(&filepath).await {
                Ok(metadata) => metadata,
                Err(RetrievalError::NotFound(_)) => {
                    serde_json::from_value(hit.payload.clone()).unwrap_or_default()
                }
                Err(err) => return Err(err),
            };

            candidates.push(RetrievalCandidate {
                id: filepath.clone(),
                filepath,
                similarity: hit.score,
                metadata,
            });
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockCatalogProvider;
    use crate::embedding::MockImageEmbedder;
    use crate::enrich::MockEnrichmentProvider;
    use crate::index::InMemoryIndex;
    use crate::models::SOURCE_ONLINE;

    fn catalog_vector(path: &str) -> Vec<f32> {
        match path {
            "a.jpg" => vec![1.0, 0.0],
            "b.jpg" => vec![0.0, 1.0],
            "c.jpg" => vec![0.9, 0.1],
            _ => vec![1.0, 0.0],
        }
    }

    fn mock_embedder() -> Arc<MockImageEmbedder> {
        let mut embedder = MockImageEmbedder::new();
        embedder.expect_dimension().return_const(2usize);
        embedder
            .expect_embed_image()
            .returning(|path| Ok(catalog_vector(path)));
        Arc::new(embedder)
    }

    fn mock_catalog() -> Arc<MockCatalogProvider> {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_sample_paths().returning(|limit| {
            Ok(["a.jpg", "b.jpg", "c.jpg"]
                .iter()
                .take(limit)
                .map(|s| s.to_string())
                .collect())
        });
        catalog.expect_get_metadata().returning(|id| {
            Ok(ItemMetadata {
                title: Some(format!("Item {}", id)),
                brand: Some("DemoBrand".to_string()),
                color: Some("grey".to_string()),
                source: Some(SOURCE_ONLINE.to_string()),
                url: None,
            })
        });
        Arc::new(catalog)
    }

    fn passthrough_enricher() -> Arc<MockEnrichmentProvider> {
        let mut enricher = MockEnrichmentProvider::new();
        enricher.expect_enrich().returning(|items| Ok(items));
        Arc::new(enricher)
    }

    fn service(
        embedder: Arc<MockImageEmbedder>,
        catalog: Arc<MockCatalogProvider>,
        enricher: Arc<MockEnrichmentProvider>,
    ) -> RetrievalService<InMemoryIndex> {
        RetrievalService::new(InMemoryIndex::new(), embedder, catalog, enricher)
    }

    #[tokio::test]
    async fn retrieve_returns_ranked_results_within_top_k() {
        let service = service(mock_embedder(), mock_catalog(), passthrough_enricher());

        let response = service
            .retrieve(
                "a.jpg",
                &RetrievalOptions {
                    top_k: 2,
                    prefer_online: true,
                },
            )
            .await
            .unwrap();

        assert_eq!(response.query_image, "a.jpg");
        assert_eq!(response.results.len(), 2);
        // Query vector equals a.jpg's: exact match first, c.jpg second
        assert_eq!(response.results[0].id, "a.jpg");
        assert_eq!(response.results[1].id, "c.jpg");
        assert!(response.results[0].similarity >= response.results[1].similarity);
        assert_eq!(response.results[0].title.as_deref(), Some("Item a.jpg"));
    }

    #[tokio::test]
    async fn retrieve_is_deterministic() {
        let service = service(mock_embedder(), mock_catalog(), passthrough_enricher());
        let options = RetrievalOptions::default();

        let first = service.retrieve("a.jpg", &options).await.unwrap();
        let second = service.retrieve("a.jpg", &options).await.unwrap();

        let first_ids: Vec<&str> = first.results.iter().map(|r| r.id.as_str()).collect();
        let second_ids: Vec<&str> = second.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn lazy_build_runs_exactly_once() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_sample_paths()
            .times(1)
            .returning(|_| Ok(vec!["a.jpg".to_string(), "b.jpg".to_string()]));
        catalog.expect_get_metadata().returning(|_| Ok(ItemMetadata::default()));

        let service = service(mock_embedder(), Arc::new(catalog), passthrough_enricher());
        let options = RetrievalOptions::default();

        service.retrieve("a.jpg", &options).await.unwrap();
        service.retrieve("b.jpg", &options).await.unwrap();
        // sample_paths expectation (times(1)) verifies the single build
    }

    #[tokio::test]
    async fn failed_build_leaves_the_service_retryable() {
        let mut embedder = MockImageEmbedder::new();
        embedder.expect_dimension().return_const(2usize);
        let mut first_build = true;
        embedder.expect_embed_image().returning(move |path| {
            if first_build && path == "b.jpg" {
                first_build = false;
                return Err(RetrievalError::UnreadableInput(path.to_string()));
            }
            Ok(catalog_vector(path))
        });

        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_sample_paths()
            .times(2)
            .returning(|_| Ok(vec!["a.jpg".to_string(), "b.jpg".to_string()]));
        catalog.expect_get_metadata().returning(|_| Ok(ItemMetadata::default()));

        let service = service(Arc::new(embedder), Arc::new(catalog), passthrough_enricher());
        let options = RetrievalOptions::default();

        let err = service.retrieve("a.jpg", &options).await.unwrap_err();
        assert!(matches!(err, RetrievalError::UnreadableInput(_)));

        // The failed build inserted nothing and the next call rebuilds
        let response = service.retrieve("a.jpg", &options).await.unwrap();
        assert_eq!(response.results.len(), 2);
    }

    #[tokio::test]
    async fn missing_metadata_degrades_the_candidate() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_sample_paths()
            .returning(|_| Ok(vec!["a.jpg".to_string(), "c.jpg".to_string()]));
        catalog.expect_get_metadata().returning(|id| {
            if id == "c.jpg" {
                Err(RetrievalError::NotFound(id.to_string()))
            } else {
                Ok(ItemMetadata {
                    title: Some("Item a".to_string()),
                    ..Default::default()
                })
            }
        });

        let service = service(mock_embedder(), Arc::new(catalog), passthrough_enricher());

        let response = service
            .retrieve("a.jpg", &RetrievalOptions::default())
            .await
            .unwrap();

        let degraded = response
            .results
            .iter()
            .find(|r| r.id == "c.jpg")
            .expect("candidate with missing metadata is kept");
        assert!(degraded.title.is_none());
        assert!(degraded.brand.is_none());
    }

    #[tokio::test]
    async fn unreadable_query_image_surfaces() {
        let mut embedder = MockImageEmbedder::new();
        embedder.expect_dimension().return_const(2usize);
        embedder.expect_embed_image().returning(|path| {
            if path == "missing.jpg" {
                Err(RetrievalError::UnreadableInput(path.to_string()))
            } else {
                Ok(catalog_vector(path))
            }
        });

        let service = service(Arc::new(embedder), mock_catalog(), passthrough_enricher());

        let err = service
            .retrieve("missing.jpg", &RetrievalOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::UnreadableInput(_)));
    }

    #[tokio::test]
    async fn embedder_breaking_its_dimension_contract_is_surfaced() {
        let mut embedder = MockImageEmbedder::new();
        // Declares 3 dimensions but produces 2-dimensional vectors
        embedder.expect_dimension().return_const(3usize);
        embedder
            .expect_embed_image()
            .returning(|path| Ok(catalog_vector(path)));

        let service = service(Arc::new(embedder), mock_catalog(), passthrough_enricher());

        let err = service
            .retrieve("a.jpg", &RetrievalOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::DimensionMismatch { expected: 3, actual: 2 }));
    }

    #[tokio::test]
    async fn enricher_dropping_items_is_an_internal_error() {
        let mut enricher = MockEnrichmentProvider::new();
        enricher.expect_enrich().returning(|mut items| {
            items.pop();
            Ok(items)
        });

        let service = service(mock_embedder(), mock_catalog(), Arc::new(enricher));

        let err = service
            .retrieve("a.jpg", &RetrievalOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Internal(_)));
    }

    #[tokio::test]
    async fn zero_top_k_is_rejected() {
        let service = service(mock_embedder(), mock_catalog(), passthrough_enricher());

        let err = service
            .retrieve(
                "a.jpg",
                &RetrievalOptions {
                    top_k: 0,
                    prefer_online: true,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Validation(_)));
    }

    #[tokio::test]
    async fn rebuild_index_with_schema_reset_replaces_the_store() {
        let service = service(mock_embedder(), mock_catalog(), passthrough_enricher());
        let options = RetrievalOptions::default();

        // Lazy build indexes all three catalog items
        service.retrieve("a.jpg", &options).await.unwrap();

        let count = service.rebuild_index(2, true).await.unwrap();
        assert_eq!(count, 2);

        let response = service.retrieve("a.jpg", &options).await.unwrap();
        assert_eq!(response.results.len(), 2);
    }

    #[tokio::test]
    async fn rebuild_without_schema_reset_appends() {
        let service = service(mock_embedder(), mock_catalog(), passthrough_enricher());

        service.rebuild_index(2, false).await.unwrap();
        service.rebuild_index(2, false).await.unwrap();

        let response = service
            .retrieve(
                "a.jpg",
                &RetrievalOptions {
                    top_k: 10,
                    prefer_online: true,
                },
            )
            .await
            .unwrap();
        assert_eq!(response.results.len(), 4);
    }
}
