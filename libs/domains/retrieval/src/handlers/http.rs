//! REST handlers for retrieval operations

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{RetrievalError, RetrievalResult};
use crate::index::VectorIndex;
use crate::models::{EnrichedItem, RetrievalOptions};
use crate::ranking::apply_filters;
use crate::service::RetrievalService;

// ===== Request/Response DTOs =====

/// Request to retrieve visually similar items
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RetrieveRequest {
    /// Path or identifier of the query image
    pub query_image: String,
    #[serde(default = "default_top_k")]
    #[validate(range(min = 1, max = 30))]
    pub top_k: usize,
    #[serde(default = "default_true")]
    pub prefer_online: bool,
    #[serde(default)]
    pub filter_color: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub max_price: Option<f64>,
}

fn default_top_k() -> usize {
    10
}

fn default_true() -> bool {
    true
}

/// Ranked, filtered retrieval results
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RetrieveResponse {
    pub query_image: String,
    pub count: usize,
    pub results: Vec<EnrichedItem>,
}

/// Request to (re)build the similarity index
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IndexRequest {
    #[serde(default = "default_index_limit")]
    pub limit: usize,
    #[serde(default)]
    pub rebuild_schema: bool,
}

fn default_index_limit() -> usize {
    300
}

/// Acknowledgement for a background index build
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IndexAccepted {
    pub status: String,
    pub message: String,
}

// ===== Handlers =====

/// Retrieve catalog items similar to a query image
#[utoipa::path(
    post,
    path = "/retrieve",
    tag = "retrieval",
    request_body = RetrieveRequest,
    responses(
        (status = 200, description = "Ranked similar items", body = RetrieveResponse),
        (status = 400, description = "Invalid request"),
        (status = 422, description = "Query image could not be read"),
        (status = 503, description = "A retrieval backend is unavailable")
    )
)]
pub async fn retrieve<I: VectorIndex>(
    State(service): State<Arc<RetrievalService<I>>>,
    Json(request): Json<RetrieveRequest>,
) -> RetrievalResult<Json<RetrieveResponse>> {
    request
        .validate()
        .map_err(|e| RetrievalError::Validation(e.to_string()))?;

    let options = RetrievalOptions {
        top_k: request.top_k,
        prefer_online: request.prefer_online,
    };

    let response = service.retrieve(&request.query_image, &options).await?;

    // Filters run after ranking, against candidates the index already capped
    // at top_k, so the final count can drop below top_k even when more
    // matching items exist in the catalog.
    let mut results = apply_filters(
        response.results,
        request.filter_color.as_deref(),
        request.max_price,
    );
    results.truncate(request.top_k);

    Ok(Json(RetrieveResponse {
        query_image: response.query_image,
        count: results.len(),
        results,
    }))
}

/// Trigger a background rebuild of the similarity index
#[utoipa::path(
    post,
    path = "/admin/index",
    tag = "retrieval",
    request_body = IndexRequest,
    responses(
        (status = 202, description = "Index build started", body = IndexAccepted),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn admin_index<I: VectorIndex + 'static>(
    State(service): State<Arc<RetrievalService<I>>>,
    Json(request): Json<IndexRequest>,
) -> RetrievalResult<impl IntoResponse> {
    let IndexRequest {
        limit,
        rebuild_schema,
    } = request;

    // Long-running: embed + upsert the whole catalog sample. Run detached so
    // the request returns immediately; completion is observable in the logs.
    tokio::spawn(async move {
        match service.rebuild_index(limit, rebuild_schema).await {
            Ok(count) => tracing::info!(count, "background index build finished"),
            Err(err) => tracing::error!("background index build failed: {}", err),
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(IndexAccepted {
            status: "started".to_string(),
            message: format!("index build started (limit {})", limit),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FsCatalog;
    use crate::embedding::HashedEmbedder;
    use crate::enrich::HeuristicEnricher;
    use crate::index::InMemoryIndex;

    fn test_service() -> Arc<RetrievalService<InMemoryIndex>> {
        Arc::new(
            RetrievalService::new(
                InMemoryIndex::new(),
                Arc::new(HashedEmbedder::new(32)),
                Arc::new(FsCatalog::new("/nonexistent/lookbook-data").with_synthetic_size(20)),
                Arc::new(HeuristicEnricher::new()),
            )
            .with_default_index_limit(20),
        )
    }

    fn request(top_k: usize) -> RetrieveRequest {
        RetrieveRequest {
            query_image: "SYNTH/img_0000.jpg".to_string(),
            top_k,
            prefer_online: true,
            filter_color: None,
            max_price: None,
        }
    }

    #[tokio::test]
    async fn retrieve_handler_bounds_results_by_top_k() {
        let service = test_service();
        let Json(response) = retrieve(State(service), Json(request(5))).await.unwrap();

        assert_eq!(response.query_image, "SYNTH/img_0000.jpg");
        assert!(response.count <= 5);
        assert_eq!(response.count, response.results.len());
    }

    #[tokio::test]
    async fn retrieve_handler_rejects_out_of_range_top_k() {
        let service = test_service();

        let err = retrieve(State(service.clone()), Json(request(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, RetrievalError::Validation(_)));

        let err = retrieve(State(service), Json(request(31))).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Validation(_)));
    }

    #[tokio::test]
    async fn filters_can_shrink_results_below_top_k() {
        let service = test_service();
        let mut req = request(10);
        // Synthetic catalog items are all grey; filtering another color
        // after ranking leaves nothing even though candidates exist.
        req.filter_color = Some("red".to_string());

        let Json(response) = retrieve(State(service), Json(req)).await.unwrap();
        assert_eq!(response.count, 0);
        assert!(response.results.is_empty());
    }
}
