mod http;

use axum::{Router, routing::post};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::index::VectorIndex;
use crate::service::RetrievalService;

pub use http::{IndexAccepted, IndexRequest, RetrieveRequest, RetrieveResponse};

/// OpenAPI documentation for the retrieval API
#[derive(OpenApi)]
#[openapi(
    paths(http::retrieve, http::admin_index),
    components(schemas(
        RetrieveRequest,
        RetrieveResponse,
        IndexRequest,
        IndexAccepted,
        crate::models::EnrichedItem,
    )),
    tags(
        (name = "retrieval", description = "Visual similarity retrieval")
    )
)]
pub struct RetrievalApiDoc;

/// Create the retrieval router with its state applied
pub fn router<I: VectorIndex + 'static>(service: Arc<RetrievalService<I>>) -> Router {
    Router::new()
        .route("/retrieve", post(http::retrieve))
        .route("/admin/index", post(http::admin_index))
        .with_state(service)
}
