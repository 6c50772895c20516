//! Visual Retrieval Domain Library
//!
//! This module provides a complete domain implementation for visual-similarity
//! retrieval: given a query image, return a ranked list of visually similar
//! catalog items enriched with commerce metadata.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐
//! │   RetrievalService   │  ← orchestration: lazy index build, retrieve pipeline
//! └──────────┬───────────┘
//!            │
//!   ┌────────┴─────────┬──────────────────┬───────────────────┐
//!   ▼                  ▼                  ▼                   ▼
//! ┌──────────────┐ ┌──────────────┐ ┌────────────────┐ ┌──────────────────┐
//! │ VectorIndex  │ │ ImageEmbedder│ │ CatalogProvider│ │EnrichmentProvider│
//! │   (trait)    │ │   (trait)    │ │    (trait)     │ │     (trait)      │
//! └──────┬───────┘ └──────┬───────┘ └───────┬────────┘ └────────┬─────────┘
//!        │                │                 │                   │
//! ┌──────▼───────┐ ┌──────▼───────┐ ┌───────▼────────┐ ┌────────▼─────────┐
//! │ InMemoryIndex│ │HashedEmbedder│ │   FsCatalog    │ │HeuristicEnricher │
//! │ QdrantIndex  │ │ClipHttpEmbed.│ │                │ │PricingApiEnricher│
//! └──────────────┘ └──────────────┘ └────────────────┘ └──────────────────┘
//! ```
//!
//! # Behavior
//!
//! - **Lazy indexing**: the first `retrieve` call samples the catalog, embeds
//!   every item, and populates the index; the build is guarded by a mutex so
//!   concurrent first callers never double-build.
//! - **Ranking**: enriched candidates are ordered by a deterministic
//!   three-key sort (online-preference, descending similarity, ascending
//!   price) before truncation to `top_k`.
//! - **Pluggable backends**: every stage is a narrow capability trait picked
//!   at construction time; the in-memory index is the reference backend, the
//!   Qdrant index the production one.

pub mod catalog;
pub mod embedding;
pub mod enrich;
pub mod error;
pub mod handlers;
pub mod index;
pub mod models;
pub mod ranking;
pub mod service;

// Re-export commonly used types
pub use catalog::{CatalogProvider, FsCatalog};
pub use embedding::{ClipConfig, ClipHttpEmbedder, HashedEmbedder, ImageEmbedder};
pub use enrich::{EnrichmentProvider, HeuristicEnricher, PricingApiEnricher};
pub use error::{RetrievalError, RetrievalResult};
pub use handlers::RetrievalApiDoc;
pub use index::{InMemoryIndex, QdrantConfig, QdrantIndex, VectorIndex};
pub use models::{
    EnrichedItem, ItemMetadata, RetrievalCandidate, RetrievalOptions, RetrievalResponse,
    ScoredPayload,
};
pub use service::RetrievalService;
