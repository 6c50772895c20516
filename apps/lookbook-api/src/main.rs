//! Lookbook API - visual similarity search over a commerce catalog

use std::sync::Arc;

use axum_helpers::server::{create_app, create_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_retrieval::{
    CatalogProvider, ClipHttpEmbedder, EnrichmentProvider, FsCatalog, HashedEmbedder,
    HeuristicEnricher, ImageEmbedder, InMemoryIndex, PricingApiEnricher, QdrantConfig,
    QdrantIndex, RetrievalService, VectorIndex, handlers,
};
use tracing::info;

mod agent;
mod config;
mod openapi;
mod state;

use agent::ChatAgent;
use config::{Config, IndexBackend};
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    match config.index_backend {
        IndexBackend::Memory => {
            info!("Using in-memory similarity index");
            run(config, InMemoryIndex::new()).await
        }
        IndexBackend::Qdrant => {
            let qdrant_config = QdrantConfig::from_env()?;
            info!("Connecting to Qdrant at {}...", qdrant_config.url);
            let index = QdrantIndex::new(qdrant_config).await?;
            run(config, index).await
        }
    }
}

async fn run<I: VectorIndex + 'static>(config: Config, index: I) -> eyre::Result<()> {
    // Embedding provider: remote CLIP service when configured, otherwise the
    // deterministic hashed stand-in
    let embedder: Arc<dyn ImageEmbedder> = match ClipHttpEmbedder::from_env() {
        Ok(clip) => {
            info!("CLIP embedding service configured");
            Arc::new(clip)
        }
        Err(_) => {
            info!(
                "CLIP_API_URL not set, using hashed embedder ({} dims)",
                config.embed_dim
            );
            Arc::new(HashedEmbedder::new(config.embed_dim))
        }
    };

    let catalog: Arc<dyn CatalogProvider> = Arc::new(
        FsCatalog::new(&config.data_dir).with_synthetic_size(config.synthetic_size),
    );

    let enricher: Arc<dyn EnrichmentProvider> = match PricingApiEnricher::from_env() {
        Ok(pricing) => {
            info!("Pricing API enricher configured");
            Arc::new(pricing)
        }
        Err(_) => {
            info!("PRICING_API_URL not set, using heuristic enricher");
            Arc::new(HeuristicEnricher::new())
        }
    };

    let service = Arc::new(
        RetrievalService::new(index, embedder, catalog, enricher)
            .with_default_index_limit(config.index_limit),
    );

    let chat_agent = match ChatAgent::from_env() {
        Ok(agent) => {
            info!("Conversational agent configured");
            Some(Arc::new(agent))
        }
        Err(_) => {
            info!("No OPENAI_API_KEY found, /ask will be unavailable");
            None
        }
    };

    let app_state = AppState {
        service: service.clone(),
        agent: chat_agent,
    };

    let api_routes = handlers::router(service).merge(agent::router(app_state));
    let router = create_router::<openapi::ApiDoc>(api_routes);

    info!("Starting Lookbook API on port {}", config.server.port);
    create_app(router, &config.server).await?;

    info!("Lookbook API shutdown complete");
    Ok(())
}
