//! Lookbook Indexer - one-shot index warm-up
//!
//! Builds the similarity index ahead of time so the first API request does
//! not pay the lazy-build cost. The retrieval service builds lazily anyway;
//! this just leaves the index hot.

use std::sync::Arc;

use clap::Parser;
use core_config::Environment;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_retrieval::{
    FsCatalog, HashedEmbedder, HeuristicEnricher, InMemoryIndex, QdrantConfig, QdrantIndex,
    RetrievalService, VectorIndex,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "lookbook-indexer", about = "Warm up the similarity index")]
struct Args {
    /// Directory with catalog images (synthetic ids are used when absent)
    #[arg(long, default_value = "data/images")]
    data_dir: String,

    /// Maximum number of items to index
    #[arg(long, default_value_t = 300)]
    limit: usize,

    /// Embedding dimensionality for the hashed embedder
    #[arg(long, default_value_t = 128)]
    embed_dim: usize,

    /// Index backend: memory or qdrant
    #[arg(long, default_value = "memory")]
    backend: String,

    /// Drop and recreate the index schema before building
    #[arg(long)]
    rebuild_schema: bool,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();
    init_tracing(&Environment::from_env());

    let args = Args::parse();

    match args.backend.to_lowercase().as_str() {
        "memory" => run(&args, InMemoryIndex::new()).await,
        "qdrant" => {
            let config = QdrantConfig::from_env()?.with_dimension(args.embed_dim);
            info!("Connecting to Qdrant at {}...", config.url);
            let index = QdrantIndex::new(config).await?;
            run(&args, index).await
        }
        other => eyre::bail!("Unknown backend: {}", other),
    }
}

async fn run<I: VectorIndex>(args: &Args, index: I) -> eyre::Result<()> {
    let service = RetrievalService::new(
        index,
        Arc::new(HashedEmbedder::new(args.embed_dim)),
        Arc::new(FsCatalog::new(&args.data_dir).with_synthetic_size(args.limit)),
        Arc::new(HeuristicEnricher::new()),
    );

    let count = service.rebuild_index(args.limit, args.rebuild_schema).await?;
    info!(count, data_dir = %args.data_dir, "index build complete");
    Ok(())
}
