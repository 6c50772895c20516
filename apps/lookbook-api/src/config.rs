//! Configuration for the Lookbook API

use core_config::{FromEnv, env_or_default, env_parse_or, server::ServerConfig};

pub use core_config::Environment;

/// Which similarity-index backend to run against
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexBackend {
    Memory,
    Qdrant,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub data_dir: String,
    pub synthetic_size: usize,
    pub index_limit: usize,
    pub embed_dim: usize,
    pub index_backend: IndexBackend,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;

        let backend = env_or_default("INDEX_BACKEND", "memory");
        let index_backend = match backend.to_lowercase().as_str() {
            "memory" => IndexBackend::Memory,
            "qdrant" => IndexBackend::Qdrant,
            other => eyre::bail!("Unknown INDEX_BACKEND: {}", other),
        };

        Ok(Self {
            environment,
            server,
            data_dir: env_or_default("LOOKBOOK_DATA_DIR", "data/images"),
            synthetic_size: env_parse_or("LOOKBOOK_SYNTHETIC_SIZE", 200),
            index_limit: env_parse_or("LOOKBOOK_INDEX_LIMIT", 200),
            embed_dim: env_parse_or("LOOKBOOK_EMBED_DIM", 128),
            index_backend,
        })
    }
}
