use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{ImageEmbedder, l2_normalize};
use crate::error::{RetrievalError, RetrievalResult};

/// Configuration for a remote CLIP-style embedding service
#[derive(Debug, Clone)]
pub struct ClipConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub dimension: usize,
}

impl ClipConfig {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            api_key: None,
            model: "clip-vit-b-32".to_string(),
            dimension: 512,
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_model(mut self, model: String, dimension: usize) -> Self {
        self.model = model;
        self.dimension = dimension;
        self
    }

    pub fn from_env() -> RetrievalResult<Self> {
        let base_url = std::env::var("CLIP_API_URL")
            .map_err(|_| RetrievalError::Config("CLIP_API_URL not set".to_string()))?;

        let mut config = Self::new(base_url);
        if let Ok(api_key) = std::env::var("CLIP_API_KEY") {
            config.api_key = Some(api_key);
        }
        if let Ok(model) = std::env::var("CLIP_MODEL") {
            config.model = model;
        }
        if let Ok(dim) = std::env::var("CLIP_DIMENSION") {
            config.dimension = dim.parse().map_err(|_| {
                RetrievalError::Config(format!("CLIP_DIMENSION is not a number: {}", dim))
            })?;
        }

        Ok(config)
    }
}

/// Image embedder backed by a remote CLIP-style inference service.
///
/// The service receives the image reference and returns the encoded vector;
/// it is expected to share a filesystem or object-store view with this
/// process so references resolve on both sides.
pub struct ClipHttpEmbedder {
    client: Client,
    config: ClipConfig,
}

impl ClipHttpEmbedder {
    pub fn new(config: ClipConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> RetrievalResult<Self> {
        Ok(Self::new(ClipConfig::from_env()?))
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

#[async_trait]
impl ImageEmbedder for ClipHttpEmbedder {
    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed_image(&self, image_ref: &str) -> RetrievalResult<Vec<f32>> {
        let request = EmbedRequest {
            model: &self.config.model,
            input: vec![image_ref],
        };

        let mut builder = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await?;

        let status = response.status();
        if status.is_client_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RetrievalError::UnreadableInput(format!(
                "embedding service rejected '{}' ({}): {}",
                image_ref, status, detail
            )));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(RetrievalError::BackendUnavailable(format!(
                "embedding service error ({}): {}",
                status, detail
            )));
        }

        let body: EmbedResponse = response.json().await?;
        let mut vector = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| {
                RetrievalError::Internal("embedding service returned no data".to_string())
            })?;

        if vector.len() != self.config.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.config.dimension,
                actual: vector.len(),
            });
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }
}
