use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder, value::Kind,
};
use uuid::Uuid;

use super::VectorIndex;
use crate::error::{RetrievalError, RetrievalResult};
use crate::models::ScoredPayload;

/// Qdrant connection configuration
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub collection: String,
    pub dimension: usize,
}

impl QdrantConfig {
    pub fn new(url: String) -> Self {
        Self {
            url,
            api_key: None,
            timeout_secs: 30,
            collection: "lookbook_items".to_string(),
            dimension: 128,
        }
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_collection(mut self, collection: String) -> Self {
        self.collection = collection;
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn from_env() -> RetrievalResult<Self> {
        let url =
            std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".to_string());

        let mut config = Self::new(url);
        config.api_key = std::env::var("QDRANT_API_KEY").ok();
        if let Ok(collection) = std::env::var("QDRANT_COLLECTION") {
            config.collection = collection;
        }
        if let Ok(secs) = std::env::var("QDRANT_TIMEOUT_SECS") {
            config.timeout_secs = secs.parse().map_err(|_| {
                RetrievalError::Config(format!("QDRANT_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        if let Ok(dim) = std::env::var("QDRANT_DIMENSION") {
            config.dimension = dim.parse().map_err(|_| {
                RetrievalError::Config(format!("QDRANT_DIMENSION is not a number: {}", dim))
            })?;
        }

        Ok(config)
    }
}

/// Qdrant-backed implementation of [`VectorIndex`].
///
/// One collection holds all item vectors; `ensure_schema`/`drop_schema` map
/// to collection create/delete and are only exercised by administrative
/// re-indexing flows.
pub struct QdrantIndex {
    client: Qdrant,
    config: QdrantConfig,
}

impl QdrantIndex {
    pub async fn new(config: QdrantConfig) -> RetrievalResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = &config.api_key {
            builder = builder.api_key(api_key.clone());
        }
        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder.build().map_err(|e| {
            RetrievalError::BackendUnavailable(format!("Failed to build Qdrant client: {}", e))
        })?;

        Ok(Self { client, config })
    }

    fn check_dimensions(&self, vectors: &[Vec<f32>]) -> RetrievalResult<()> {
        for vector in vectors {
            if vector.len() != self.config.dimension {
                return Err(RetrievalError::DimensionMismatch {
                    expected: self.config.dimension,
                    actual: vector.len(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn ensure_schema(&self) -> RetrievalResult<()> {
        if self.client.collection_exists(&self.config.collection).await? {
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.config.collection).vectors_config(
                    VectorParamsBuilder::new(self.config.dimension as u64, Distance::Cosine),
                ),
            )
            .await?;

        Ok(())
    }

    async fn drop_schema(&self) -> RetrievalResult<()> {
        self.client
            .delete_collection(&self.config.collection)
            .await?;
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
        self.check_dimensions(&vectors)?;

        let points: Vec<PointStruct> = vectors
            .into_iter()
            .zip(payloads)
            .map(|(vector, payload)| {
                PointStruct::new(
                    Uuid::new_v4().to_string(),
                    vector,
                    payload_to_qdrant(payload),
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.config.collection, points).wait(true))
            .await?;

        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> RetrievalResult<Vec<ScoredPayload>> {
        if vector.len() != self.config.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.config.dimension,
                actual: vector.len(),
            });
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.config.collection, vector.to_vec(), k as u64)
                    .with_payload(true),
            )
            .await?;

        Ok(response
            .result
            .into_iter()
            .map(|point| ScoredPayload::new(point.score, qdrant_to_payload(point.payload)))
            .collect())
    }

    async fn count(&self) -> RetrievalResult<usize> {
        let info = self.client.collection_info(&self.config.collection).await?;
        Ok(info
            .result
            .and_then(|c| c.points_count)
            .unwrap_or_default() as usize)
    }
}

fn payload_to_qdrant(payload: serde_json::Value) -> HashMap<String, QdrantValue> {
    let mut result = HashMap::new();

    if let serde_json::Value::Object(map) = payload {
        for (key, val) in map {
            if let Some(qdrant_val) = json_to_qdrant_value(val) {
                result.insert(key, qdrant_val);
            }
        }
    }

    result
}

fn qdrant_to_payload(payload: HashMap<String, QdrantValue>) -> serde_json::Value {
    let mut map = serde_json::Map::new();
    for (key, val) in payload {
        if let Some(json_val) = qdrant_value_to_json(val) {
            map.insert(key, json_val);
        }
    }
    serde_json::Value::Object(map)
}

fn json_to_qdrant_value(val: serde_json::Value) -> Option<QdrantValue> {
    match val {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(QdrantValue::from(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(QdrantValue::from(i))
            } else {
                n.as_f64().map(QdrantValue::from)
            }
        }
        serde_json::Value::String(s) => Some(QdrantValue::from(s)),
        // Nested structures are not part of the payload shape this crate writes
        _ => Some(QdrantValue::from(val.to_string())),
    }
}

fn qdrant_value_to_json(val: QdrantValue) -> Option<serde_json::Value> {
    match val.kind {
        Some(Kind::NullValue(_)) => Some(serde_json::Value::Null),
        Some(Kind::BoolValue(b)) => Some(serde_json::Value::Bool(b)),
        Some(Kind::IntegerValue(i)) => Some(serde_json::Value::Number(i.into())),
        Some(Kind::DoubleValue(f)) => {
            serde_json::Number::from_f64(f).map(serde_json::Value::Number)
        }
        Some(Kind::StringValue(s)) => Some(serde_json::Value::String(s)),
        _ => None,
    }
}
