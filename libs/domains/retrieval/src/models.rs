use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Source label for items available from an online shop
pub const SOURCE_ONLINE: &str = "online";

/// Default currency for catalog prices
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Commerce metadata attached to a catalog item.
///
/// All fields are optional: a provider fills what it knows and leaves the
/// rest absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemMetadata {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
}

/// A candidate returned by the similarity index for a query, before
/// enrichment. Created fresh per retrieve call and discarded afterwards.
#[derive(Debug, Clone)]
pub struct RetrievalCandidate {
    pub id: String,
    pub filepath: String,
    pub similarity: f32,
    pub metadata: ItemMetadata,
}

/// A ranked result item with commerce fields filled in by enrichment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EnrichedItem {
    pub id: String,
    pub filepath: String,
    pub similarity: f32,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub price: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub source: Option<String>,
    pub url: Option<String>,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl From<RetrievalCandidate> for EnrichedItem {
    fn from(candidate: RetrievalCandidate) -> Self {
        Self {
            id: candidate.id,
            filepath: candidate.filepath,
            similarity: candidate.similarity,
            title: candidate.metadata.title,
            brand: candidate.metadata.brand,
            color: candidate.metadata.color,
            price: None,
            currency: default_currency(),
            source: candidate.metadata.source,
            url: candidate.metadata.url,
        }
    }
}

/// Per-call retrieval options.
///
/// Passed explicitly into every `retrieve` call instead of living as mutable
/// state on the service, so concurrent requests cannot race on each other's
/// configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct RetrievalOptions {
    /// Upper bound on the number of results returned
    pub top_k: usize,
    /// Rank online-sourced items before all others
    pub prefer_online: bool,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            prefer_online: true,
        }
    }
}

/// The caller-visible retrieval result. Ordering of `results` encodes rank.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RetrievalResponse {
    pub query_image: String,
    pub results: Vec<EnrichedItem>,
}

/// A single similarity-index hit: the stored payload plus its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPayload {
    pub score: f32,
    pub payload: serde_json::Value,
}

impl ScoredPayload {
    pub fn new(score: f32, payload: serde_json::Value) -> Self {
        Self { score, payload }
    }

    /// The item id this hit refers to, if the payload carries one.
    pub fn filepath(&self) -> Option<&str> {
        self.payload.get("filepath").and_then(|v| v.as_str())
    }
}
