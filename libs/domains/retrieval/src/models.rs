use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use utoipa::ToSchema;
use validator::Validate;

use crate::filter::{Predicate, SearchFilters};

/// Distance metric for similarity calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
    Manhattan,
}

/// Vector collection configuration, fixed once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VectorConfig {
    pub dimension: u64,
    pub distance: DistanceMetric,
}

impl VectorConfig {
    pub fn new(dimension: u64) -> Self {
        Self {
            dimension,
            distance: DistanceMetric::default(),
        }
    }

    pub fn with_distance(mut self, distance: DistanceMetric) -> Self {
        self.distance = distance;
        self
    }
}

/// A unit of retrievable content supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct Snippet {
    /// Any string, including empty; mapped to a point ID by hashing
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub meta: Map<String, Value>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Snippet {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            text: text.into(),
            meta: Map::new(),
            tags: Vec::new(),
        }
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Payload stored next to the vector; carries everything needed to render
    /// a search hit without a second lookup.
    pub fn payload(&self) -> Value {
        json!({
            "sid": self.id,
            "type": self.kind,
            "text": self.text,
            "meta": self.meta,
            "tags": self.tags,
        })
    }
}

/// A point as written to the index backend
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: Value,
}

/// Nearest-neighbour query parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub vector: Vec<f32>,
    pub limit: u64,
    pub filter: Option<Predicate>,
    pub with_payload: bool,
}

impl SearchQuery {
    pub fn new(vector: Vec<f32>, limit: u64) -> Self {
        Self {
            vector,
            limit,
            filter: None,
            with_payload: true,
        }
    }

    pub fn with_filter(mut self, filter: Option<Predicate>) -> Self {
        self.filter = filter;
        self
    }
}

/// Raw hit returned by the index backend, ordered by similarity
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    pub id: u64,
    pub score: f32,
    pub payload: Option<Value>,
}

/// Embedding result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EmbeddingResult {
    pub values: Vec<f32>,
    pub dimension: u32,
    pub tokens_used: u32,
}

// ===== Request/Response DTOs =====

/// Request to index a batch of snippets
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct UpsertRequest {
    #[validate(nested)]
    pub items: Vec<Snippet>,
    #[serde(default)]
    pub collection: Option<String>,
}

/// Response for upsert operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpsertResponse {
    pub ok: bool,
    pub collection: String,
    pub count: usize,
    pub took_ms: u64,
}

/// Request to search a collection with a text query
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub k: Option<i64>,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub collection: Option<String>,
}

/// A single reranked search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Context {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub text: Option<String>,
    #[schema(value_type = Object)]
    pub meta: Value,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchDebug {
    pub backend: String,
    pub collection: String,
    pub took_ms: u64,
}

/// Response for search operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub contexts: Vec<Context>,
    pub debug: SearchDebug,
}

/// Request to drop and recreate a collection
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
pub struct ResetRequest {
    #[serde(default)]
    pub collection: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResetResponse {
    pub ok: bool,
    pub collection: String,
}

/// Request to delete snippets by caller ID
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct DeleteRequest {
    pub ids: Vec<String>,
    #[serde(default)]
    pub collection: Option<String>,
}

/// Response for delete operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub ok: bool,
    pub collection: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Starting,
    Ok,
    Error,
}

/// Response for the health endpoint; never an error status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collections: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthResponse {
    pub fn starting() -> Self {
        Self {
            status: HealthStatus::Starting,
            collections: None,
            embedding_model: None,
            detail: Some("initializing".to_string()),
        }
    }

    pub fn ok(collections: Vec<String>, embedding_model: String) -> Self {
        Self {
            status: HealthStatus::Ok,
            collections: Some(collections),
            embedding_model: Some(embedding_model),
            detail: None,
        }
    }

    pub fn error(detail: String) -> Self {
        Self {
            status: HealthStatus::Error,
            collections: None,
            embedding_model: None,
            detail: Some(detail),
        }
    }
}
