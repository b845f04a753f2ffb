use std::sync::Arc;

use observability::{OperationTimer, RetrievalMetrics};
use serde_json::Value;
use tracing::{info, instrument};

use crate::embedding::EmbeddingProvider;
use crate::error::{RetrievalError, RetrievalResult};
use crate::filter;
use crate::identity;
use crate::models::{
    Context, DeleteRequest, DeleteResponse, HealthResponse, IndexedPoint, ResetRequest,
    ResetResponse, ScoredPoint, SearchDebug, SearchQuery, SearchRequest, SearchResponse,
    UpsertRequest, UpsertResponse, VectorConfig,
};
use crate::registry::CollectionRegistry;
use crate::repository::VectorRepository;
use crate::retry::{RetryConfig, retry_with_backoff};

/// Number of contexts returned when the caller omits `k` or sends `k <= 0`
pub const DEFAULT_TOP_K: u64 = 8;

/// Text embedded once at startup to learn the model's vector dimension
pub const DIMENSION_PROBE: &str = "dim-probe";

/// Backend name reported in search debug output
pub const BACKEND_NAME: &str = "qdrant";

/// Retrieval service providing the upsert, search, delete and reset pipelines
///
/// Built once by [`RetrievalService::bootstrap`] and immutable afterwards, so
/// a single instance is shared by every request.
pub struct RetrievalService<R: VectorRepository> {
    repository: R,
    embedder: Arc<dyn EmbeddingProvider>,
    registry: CollectionRegistry,
    vector_config: VectorConfig,
}

impl<R: VectorRepository> RetrievalService<R> {
    /// Assemble a service from already-initialized parts
    pub fn new(
        repository: R,
        embedder: Arc<dyn EmbeddingProvider>,
        registry: CollectionRegistry,
        vector_config: VectorConfig,
    ) -> Self {
        Self {
            repository,
            embedder,
            registry,
            vector_config,
        }
    }

    /// Run the one-time startup sequence and return a ready service.
    ///
    /// Probes the embedding dimension, waits for the index backend, then
    /// creates any missing well-known collection.
    #[instrument(skip_all, fields(model = %embedder.model_name()))]
    pub async fn bootstrap(
        repository: R,
        embedder: Arc<dyn EmbeddingProvider>,
        registry: CollectionRegistry,
        retry: RetryConfig,
    ) -> RetrievalResult<Self> {
        let probe = retry_with_backoff("Embedding dimension probe", retry, || {
            embedder.embed(DIMENSION_PROBE)
        })
        .await?;

        let dimension = probe.values.len() as u64;
        if dimension == 0 {
            return Err(RetrievalError::Embedding(
                "Embedding model returned an empty vector".to_string(),
            ));
        }
        RetrievalMetrics::set_embedding_dimension(&embedder.model_name(), dimension);
        info!(dimension, "Embedding dimension probed");

        retry_with_backoff("Qdrant health check", retry, || repository.health_check()).await?;
        info!("Qdrant is reachable");

        let vector_config = VectorConfig::new(dimension);
        registry.ensure(&repository, vector_config).await?;
        info!(collections = ?registry.names(), "Collections ready");

        Ok(Self::new(repository, embedder, registry, vector_config))
    }

    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    pub fn vector_config(&self) -> VectorConfig {
        self.vector_config
    }

    pub fn model_name(&self) -> String {
        self.embedder.model_name()
    }

    /// Report backend status; failures are folded into the response
    pub async fn health(&self) -> HealthResponse {
        match self.repository.list_collections().await {
            Ok(collections) => HealthResponse::ok(collections, self.model_name()),
            Err(e) => HealthResponse::error(e.to_string()),
        }
    }

    // ===== Pipelines =====

    /// Embed and write a batch of snippets in one acknowledged backend call
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn upsert(&self, request: UpsertRequest) -> RetrievalResult<UpsertResponse> {
        let collection = self.registry.resolve(request.collection.as_deref());
        let timer = OperationTimer::new("upsert", collection);

        if request.items.is_empty() {
            return Ok(UpsertResponse {
                ok: true,
                collection: collection.to_string(),
                count: 0,
                took_ms: timer.elapsed_ms(),
            });
        }

        let result = self.write_snippets(collection, request).await;
        let took_ms = timer.elapsed_ms();

        match result {
            Ok(count) => {
                RetrievalMetrics::record_upsert(collection, count, took_ms);
                Ok(UpsertResponse {
                    ok: true,
                    collection: collection.to_string(),
                    count,
                    took_ms,
                })
            }
            Err(e) => {
                RetrievalMetrics::record_failure("upsert", collection, &e.to_string());
                Err(e)
            }
        }
    }

    async fn write_snippets(
        &self,
        collection: &str,
        request: UpsertRequest,
    ) -> RetrievalResult<usize> {
        let texts: Vec<String> = request.items.iter().map(|s| s.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != request.items.len() {
            return Err(RetrievalError::Embedding(format!(
                "Expected {} embeddings, got {}",
                request.items.len(),
                embeddings.len()
            )));
        }

        let points = request
            .items
            .iter()
            .zip(embeddings)
            .map(|(snippet, embedding)| {
                self.check_dimension(&embedding.values)?;
                Ok(IndexedPoint {
                    id: identity::point_id(&snippet.id),
                    vector: embedding.values,
                    payload: snippet.payload(),
                })
            })
            .collect::<RetrievalResult<Vec<_>>>()?;

        let count = points.len();
        self.repository.upsert_points(collection, points, true).await?;
        Ok(count)
    }

    /// Embed a query, filter, search, then rerank by `meta.priority`
    #[instrument(skip(self, request), fields(k = ?request.k))]
    pub async fn search(&self, request: SearchRequest) -> RetrievalResult<SearchResponse> {
        let collection = self.registry.resolve(request.collection.as_deref());
        let timer = OperationTimer::new("search", collection);

        match self.run_search(collection, &request).await {
            Ok(contexts) => {
                let took_ms = timer.elapsed_ms();
                RetrievalMetrics::record_search(collection, contexts.len(), took_ms);
                Ok(SearchResponse {
                    contexts,
                    debug: SearchDebug {
                        backend: BACKEND_NAME.to_string(),
                        collection: collection.to_string(),
                        took_ms,
                    },
                })
            }
            Err(e) => {
                RetrievalMetrics::record_failure("search", collection, &e.to_string());
                Err(e)
            }
        }
    }

    async fn run_search(
        &self,
        collection: &str,
        request: &SearchRequest,
    ) -> RetrievalResult<Vec<Context>> {
        let embedding = self.embedder.embed(&request.query).await?;
        self.check_dimension(&embedding.values)?;

        let query = SearchQuery::new(embedding.values, effective_k(request.k))
            .with_filter(filter::compile(&request.filters));

        let hits = self.repository.search(collection, query).await?;
        Ok(rerank(hits))
    }

    /// Delete snippets by caller ID; an empty list never reaches the backend
    #[instrument(skip(self, request), fields(ids = request.ids.len()))]
    pub async fn delete(&self, request: DeleteRequest) -> RetrievalResult<DeleteResponse> {
        let collection = self.registry.resolve(request.collection.as_deref());
        let count = request.ids.len();

        if count > 0 {
            let ids = identity::point_ids(&request.ids);
            if let Err(e) = self.repository.delete_points(collection, ids, true).await {
                RetrievalMetrics::record_failure("delete", collection, &e.to_string());
                return Err(e);
            }
            RetrievalMetrics::record_delete(collection, count);
        }

        Ok(DeleteResponse {
            ok: true,
            collection: collection.to_string(),
            count,
        })
    }

    /// Drop and recreate a collection with the startup vector config
    #[instrument(skip(self, request))]
    pub async fn reset(&self, request: ResetRequest) -> RetrievalResult<ResetResponse> {
        let collection = self.registry.resolve(request.collection.as_deref());

        if let Err(e) = self
            .registry
            .reset(&self.repository, collection, self.vector_config)
            .await
        {
            RetrievalMetrics::record_failure("reset", collection, &e.to_string());
            return Err(e);
        }
        RetrievalMetrics::record_reset(collection);

        Ok(ResetResponse {
            ok: true,
            collection: collection.to_string(),
        })
    }

    fn check_dimension(&self, vector: &[f32]) -> RetrievalResult<()> {
        let actual = vector.len() as u64;
        if actual != self.vector_config.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.vector_config.dimension,
                actual,
            });
        }
        Ok(())
    }
}

/// Result count to request from the backend
pub fn effective_k(k: Option<i64>) -> u64 {
    match k {
        Some(k) if k > 0 => k as u64,
        _ => DEFAULT_TOP_K,
    }
}

/// Priority factor stored in a payload's `meta.priority`.
///
/// Numbers and numeric strings are accepted; anything else counts as 1.0.
pub fn priority(payload: Option<&Value>) -> f32 {
    let value = payload.and_then(|p| p.get("meta")).and_then(|m| m.get("priority"));

    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|p| p.is_finite())
        .map(|p| p as f32)
        .unwrap_or(1.0)
}

/// Scale each hit by its priority and order by adjusted score.
///
/// The sort is stable, so hits with equal adjusted scores keep the
/// backend's similarity order.
pub fn rerank(hits: Vec<ScoredPoint>) -> Vec<Context> {
    let mut contexts: Vec<Context> = hits.into_iter().map(to_context).collect();
    contexts.sort_by(|a, b| b.score.total_cmp(&a.score));
    contexts
}

fn to_context(hit: ScoredPoint) -> Context {
    let score = hit.score * priority(hit.payload.as_ref());
    let payload = hit.payload.unwrap_or(Value::Null);

    let text_field = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_string);

    Context {
        id: text_field("sid").unwrap_or_else(|| hit.id.to_string()),
        kind: text_field("type"),
        text: text_field("text"),
        meta: payload
            .get("meta")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default())),
        score,
    }
}
