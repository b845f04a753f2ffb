//! HTTP client for a running retrieval service.

use std::time::Duration;

use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or};
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{instrument, warn};

use crate::error::{RetrievalError, RetrievalResult};
use crate::filter::SearchFilters;
use crate::models::{
    Context, DeleteRequest, DeleteResponse, HealthResponse, ResetRequest, ResetResponse,
    SearchRequest, SearchResponse, Snippet, UpsertRequest, UpsertResponse,
};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8089";

#[derive(Debug, Clone)]
pub struct RagClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// When false, searches return no contexts without touching the network
    pub enabled: bool,
}

impl RagClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 5,
            connect_timeout_secs: 3,
            enabled: true,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

impl Default for RagClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl FromEnv for RagClientConfig {
    /// Reads RAG_BASE_URL, RAG_TIMEOUT_SECS and RAG_ENABLED
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            base_url: env_or_default("RAG_BASE_URL", DEFAULT_BASE_URL),
            timeout_secs: env_parse_or("RAG_TIMEOUT_SECS", defaults.timeout_secs)?,
            connect_timeout_secs: defaults.connect_timeout_secs,
            enabled: env_parse_or("RAG_ENABLED", true)?,
        })
    }
}

/// Typed client for the retrieval REST API
#[derive(Debug, Clone)]
pub struct RagClient {
    http: Client,
    base_url: String,
    enabled: bool,
}

impl RagClient {
    pub fn new(config: RagClientConfig) -> RetrievalResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| RetrievalError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            enabled: config.enabled,
        })
    }

    pub fn from_env() -> RetrievalResult<Self> {
        Self::new(RagClientConfig::from_env()?)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Search the service for contexts. Failures are logged and yield no
    /// contexts.
    #[instrument(skip(self, filters))]
    pub async fn search(
        &self,
        query: &str,
        k: Option<i64>,
        filters: SearchFilters,
        collection: Option<String>,
    ) -> Vec<Context> {
        if !self.enabled {
            return vec![];
        }

        let request = SearchRequest {
            query: query.to_string(),
            k,
            filters,
            collection,
        };
        match self
            .post::<_, SearchResponse>("/v1/search", &request)
            .await
        {
            Ok(response) => response.contexts,
            Err(e) => {
                warn!(error = %e, "Retrieval search failed, continuing without context");
                vec![]
            }
        }
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    pub async fn upsert(
        &self,
        items: Vec<Snippet>,
        collection: Option<String>,
    ) -> RetrievalResult<UpsertResponse> {
        self.post("/v1/upsert", &UpsertRequest { items, collection })
            .await
    }

    #[instrument(skip(self))]
    pub async fn reset(&self, collection: Option<String>) -> RetrievalResult<ResetResponse> {
        self.post("/v1/reset", &ResetRequest { collection }).await
    }

    #[instrument(skip(self, ids), fields(ids = ids.len()))]
    pub async fn delete(
        &self,
        ids: Vec<String>,
        collection: Option<String>,
    ) -> RetrievalResult<DeleteResponse> {
        self.post("/v1/delete", &DeleteRequest { ids, collection })
            .await
    }

    pub async fn health(&self) -> RetrievalResult<HealthResponse> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> RetrievalResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;
        decode(response).await
    }
}

fn transport_error(err: reqwest::Error) -> RetrievalError {
    RetrievalError::Internal(format!("Request to retrieval service failed: {}", err))
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> RetrievalResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RetrievalError::Internal(format!(
            "Retrieval service returned {}: {}",
            status, body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| RetrievalError::Internal(format!("Invalid response body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> RagClient {
        RagClient::new(RagClientConfig::new(format!("{}/", server.uri()))).unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_contexts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/search"))
            .and(body_partial_json(json!({"query": "revenue", "k": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "contexts": [{
                    "id": "x1", "type": "doc", "text": "revenue grew",
                    "meta": {}, "score": 0.9
                }],
                "debug": {"backend": "qdrant", "collection": "docs_index", "took_ms": 4}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let contexts = client(&server)
            .search("revenue", Some(3), SearchFilters::default(), None)
            .await;

        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].id, "x1");
    }

    #[tokio::test]
    async fn test_disabled_client_skips_search() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let client =
            RagClient::new(RagClientConfig::new(server.uri()).disabled()).unwrap();
        let contexts = client
            .search("anything", None, SearchFilters::default(), None)
            .await;

        assert!(contexts.is_empty());
        assert!(!client.is_enabled());
    }

    #[tokio::test]
    async fn test_search_failure_yields_no_contexts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("qdrant down"))
            .expect(1)
            .mount(&server)
            .await;

        let contexts = client(&server)
            .search("revenue", None, SearchFilters::default(), None)
            .await;

        assert!(contexts.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_sends_items() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/upsert"))
            .and(body_json(json!({
                "items": [{"id": "a", "type": "doc", "text": "t", "meta": {}, "tags": []}],
                "collection": "memory_index"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "collection": "memory_index", "count": 1, "took_ms": 12
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .upsert(
                vec![Snippet::new("a", "doc", "t")],
                Some("memory_index".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(response.count, 1);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/delete"))
            .respond_with(ResponseTemplate::new(503).set_body_string("initializing"))
            .mount(&server)
            .await;

        let err = client(&server)
            .delete(vec!["a".to_string()], None)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("503"));
        assert!(message.contains("initializing"));
    }

    #[tokio::test]
    async fn test_reset_and_health() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/reset"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "collection": "docs_index"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "starting", "detail": "initializing"
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(client.reset(None).await.unwrap().collection, "docs_index");
        assert_eq!(
            client.health().await.unwrap(),
            HealthResponse::starting()
        );
    }

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("RAG_BASE_URL", None::<&str>),
                ("RAG_TIMEOUT_SECS", Some("30")),
                ("RAG_ENABLED", Some("false")),
            ],
            || {
                let config = RagClientConfig::from_env().unwrap();
                assert_eq!(config.base_url, DEFAULT_BASE_URL);
                assert_eq!(config.timeout_secs, 30);
                assert!(!config.enabled);
            },
        );
    }
}
