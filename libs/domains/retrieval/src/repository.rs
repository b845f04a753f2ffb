use async_trait::async_trait;

use crate::error::RetrievalResult;
use crate::models::{IndexedPoint, ScoredPoint, SearchQuery, VectorConfig};

/// Repository trait for vector index operations
///
/// This trait abstracts the underlying vector database (Qdrant). Collection
/// names passed here are already resolved; no fallback happens at this layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Check that the backend is reachable
    async fn health_check(&self) -> RetrievalResult<()>;

    // ===== Collection Management =====

    /// Names of every collection present in the backend
    async fn list_collections(&self) -> RetrievalResult<Vec<String>>;

    /// Vector configuration of a collection, or None if it does not exist
    async fn collection_config(&self, name: &str) -> RetrievalResult<Option<VectorConfig>>;

    /// Create a new collection with the given configuration
    async fn create_collection(&self, name: &str, config: VectorConfig) -> RetrievalResult<()>;

    /// Delete a collection and all of its points
    async fn delete_collection(&self, name: &str) -> RetrievalResult<()>;

    // ===== Point Operations =====

    /// Write a batch of points; with `wait` the call returns once durable
    async fn upsert_points(
        &self,
        collection_name: &str,
        points: Vec<IndexedPoint>,
        wait: bool,
    ) -> RetrievalResult<()>;

    /// Nearest-neighbour search, results ordered by descending similarity
    async fn search(
        &self,
        collection_name: &str,
        query: SearchQuery,
    ) -> RetrievalResult<Vec<ScoredPoint>>;

    /// Delete points by ID; unknown IDs are not an error
    async fn delete_points(
        &self,
        collection_name: &str,
        ids: Vec<u64>,
        wait: bool,
    ) -> RetrievalResult<()>;
}
