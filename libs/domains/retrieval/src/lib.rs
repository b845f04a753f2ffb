//! Retrieval Domain Library
//!
//! Semantic retrieval over named Qdrant collections: snippets are embedded
//! through an OpenAI-compatible endpoint, stored under a stable numeric ID
//! derived from the caller's ID, and searched with optional metadata filters
//! and a priority-weighted rerank.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  REST handlers   │  ← /health, /v1/upsert, /v1/search, /v1/reset, /v1/delete
//! └────────┬─────────┘
//!          │ ServiceHandle (set once after bootstrap)
//! ┌────────▼─────────┐
//! │ RetrievalService │  ← identity mapping, filter compile, rerank
//! └────────┬─────────┘
//!          │
//! ┌────────▼─────────┐     ┌───────────────────┐
//! │ VectorRepository │     │ EmbeddingProvider │
//! │     (trait)      │     │      (trait)      │
//! └────────┬─────────┘     └────────┬──────────┘
//!          │                        │
//! ┌────────▼─────────┐     ┌────────▼──────────┐
//! │ QdrantRepository │     │  OpenAIProvider   │
//! └──────────────────┘     └───────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use core_config::FromEnv;
//! use domain_retrieval::{
//!     CollectionRegistry, OpenAIProvider, QdrantConfig, QdrantRepository, RetrievalService,
//!     RetryConfig, Snippet, UpsertRequest,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repository = QdrantRepository::new(QdrantConfig::from_env()?)?;
//! let embedder = Arc::new(OpenAIProvider::from_env()?);
//! let registry = CollectionRegistry::from_env()?;
//!
//! let service =
//!     RetrievalService::bootstrap(repository, embedder, registry, RetryConfig::from_env()?)
//!         .await?;
//!
//! let request = UpsertRequest {
//!     items: vec![Snippet::new("x1", "doc", "Revenue grew 10% in Q3")],
//!     collection: None,
//! };
//! service.upsert(request).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod qdrant;
pub mod registry;
pub mod repository;
pub mod retry;
pub mod service;
pub mod state;

// Re-export commonly used types
pub use client::{RagClient, RagClientConfig};
pub use embedding::{EmbeddingConfig, EmbeddingProvider, OpenAIProvider};
pub use error::{RetrievalError, RetrievalResult};
pub use filter::{FilterValue, FilterValues, Predicate, SearchFilters};
pub use handlers::{RetrievalApiDoc, router};
pub use models::{
    Context, DeleteRequest, DeleteResponse, DistanceMetric, HealthResponse, HealthStatus,
    IndexedPoint, ResetRequest, ResetResponse, ScoredPoint, SearchQuery, SearchRequest,
    SearchResponse, Snippet, UpsertRequest, UpsertResponse, VectorConfig,
};
pub use qdrant::{QdrantConfig, QdrantRepository};
pub use registry::CollectionRegistry;
pub use repository::VectorRepository;
pub use retry::RetryConfig;
pub use service::RetrievalService;
pub use state::ServiceHandle;
