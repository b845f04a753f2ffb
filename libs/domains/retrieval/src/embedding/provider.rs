use async_trait::async_trait;

use crate::error::RetrievalResult;
use crate::models::EmbeddingResult;

/// Trait for embedding generation backends
///
/// A provider is bound to one model for its whole lifetime, so every vector
/// it returns has the same dimension.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Name of the model backing this provider
    fn model_name(&self) -> String;

    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> RetrievalResult<EmbeddingResult>;

    /// Generate embeddings for multiple texts in one call.
    ///
    /// The output has exactly one entry per input text, in input order.
    async fn embed_batch(&self, texts: &[String]) -> RetrievalResult<Vec<EmbeddingResult>>;
}
