//! Configuration for the Retrieval API

use core_config::{FromEnv, server::ServerConfig};
use domain_retrieval::{CollectionRegistry, EmbeddingConfig, QdrantConfig, RetryConfig};

pub use core_config::Environment;

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub server: ServerConfig,
    pub qdrant: QdrantConfig,
    pub embedding: EmbeddingConfig,
    pub collections: CollectionRegistry,
    pub startup: RetryConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            environment: Environment::from_env(),
            server: ServerConfig::from_env()?,
            qdrant: QdrantConfig::from_env()?,
            embedding: EmbeddingConfig::from_env()?,
            collections: CollectionRegistry::from_env()?,
            startup: RetryConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        temp_env::with_vars_unset(
            [
                "APP_ENV",
                "PORT",
                "QDRANT_URL",
                "EMBEDDING_MODEL",
                "RAG_COLLECTIONS",
                "RAG_STARTUP_ATTEMPTS",
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.environment, Environment::Development);
                assert_eq!(config.server.port, 8089);
                assert_eq!(config.qdrant.url, "http://localhost:6334");
                assert_eq!(config.embedding.model, "BAAI/bge-small-en-v1.5");
                assert_eq!(config.collections.default_collection(), "docs_index");
                assert_eq!(config.startup.max_attempts, 30);
            },
        );
    }

    #[test]
    fn test_config_rejects_bad_port() {
        temp_env::with_var("PORT", Some("eighty"), || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn test_config_custom_collections() {
        temp_env::with_var("RAG_COLLECTIONS", Some("kb, notes"), || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.collections.names(), ["kb", "notes"]);
        });
    }
}
