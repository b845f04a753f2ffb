//! Named collections known to the service.
//!
//! The registry is fixed at startup. The first configured name is the
//! default collection; requests naming anything outside the registry are
//! routed to the default instead of touching an arbitrary collection.

use core_config::{ConfigError, FromEnv, env_or_default};
use tracing::{info, instrument, warn};

use crate::error::{RetrievalError, RetrievalResult};
use crate::models::VectorConfig;
use crate::repository::VectorRepository;

pub const DEFAULT_COLLECTIONS: &str = "docs_index,memory_index";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRegistry {
    names: Vec<String>,
}

impl CollectionRegistry {
    /// Build a registry from an ordered list of names. Blank entries and
    /// duplicates are dropped; at least one name must remain.
    pub fn new<I, S>(names: I) -> RetrievalResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if !name.is_empty() && !unique.iter().any(|n| n == name) {
                unique.push(name.to_string());
            }
        }

        if unique.is_empty() {
            return Err(RetrievalError::Config(
                "at least one collection name is required".to_string(),
            ));
        }

        Ok(Self { names: unique })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn default_collection(&self) -> &str {
        &self.names[0]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Map a requested collection onto a registered one
    pub fn resolve<'a>(&'a self, requested: Option<&str>) -> &'a str {
        match requested {
            None | Some("") => self.default_collection(),
            Some(name) => match self.names.iter().find(|n| n.as_str() == name) {
                Some(known) => known,
                None => {
                    warn!(
                        requested = name,
                        fallback = self.default_collection(),
                        "Unknown collection requested, using default"
                    );
                    self.default_collection()
                }
            },
        }
    }

    /// Create every registered collection that does not exist yet.
    ///
    /// Existing collections are left untouched, but their vector size and
    /// distance metric must match `config` or startup cannot continue.
    #[instrument(skip(self, repository))]
    pub async fn ensure<R>(&self, repository: &R, config: VectorConfig) -> RetrievalResult<()>
    where
        R: VectorRepository + ?Sized,
    {
        for name in &self.names {
            match repository.collection_config(name).await? {
                Some(existing) if existing.dimension != config.dimension => {
                    return Err(RetrievalError::DimensionMismatch {
                        expected: existing.dimension,
                        actual: config.dimension,
                    });
                }
                Some(existing) if existing.distance != config.distance => {
                    return Err(RetrievalError::DistanceMismatch {
                        expected: existing.distance,
                        actual: config.distance,
                    });
                }
                Some(_) => {}
                None => {
                    repository.create_collection(name, config).await?;
                    info!(collection = %name, dimension = config.dimension, "Created collection");
                }
            }
        }
        Ok(())
    }

    /// Drop a collection if present and recreate it empty
    #[instrument(skip(self, repository))]
    pub async fn reset<R>(
        &self,
        repository: &R,
        name: &str,
        config: VectorConfig,
    ) -> RetrievalResult<()>
    where
        R: VectorRepository + ?Sized,
    {
        if repository.collection_config(name).await?.is_some() {
            repository.delete_collection(name).await?;
        }
        repository.create_collection(name, config).await?;
        info!(collection = %name, "Collection reset");
        Ok(())
    }
}

impl FromEnv for CollectionRegistry {
    /// Reads the comma-separated RAG_COLLECTIONS list
    fn from_env() -> Result<Self, ConfigError> {
        let raw = env_or_default("RAG_COLLECTIONS", DEFAULT_COLLECTIONS);
        Self::new(raw.split(',')).map_err(|e| ConfigError::ParseError {
            key: "RAG_COLLECTIONS".to_string(),
            details: e.to_string(),
        })
    }
}
