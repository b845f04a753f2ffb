//! Test doubles shared by the integration tests: an in-memory index backend
//! and a deterministic bag-of-words embedder.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use domain_retrieval::models::EmbeddingResult;
use domain_retrieval::{
    CollectionRegistry, EmbeddingProvider, IndexedPoint, RetrievalResult, RetrievalService,
    RetryConfig, ScoredPoint, SearchQuery, Snippet, VectorConfig, VectorRepository,
};
use serde_json::{Map, Value};

pub const DIMENSION: usize = 32;

struct StoredCollection {
    config: VectorConfig,
    points: BTreeMap<u64, (Vec<f32>, Value)>,
}

/// Cosine-similarity index held in memory; applies filters the way Qdrant does
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    collections: Arc<Mutex<HashMap<String, StoredCollection>>>,
}

impl InMemoryRepository {
    pub fn point_count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|c| c.points.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl VectorRepository for InMemoryRepository {
    async fn health_check(&self) -> RetrievalResult<()> {
        Ok(())
    }

    async fn list_collections(&self) -> RetrievalResult<Vec<String>> {
        let mut names: Vec<String> = self.collections.lock().unwrap().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn collection_config(&self, name: &str) -> RetrievalResult<Option<VectorConfig>> {
        Ok(self.collections.lock().unwrap().get(name).map(|c| c.config))
    }

    async fn create_collection(&self, name: &str, config: VectorConfig) -> RetrievalResult<()> {
        self.collections.lock().unwrap().insert(
            name.to_string(),
            StoredCollection {
                config,
                points: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> RetrievalResult<()> {
        self.collections.lock().unwrap().remove(name);
        Ok(())
    }

    async fn upsert_points(
        &self,
        collection_name: &str,
        points: Vec<IndexedPoint>,
        _wait: bool,
    ) -> RetrievalResult<()> {
        let mut collections = self.collections.lock().unwrap();
        let collection = collections
            .get_mut(collection_name)
            .expect("collection should exist");
        for point in points {
            collection.points.insert(point.id, (point.vector, point.payload));
        }
        Ok(())
    }

    async fn search(
        &self,
        collection_name: &str,
        query: SearchQuery,
    ) -> RetrievalResult<Vec<ScoredPoint>> {
        let collections = self.collections.lock().unwrap();
        let Some(collection) = collections.get(collection_name) else {
            return Ok(vec![]);
        };

        let mut hits: Vec<ScoredPoint> = collection
            .points
            .iter()
            .filter(|(_, (_, payload))| {
                query
                    .filter
                    .as_ref()
                    .is_none_or(|predicate| predicate.matches(payload))
            })
            .map(|(id, (vector, payload))| ScoredPoint {
                id: *id,
                score: cosine(&query.vector, vector),
                payload: query.with_payload.then(|| payload.clone()),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(query.limit as usize);
        Ok(hits)
    }

    async fn delete_points(
        &self,
        collection_name: &str,
        ids: Vec<u64>,
        _wait: bool,
    ) -> RetrievalResult<()> {
        if let Some(collection) = self.collections.lock().unwrap().get_mut(collection_name) {
            for id in ids {
                collection.points.remove(&id);
            }
        }
        Ok(())
    }
}

pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Hashes lowercase words into a fixed number of buckets, so identical texts
/// embed identically and texts sharing words score closer.
pub struct HashEmbedder;

impl HashEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIMENSION];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = word
                .to_lowercase()
                .bytes()
                .fold(0xcbf29ce484222325u64, |h, b| {
                    (h ^ b as u64).wrapping_mul(0x100000001b3)
                });
            vector[(hash % DIMENSION as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn model_name(&self) -> String {
        "hash-embedder".to_string()
    }

    async fn embed(&self, text: &str) -> RetrievalResult<EmbeddingResult> {
        Ok(EmbeddingResult {
            values: Self::vector(text),
            dimension: DIMENSION as u32,
            tokens_used: 0,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> RetrievalResult<Vec<EmbeddingResult>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}

pub fn registry() -> CollectionRegistry {
    CollectionRegistry::new(["docs_index", "memory_index"]).unwrap()
}

/// A bootstrapped service over a fresh in-memory backend
pub async fn service() -> (RetrievalService<InMemoryRepository>, InMemoryRepository) {
    let repository = InMemoryRepository::default();
    let service = RetrievalService::bootstrap(
        repository.clone(),
        Arc::new(HashEmbedder),
        registry(),
        RetryConfig::once(),
    )
    .await
    .unwrap();
    (service, repository)
}

pub fn snippet(id: &str, kind: &str, text: &str, meta: Value) -> Snippet {
    let meta: Map<String, Value> = meta.as_object().cloned().unwrap_or_default();
    Snippet::new(id, kind, text).with_meta(meta)
}
