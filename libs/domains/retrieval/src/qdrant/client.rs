use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    self, Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointId,
    PointStruct, PointsIdsList, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use tracing::instrument;

use super::QdrantConfig;
use crate::error::{RetrievalError, RetrievalResult};
use crate::filter::{MatchAny, Predicate};
use crate::models::{DistanceMetric, IndexedPoint, ScoredPoint, SearchQuery, VectorConfig};
use crate::repository::VectorRepository;

/// Qdrant-backed implementation of VectorRepository
pub struct QdrantRepository {
    client: Qdrant,
}

impl QdrantRepository {
    pub fn new(config: QdrantConfig) -> RetrievalResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = config.api_key {
            builder = builder.api_key(api_key);
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder
            .build()
            .map_err(|e| RetrievalError::Qdrant(format!("Failed to build client: {}", e)))?;

        Ok(Self { client })
    }

    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn to_qdrant_distance(metric: DistanceMetric) -> Distance {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::Euclidean => Distance::Euclid,
            DistanceMetric::DotProduct => Distance::Dot,
            DistanceMetric::Manhattan => Distance::Manhattan,
        }
    }

    fn from_qdrant_distance(distance: Distance) -> DistanceMetric {
        match distance {
            Distance::Euclid => DistanceMetric::Euclidean,
            Distance::Dot => DistanceMetric::DotProduct,
            Distance::Manhattan => DistanceMetric::Manhattan,
            _ => DistanceMetric::Cosine,
        }
    }

    fn point_id_to_u64(point_id: &PointId) -> RetrievalResult<u64> {
        match &point_id.point_id_options {
            Some(qdrant::point_id::PointIdOptions::Num(num)) => Ok(*num),
            Some(qdrant::point_id::PointIdOptions::Uuid(uuid)) => Err(RetrievalError::Internal(
                format!("Unexpected UUID point ID: {}", uuid),
            )),
            None => Err(RetrievalError::Internal("Missing point ID".to_string())),
        }
    }

    fn to_qdrant_filter(predicate: Predicate) -> Filter {
        Filter::must(predicate.must.into_iter().map(|condition| match condition.any {
            MatchAny::Keywords(values) => Condition::matches(condition.key, values),
            MatchAny::Integers(values) => Condition::matches(condition.key, values),
        }))
    }

    fn payload_to_qdrant(payload: serde_json::Value) -> HashMap<String, QdrantValue> {
        match payload {
            serde_json::Value::Object(map) => map
                .into_iter()
                .map(|(key, val)| (key, json_to_qdrant_value(val)))
                .collect(),
            _ => HashMap::new(),
        }
    }

    fn qdrant_to_payload(payload: HashMap<String, QdrantValue>) -> Option<serde_json::Value> {
        if payload.is_empty() {
            return None;
        }

        let map = payload
            .into_iter()
            .map(|(key, val)| (key, qdrant_value_to_json(val)))
            .collect();

        Some(serde_json::Value::Object(map))
    }

    fn extract_config(info: &qdrant::CollectionInfo) -> Option<VectorConfig> {
        let vectors_config = info.config.as_ref()?.params.as_ref()?.vectors_config.as_ref()?;

        let params = match vectors_config.config.as_ref()? {
            qdrant::vectors_config::Config::Params(p) => p,
            // For multi-vector collections, use the first vector config
            qdrant::vectors_config::Config::ParamsMap(map) => map.map.values().next()?,
        };

        Some(
            VectorConfig::new(params.size)
                .with_distance(Self::from_qdrant_distance(params.distance())),
        )
    }
}

fn json_to_qdrant_value(val: serde_json::Value) -> QdrantValue {
    use qdrant::value::Kind;

    let kind = match val {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(items) => Kind::ListValue(qdrant::ListValue {
            values: items.into_iter().map(json_to_qdrant_value).collect(),
        }),
        serde_json::Value::Object(map) => Kind::StructValue(qdrant::Struct {
            fields: map
                .into_iter()
                .map(|(key, val)| (key, json_to_qdrant_value(val)))
                .collect(),
        }),
    };

    QdrantValue { kind: Some(kind) }
}

fn qdrant_value_to_json(val: QdrantValue) -> serde_json::Value {
    use qdrant::value::Kind;

    match val.kind {
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::IntegerValue(i)) => serde_json::Value::Number(i.into()),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(qdrant_value_to_json).collect())
        }
        Some(Kind::StructValue(st)) => serde_json::Value::Object(
            st.fields
                .into_iter()
                .map(|(key, val)| (key, qdrant_value_to_json(val)))
                .collect(),
        ),
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
    }
}

#[async_trait]
impl VectorRepository for QdrantRepository {
    async fn health_check(&self) -> RetrievalResult<()> {
        self.client.health_check().await?;
        Ok(())
    }

    async fn list_collections(&self) -> RetrievalResult<Vec<String>> {
        let response = self.client.list_collections().await?;
        Ok(response
            .collections
            .into_iter()
            .map(|collection| collection.name)
            .collect())
    }

    async fn collection_config(&self, name: &str) -> RetrievalResult<Option<VectorConfig>> {
        if !self.client.collection_exists(name).await? {
            return Ok(None);
        }

        let info = self.client.collection_info(name).await?;
        let result = info
            .result
            .ok_or_else(|| RetrievalError::Internal("Collection info missing result".to_string()))?;

        Self::extract_config(&result).map(Some).ok_or_else(|| {
            RetrievalError::Internal(format!("Collection {} has no vector parameters", name))
        })
    }

    #[instrument(skip(self))]
    async fn create_collection(&self, name: &str, config: VectorConfig) -> RetrievalResult<()> {
        let builder = CreateCollectionBuilder::new(name).vectors_config(VectorParamsBuilder::new(
            config.dimension,
            Self::to_qdrant_distance(config.distance),
        ));

        self.client.create_collection(builder).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_collection(&self, name: &str) -> RetrievalResult<()> {
        self.client.delete_collection(name).await?;
        Ok(())
    }

    async fn upsert_points(
        &self,
        collection_name: &str,
        points: Vec<IndexedPoint>,
        wait: bool,
    ) -> RetrievalResult<()> {
        let points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| PointStruct::new(p.id, p.vector, Self::payload_to_qdrant(p.payload)))
            .collect();

        let builder = UpsertPointsBuilder::new(collection_name, points).wait(wait);
        self.client.upsert_points(builder).await?;

        Ok(())
    }

    async fn search(
        &self,
        collection_name: &str,
        query: SearchQuery,
    ) -> RetrievalResult<Vec<ScoredPoint>> {
        let mut builder = SearchPointsBuilder::new(collection_name, query.vector, query.limit)
            .with_payload(query.with_payload);

        if let Some(predicate) = query.filter {
            builder = builder.filter(Self::to_qdrant_filter(predicate));
        }

        let results = self.client.search_points(builder).await?;

        results
            .result
            .into_iter()
            .map(|point| {
                let id = point
                    .id
                    .as_ref()
                    .map(Self::point_id_to_u64)
                    .transpose()?
                    .ok_or_else(|| RetrievalError::Internal("Missing point ID".to_string()))?;

                Ok(ScoredPoint {
                    id,
                    score: point.score,
                    payload: Self::qdrant_to_payload(point.payload),
                })
            })
            .collect()
    }

    async fn delete_points(
        &self,
        collection_name: &str,
        ids: Vec<u64>,
        wait: bool,
    ) -> RetrievalResult<()> {
        let ids: Vec<PointId> = ids.into_iter().map(PointId::from).collect();

        let builder = DeletePointsBuilder::new(collection_name)
            .points(PointsIdsList { ids })
            .wait(wait);

        self.client.delete_points(builder).await?;
        Ok(())
    }
}
