//! Handler tests for the retrieval domain
//!
//! Drive the REST router end to end over the in-memory backend:
//! - JSON request/response shapes
//! - readiness gating before bootstrap completes
//! - HTTP status codes

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{HashEmbedder, InMemoryRepository};
use domain_retrieval::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt; // For oneshot()

async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_upsert_then_search_applies_priority() {
    let (service, _) = common::service().await;
    let app = router(ServiceHandle::ready(service));

    let response = app
        .clone()
        .oneshot(post(
            "/v1/upsert",
            json!({
                "items": [{
                    "id": "x1",
                    "type": "doc",
                    "text": "Revenue grew 10% in Q3",
                    "meta": {"priority": 1.5}
                }]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.into_body()).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["collection"], "docs_index");
    assert_eq!(body["count"], 1);

    let response = app
        .oneshot(post(
            "/v1/search",
            json!({"query": "Revenue grew 10% in Q3", "k": 3}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: SearchResponse = serde_json::from_value(json_body(response.into_body()).await).unwrap();
    assert_eq!(body.contexts.len(), 1);
    let hit = &body.contexts[0];
    assert_eq!(hit.id, "x1");
    assert_eq!(hit.kind.as_deref(), Some("doc"));
    assert_eq!(hit.meta, json!({"priority": 1.5}));
    assert!((hit.score - 1.5).abs() < 1e-4);
    assert_eq!(body.debug.backend, "qdrant");
    assert_eq!(body.debug.collection, "docs_index");
}

#[tokio::test]
async fn test_routes_unavailable_until_published() {
    let handle: ServiceHandle<InMemoryRepository> = ServiceHandle::new();
    let app = router(handle.clone());

    let response = app
        .clone()
        .oneshot(post("/v1/search", json!({"query": "anything"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response.into_body()).await["status"], "starting");

    let repository = InMemoryRepository::default();
    let service = RetrievalService::bootstrap(
        repository,
        Arc::new(HashEmbedder),
        common::registry(),
        RetryConfig::once(),
    )
    .await
    .unwrap();
    handle.publish(service).unwrap();

    let response = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = json_body(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["embedding_model"], "hash-embedder");
    assert_eq!(body["collections"], json!(["docs_index", "memory_index"]));

    let response = app
        .oneshot(post("/v1/search", json!({"query": "anything"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reset_and_delete_routes() {
    let (service, repository) = common::service().await;
    let app = router(ServiceHandle::ready(service));

    app.clone()
        .oneshot(post(
            "/v1/upsert",
            json!({
                "collection": "memory_index",
                "items": [
                    {"id": "n1", "type": "memory", "text": "prefers dark mode"},
                    {"id": "n2", "type": "memory", "text": "works in UTC"}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(repository.point_count("memory_index"), 2);

    let response = app
        .clone()
        .oneshot(post(
            "/v1/delete",
            json!({"ids": ["n1"], "collection": "memory_index"}),
        ))
        .await
        .unwrap();
    assert_eq!(
        json_body(response.into_body()).await,
        json!({"ok": true, "collection": "memory_index", "count": 1})
    );
    assert_eq!(repository.point_count("memory_index"), 1);

    let response = app
        .oneshot(post("/v1/reset", json!({"collection": "memory_index"})))
        .await
        .unwrap();
    assert_eq!(
        json_body(response.into_body()).await,
        json!({"ok": true, "collection": "memory_index"})
    );
    assert_eq!(repository.point_count("memory_index"), 0);
}
