//! HTTP server initialization and lifecycle management
//!
//! The listener is bound and serving before the retrieval service exists.
//! Bootstrap runs alongside it and publishes the service once the embedding
//! model and Qdrant are both reachable; a failed bootstrap stops the server.

use std::io;
use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use axum_helpers::server::{create_app, create_router};
use domain_retrieval::{
    CollectionRegistry, EmbeddingProvider, OpenAIProvider, QdrantRepository, RetrievalApiDoc,
    RetrievalService, RetryConfig, ServiceHandle, VectorRepository,
};
use eyre::{Result, WrapErr};
use observability::{RetrievalMetrics, init_metrics, metrics_handler, metrics_middleware};
use tracing::info;

use crate::config::Config;

/// Run the HTTP server
///
/// 1. Sets up structured logging (env-aware: JSON for prod, pretty for dev)
/// 2. Installs the Prometheus recorder
/// 3. Builds the Qdrant and embedding clients (no network yet)
/// 4. Serves HTTP while bootstrap completes in the background
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - Server binding fails
/// - Bootstrap gives up (backend unreachable, dimension mismatch)
pub async fn run() -> Result<()> {
    let config = Config::from_env().wrap_err("Failed to load configuration")?;
    core_config::tracing::init_tracing(&config.environment);

    init_metrics().wrap_err("Failed to install metrics recorder")?;
    RetrievalMetrics::set_ready(false);

    info!("Using Qdrant at {}", config.qdrant.url);
    let repository =
        QdrantRepository::new(config.qdrant.clone()).wrap_err("Failed to build Qdrant client")?;

    info!(
        "Using embedding model {} at {}",
        config.embedding.model, config.embedding.base_url
    );
    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(OpenAIProvider::new(config.embedding.clone()));

    let handle = ServiceHandle::new();
    let app = build_router(handle.clone()).wrap_err("Failed to build router")?;

    tokio::select! {
        result = create_app(app, &config.server) => {
            result.wrap_err("Server error")?;
        }
        result = bootstrap(handle, repository, embedder, config.collections, config.startup) => {
            result?;
        }
    }

    info!("Retrieval API shutdown complete");
    Ok(())
}

/// Bootstrap the service and publish it. Only returns on failure; once the
/// service is published the future stays pending so the server keeps running.
async fn bootstrap<R: VectorRepository + 'static>(
    handle: ServiceHandle<R>,
    repository: R,
    embedder: Arc<dyn EmbeddingProvider>,
    collections: CollectionRegistry,
    startup: RetryConfig,
) -> Result<()> {
    let service = RetrievalService::bootstrap(repository, embedder, collections, startup)
        .await
        .wrap_err("Retrieval service failed to start")?;

    handle.publish(service)?;
    RetrievalMetrics::set_ready(true);
    info!("Retrieval service ready");

    std::future::pending::<()>().await;
    Ok(())
}

/// Assemble the full application router: retrieval routes, `/metrics`,
/// request metrics and the shared middleware stack.
pub fn build_router(handle: ServiceHandle<QdrantRepository>) -> io::Result<Router> {
    let api = domain_retrieval::router(handle)
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(metrics_middleware));

    create_router::<RetrievalApiDoc>(api)
}
