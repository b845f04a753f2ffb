//! Observability utilities for the retrieval service.
//!
//! This crate provides:
//! - Prometheus metrics recording and export
//! - Retrieval metrics for index writes, searches and deletes
//! - Axum middleware for automatic request metrics
//!
//! # Example
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, RetrievalMetrics};
//!
//! // Initialize metrics recorder
//! init_metrics()?;
//!
//! RetrievalMetrics::record_upsert("docs_index", 50, 15);
//!
//! // Add metrics endpoint to router
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

pub mod middleware;
pub mod retrieval;

pub use middleware::metrics_middleware;
pub use retrieval::{OperationTimer, RetrievalMetrics};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Initialize the Prometheus metrics recorder.
///
/// Safe to call more than once; later calls return the handle installed by
/// the first one.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;

        info!("Prometheus metrics recorder initialized");

        register_metric_descriptions();

        Ok(handle)
    })
}

/// Get the metrics handle (must call init_metrics first)
pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::describe_counter;
    use metrics::describe_gauge;
    use metrics::describe_histogram;

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Retrieval metrics
    describe_counter!(
        "retrieval_operations_total",
        "Retrieval operations by type and collection"
    );
    describe_counter!(
        "retrieval_operation_errors_total",
        "Failed retrieval operations by type and collection"
    );
    describe_histogram!(
        "retrieval_operation_duration_seconds",
        "Retrieval operation duration in seconds"
    );
    describe_histogram!(
        "retrieval_stage_duration_seconds",
        "Duration of individual pipeline stages in seconds"
    );
    describe_counter!(
        "retrieval_points_total",
        "Snippets written or deleted by collection"
    );
    describe_histogram!(
        "retrieval_search_results",
        "Number of contexts returned per search"
    );
    describe_gauge!("retrieval_ready", "1 once startup has completed");
    describe_gauge!(
        "retrieval_embedding_dimension",
        "Vector dimension produced by the embedding model"
    );
}
