//! Retrieval-specific metrics: index writes, searches and deletes.

use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Retrieval metrics recorder
pub struct RetrievalMetrics;

impl RetrievalMetrics {
    // =========================================================================
    // Operation Metrics
    // =========================================================================

    /// Record an upsert of `count` snippets
    pub fn record_upsert(collection: &str, count: usize, duration_ms: u64) {
        counter!("retrieval_operations_total", "operation" => "upsert", "collection" => collection.to_string())
            .increment(1);
        counter!("retrieval_points_total", "operation" => "upsert", "collection" => collection.to_string())
            .increment(count as u64);
        histogram!("retrieval_operation_duration_seconds", "operation" => "upsert", "collection" => collection.to_string())
            .record(duration_ms as f64 / 1000.0);

        tracing::debug!(
            collection = collection,
            count = count,
            duration_ms = duration_ms,
            "Upserted snippets"
        );
    }

    /// Record a search returning `results` contexts
    pub fn record_search(collection: &str, results: usize, duration_ms: u64) {
        counter!("retrieval_operations_total", "operation" => "search", "collection" => collection.to_string())
            .increment(1);
        histogram!("retrieval_operation_duration_seconds", "operation" => "search", "collection" => collection.to_string())
            .record(duration_ms as f64 / 1000.0);
        histogram!("retrieval_search_results", "collection" => collection.to_string())
            .record(results as f64);

        tracing::debug!(
            collection = collection,
            results = results,
            duration_ms = duration_ms,
            "Searched collection"
        );
    }

    /// Record a delete of `count` requested IDs
    pub fn record_delete(collection: &str, count: usize) {
        counter!("retrieval_operations_total", "operation" => "delete", "collection" => collection.to_string())
            .increment(1);
        counter!("retrieval_points_total", "operation" => "delete", "collection" => collection.to_string())
            .increment(count as u64);
    }

    /// Record a collection reset
    pub fn record_reset(collection: &str) {
        counter!("retrieval_operations_total", "operation" => "reset", "collection" => collection.to_string())
            .increment(1);

        tracing::info!(collection = collection, "Collection reset");
    }

    /// Record a failed operation
    pub fn record_failure(operation: &str, collection: &str, error: &str) {
        counter!(
            "retrieval_operation_errors_total",
            "operation" => operation.to_string(),
            "collection" => collection.to_string()
        )
        .increment(1);

        tracing::warn!(
            operation = operation,
            collection = collection,
            error = error,
            "Retrieval operation failed"
        );
    }

    // =========================================================================
    // Readiness
    // =========================================================================

    /// Flip the readiness gauge once startup has completed
    pub fn set_ready(ready: bool) {
        gauge!("retrieval_ready").set(if ready { 1.0 } else { 0.0 });
    }

    /// Record the embedding dimension discovered at startup
    pub fn set_embedding_dimension(model: &str, dimension: u64) {
        gauge!("retrieval_embedding_dimension", "model" => model.to_string())
            .set(dimension as f64);
    }
}

/// Timer guard for automatic duration recording.
///
/// Records the duration when `stop()` is called or when dropped.
pub struct OperationTimer {
    start: Instant,
    operation: &'static str,
    collection: String,
    stopped: bool,
}

impl OperationTimer {
    /// Start a new timer for an operation
    pub fn new(operation: &'static str, collection: &str) -> Self {
        Self {
            start: Instant::now(),
            operation,
            collection: collection.to_string(),
            stopped: false,
        }
    }

    /// Milliseconds since the timer started, without stopping it
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Stop the timer and record the duration. Returns duration in milliseconds.
    pub fn stop(&mut self) -> u64 {
        if self.stopped {
            return 0;
        }
        self.stopped = true;

        let duration = self.start.elapsed();

        histogram!(
            "retrieval_stage_duration_seconds",
            "operation" => self.operation,
            "collection" => self.collection.clone()
        )
        .record(duration.as_secs_f64());

        duration.as_millis() as u64
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        if !self.stopped {
            self.stop();
        }
    }
}
