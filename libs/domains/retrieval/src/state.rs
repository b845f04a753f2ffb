use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::{RetrievalError, RetrievalResult};
use crate::repository::VectorRepository;
use crate::service::RetrievalService;

/// Set-once slot holding the service after startup completes.
///
/// The HTTP layer is served before bootstrap finishes; until the service is
/// published every pipeline route answers 503 and `/health` reports
/// `starting`.
pub struct ServiceHandle<R: VectorRepository> {
    cell: Arc<OnceCell<Arc<RetrievalService<R>>>>,
}

impl<R: VectorRepository> ServiceHandle<R> {
    /// An empty handle, not yet ready
    pub fn new() -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// A handle that is ready from the start
    pub fn ready(service: RetrievalService<R>) -> Self {
        Self {
            cell: Arc::new(OnceCell::new_with(Some(Arc::new(service)))),
        }
    }

    /// Publish the bootstrapped service. Publishing twice is an error.
    pub fn publish(&self, service: RetrievalService<R>) -> RetrievalResult<()> {
        self.cell
            .set(Arc::new(service))
            .map_err(|_| RetrievalError::Internal("Service already published".to_string()))
    }

    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    /// The published service, or `NotReady` while startup is running
    pub fn get(&self) -> RetrievalResult<Arc<RetrievalService<R>>> {
        self.cell.get().cloned().ok_or(RetrievalError::NotReady)
    }
}

impl<R: VectorRepository> Clone for ServiceHandle<R> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<R: VectorRepository> Default for ServiceHandle<R> {
    fn default() -> Self {
        Self::new()
    }
}
