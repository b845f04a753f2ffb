mod rest;

use axum::{
    Router,
    routing::{get, post},
};
use utoipa::OpenApi;

use crate::filter::{FilterValue, FilterValues, SearchFilters};
use crate::models::{
    Context, DeleteRequest, DeleteResponse, HealthResponse, HealthStatus, ResetRequest,
    ResetResponse, SearchDebug, SearchRequest, SearchResponse, Snippet, UpsertRequest,
    UpsertResponse,
};
use crate::repository::VectorRepository;
use crate::state::ServiceHandle;

/// OpenAPI documentation for the retrieval API
#[derive(OpenApi)]
#[openapi(
    paths(
        rest::health,
        rest::upsert,
        rest::search,
        rest::reset,
        rest::delete,
    ),
    components(
        schemas(
            Snippet, UpsertRequest, UpsertResponse,
            SearchRequest, SearchFilters, FilterValues, FilterValue,
            SearchResponse, Context, SearchDebug,
            ResetRequest, ResetResponse,
            DeleteRequest, DeleteResponse,
            HealthResponse, HealthStatus,
            axum_helpers::ErrorResponse
        ),
        responses(
            axum_helpers::errors::responses::BadRequestValidationResponse,
            axum_helpers::errors::responses::InternalServerErrorResponse,
            axum_helpers::errors::responses::ServiceUnavailableResponse
        )
    ),
    tags(
        (name = "retrieval", description = "Snippet indexing and semantic search")
    )
)]
pub struct RetrievalApiDoc;

/// Create the router for `/health` and the `/v1` pipeline routes
pub fn router<R: VectorRepository + 'static>(handle: ServiceHandle<R>) -> Router {
    Router::new()
        .route("/health", get(rest::health::<R>))
        .route("/v1/upsert", post(rest::upsert::<R>))
        .route("/v1/search", post(rest::search::<R>))
        .route("/v1/reset", post(rest::reset::<R>))
        .route("/v1/delete", post(rest::delete::<R>))
        .with_state(handle)
}
