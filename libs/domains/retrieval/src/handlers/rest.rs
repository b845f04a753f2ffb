//! REST handlers for the retrieval pipelines

use axum::{Json, extract::State};
use axum_helpers::{OptionalValidatedJson, ValidatedJson};

use crate::error::RetrievalResult;
use crate::models::{
    DeleteRequest, DeleteResponse, HealthResponse, ResetRequest, ResetResponse, SearchRequest,
    SearchResponse, UpsertRequest, UpsertResponse,
};
use crate::repository::VectorRepository;
use crate::state::ServiceHandle;

/// Service status; always 200, even while starting or when the backend is down
#[utoipa::path(
    get,
    path = "/health",
    tag = "retrieval",
    responses(
        (status = 200, description = "Current service status", body = HealthResponse)
    )
)]
pub async fn health<R: VectorRepository>(
    State(handle): State<ServiceHandle<R>>,
) -> Json<HealthResponse> {
    match handle.get() {
        Ok(service) => Json(service.health().await),
        Err(_) => Json(HealthResponse::starting()),
    }
}

/// Embed and index a batch of snippets
#[utoipa::path(
    post,
    path = "/v1/upsert",
    tag = "retrieval",
    request_body = UpsertRequest,
    responses(
        (status = 200, description = "Snippets indexed", body = UpsertResponse),
        (status = 400, response = axum_helpers::errors::responses::BadRequestValidationResponse),
        (status = 500, response = axum_helpers::errors::responses::InternalServerErrorResponse),
        (status = 503, response = axum_helpers::errors::responses::ServiceUnavailableResponse)
    )
)]
pub async fn upsert<R: VectorRepository>(
    State(handle): State<ServiceHandle<R>>,
    ValidatedJson(request): ValidatedJson<UpsertRequest>,
) -> RetrievalResult<Json<UpsertResponse>> {
    let service = handle.get()?;
    Ok(Json(service.upsert(request).await?))
}

/// Nearest-neighbour search with filters and priority reranking
#[utoipa::path(
    post,
    path = "/v1/search",
    tag = "retrieval",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Ranked contexts", body = SearchResponse),
        (status = 400, response = axum_helpers::errors::responses::BadRequestValidationResponse),
        (status = 500, response = axum_helpers::errors::responses::InternalServerErrorResponse),
        (status = 503, response = axum_helpers::errors::responses::ServiceUnavailableResponse)
    )
)]
pub async fn search<R: VectorRepository>(
    State(handle): State<ServiceHandle<R>>,
    ValidatedJson(request): ValidatedJson<SearchRequest>,
) -> RetrievalResult<Json<SearchResponse>> {
    let service = handle.get()?;
    Ok(Json(service.search(request).await?))
}

/// Drop every point in a collection and recreate it empty
///
/// The body is optional; without one the default collection is reset.
#[utoipa::path(
    post,
    path = "/v1/reset",
    tag = "retrieval",
    request_body = ResetRequest,
    responses(
        (status = 200, description = "Collection recreated", body = ResetResponse),
        (status = 400, response = axum_helpers::errors::responses::BadRequestValidationResponse),
        (status = 500, response = axum_helpers::errors::responses::InternalServerErrorResponse),
        (status = 503, response = axum_helpers::errors::responses::ServiceUnavailableResponse)
    )
)]
pub async fn reset<R: VectorRepository>(
    State(handle): State<ServiceHandle<R>>,
    OptionalValidatedJson(request): OptionalValidatedJson<ResetRequest>,
) -> RetrievalResult<Json<ResetResponse>> {
    let service = handle.get()?;
    Ok(Json(service.reset(request).await?))
}

/// Delete snippets by caller ID
#[utoipa::path(
    post,
    path = "/v1/delete",
    tag = "retrieval",
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "Deletion acknowledged", body = DeleteResponse),
        (status = 400, response = axum_helpers::errors::responses::BadRequestValidationResponse),
        (status = 500, response = axum_helpers::errors::responses::InternalServerErrorResponse),
        (status = 503, response = axum_helpers::errors::responses::ServiceUnavailableResponse)
    )
)]
pub async fn delete<R: VectorRepository>(
    State(handle): State<ServiceHandle<R>>,
    ValidatedJson(request): ValidatedJson<DeleteRequest>,
) -> RetrievalResult<Json<DeleteResponse>> {
    let service = handle.get()?;
    Ok(Json(service.delete(request).await?))
}
