//! JSON extractor with automatic validation using the validator crate.

use crate::errors::AppError;
use axum::body::Bytes;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

/// JSON extractor with automatic validation.
///
/// Malformed bodies are rejected with the JSON extractor's own status, and
/// bodies failing `Validate` with 400 and per-field details.
///
/// # Example
/// ```ignore
/// use axum::routing::post;
/// use axum_helpers::extractors::ValidatedJson;
///
/// async fn upsert(ValidatedJson(payload): ValidatedJson<UpsertRequest>) -> String {
///     format!("{} items", payload.items.len())
/// }
///
/// let app = Router::new().route("/v1/upsert", post(upsert));
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        data.validate()?;
        Ok(ValidatedJson(data))
    }
}

/// Like [`ValidatedJson`], but a missing or blank body yields `T::default()`.
///
/// The body is read regardless of `Content-Type`, so an empty POST sent with
/// `application/json` still falls back to the default. Non-empty bodies that
/// fail to parse are rejected with the `JSON_EXTRACTION` envelope.
pub struct OptionalValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for OptionalValidatedJson<T>
where
    T: DeserializeOwned + Validate + Default,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalValidatedJson(T::default()));
        }

        let Json(data) = Json::<T>::from_bytes(&bytes)?;
        data.validate()?;
        Ok(OptionalValidatedJson(data))
    }
}
