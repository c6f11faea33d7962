//! Extractors that reject malformed input through [`ApiError`].

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use neurocore_core::RecordId;

use super::errors::ApiError;

/// JSON body deserialized into a typed payload; a shape mismatch is a 422.
pub struct Payload<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

/// `:id` path segment parsed as a [`RecordId`]; garbage is a 400.
pub struct RecordPath(pub RecordId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RecordPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::InvalidId(e.body_text()))?;
        let id = raw.parse::<RecordId>()?;
        Ok(RecordPath(id))
    }
}
