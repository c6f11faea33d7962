//! One error type for every route, rendered into the response envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use neurocore_auth::AuthzError;
use neurocore_core::{DomainError, FieldErrors};
use neurocore_infra::{ServiceError, StoreError};
use neurocore_reporting::{AuditError, ExportError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("feature {0} is disabled for this tenant")]
    FeatureDisabled(&'static str),

    #[error("validation failed")]
    InvalidFields(FieldErrors),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("{0}")]
    InvalidId(String),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    /// The backing store could not be reached or failed the query.
    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) | ApiError::FeatureDisabled(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidFields(_) | ApiError::Validation(_) | ApiError::Export(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::InvalidId(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Value {
        match self {
            ApiError::InvalidFields(fields) => json!(fields),
            ApiError::Export(ExportError::LimitExceeded { rows, limit }) => json!({ "rows": rows, "limit": limit }),
            _ => Value::Null,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let message = match &self {
            ApiError::InvalidFields(fields) => format!("validation failed: {fields}"),
            other => other.to_string(),
        };
        (
            status,
            Json(json!({
                "ok": false,
                "error": { "message": message, "details": self.details() },
            })),
        )
            .into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidFields(fields) => ApiError::InvalidFields(fields),
            DomainError::Validation(msg) | DomainError::InvariantViolation(msg) => ApiError::Validation(msg),
            DomainError::InvalidId(msg) => ApiError::InvalidId(msg),
            DomainError::NotFound => ApiError::NotFound,
            DomainError::Conflict(msg) => ApiError::Conflict(msg),
            DomainError::Unauthorized => ApiError::Forbidden("unauthorized".into()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Backend { .. } => ApiError::Upstream(err.to_string()),
            StoreError::Deserialize { .. } | StoreError::Serialize { .. } | StoreError::Poisoned => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::Store(e) => e.into(),
        }
    }
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}
